//! Trait definitions for external interactions
//!
//! The metadata repository is an external collaborator. Provisioning only
//! needs the narrow set of lookups and "ensure exists" calls below.

use crate::{Direction, ElementId, MetadataElement, ParentLink, RelatedElement};
use std::collections::BTreeMap;

/// Trait for reading and creating metadata elements and relationships
///
/// Implemented by the infrastructure layer (ferry-catalog). Methods take
/// `&self`: one store handle is shared by concurrent provisioning runs, so
/// implementations synchronise internally.
pub trait MetadataStore: Send + Sync {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get an element by id
    fn get_element(&self, id: ElementId) -> Result<Option<MetadataElement>, Self::Error>;

    /// Find the element whose `property_key` property equals `name`
    fn get_element_by_unique_name(
        &self,
        name: &str,
        property_key: &str,
    ) -> Result<Option<ElementId>, Self::Error>;

    /// List elements related to `id` through `relationship_type`
    ///
    /// Results are ordered by relationship creation so pages are stable.
    fn get_related_elements(
        &self,
        id: ElementId,
        direction: Direction,
        relationship_type: &str,
        page_start: usize,
        page_size: usize,
    ) -> Result<Vec<RelatedElement>, Self::Error>;

    /// Create an element, optionally nested under a parent
    fn create_element(
        &self,
        type_name: &str,
        properties: &BTreeMap<String, String>,
        parent: Option<&ParentLink>,
    ) -> Result<ElementId, Self::Error>;

    /// Create an element by copying a template
    ///
    /// `~{name}~` tokens in the template's properties are replaced by the
    /// matching placeholder value (or the empty string), then
    /// `replacement_properties` override the copied values.
    fn create_element_from_template(
        &self,
        template_id: ElementId,
        placeholders: &BTreeMap<String, String>,
        replacement_properties: &BTreeMap<String, String>,
        parent: Option<&ParentLink>,
    ) -> Result<ElementId, Self::Error>;

    /// Ensure a relationship exists between two elements
    ///
    /// Idempotent: an existing relationship of the same type between the same
    /// ends is returned instead of creating a duplicate.
    fn create_relationship(
        &self,
        relationship_type: &str,
        end1: ElementId,
        end2: ElementId,
        properties: &BTreeMap<String, String>,
    ) -> Result<ElementId, Self::Error>;

    /// Attach a classification to an element (idempotent)
    fn classify_element(&self, id: ElementId, classification: &str) -> Result<(), Self::Error>;

    /// Read a single property of an element
    fn get_element_property(
        &self,
        id: ElementId,
        property_name: &str,
    ) -> Result<Option<String>, Self::Error> {
        Ok(self
            .get_element(id)?
            .and_then(|element| element.property(property_name).map(str::to_string)))
    }
}
