//! Element module - handles onto items owned by the metadata repository

use std::collections::BTreeMap;
use std::fmt;

/// Globally unique identifier for a metadata element or relationship
///
/// Backed by a UUIDv7 so identifiers sort by creation time, which keeps
/// paged relationship listings stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u128);

impl ElementId {
    /// Generate a new UUIDv7-based ElementId
    ///
    /// # Examples
    ///
    /// ```
    /// use ferry_domain::ElementId;
    ///
    /// let id = ElementId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an ElementId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an ElementId from its hyphenated string form
    ///
    /// # Examples
    ///
    /// ```
    /// use ferry_domain::ElementId;
    ///
    /// let id = ElementId::new();
    /// let parsed = ElementId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid element id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl std::str::FromStr for ElementId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// A metadata element as returned by the repository
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetadataElement {
    /// Unique identifier
    pub id: ElementId,

    /// Open metadata type name (e.g. "CSVFile", "Process")
    pub type_name: String,

    /// String-valued properties keyed by property name
    pub properties: BTreeMap<String, String>,

    /// Names of classifications attached to the element
    pub classifications: Vec<String>,
}

impl MetadataElement {
    /// Look up a single property value
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// True when the element carries the named classification
    pub fn is_classified(&self, classification: &str) -> bool {
        self.classifications.iter().any(|c| c == classification)
    }
}

/// An element reached by following one relationship
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedElement {
    /// Identifier of the relationship that was followed
    pub relationship_id: ElementId,

    /// Relationship type name
    pub relationship_type: String,

    /// Properties stored on the relationship itself
    pub relationship_properties: BTreeMap<String, String>,

    /// The element at the other end
    pub element: MetadataElement,
}

/// Which end of a relationship the starting element sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Starting element is end 1; returns the end 2 elements
    Outbound,

    /// Starting element is end 2; returns the end 1 elements
    Inbound,
}

/// Anchors a newly created element under an existing one
///
/// The relationship is created parent (end 1) to child (end 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    /// Parent element
    pub parent_id: ElementId,

    /// Relationship type used for the nesting
    pub relationship_type: String,
}

impl ParentLink {
    /// Create a new parent link
    pub fn new(parent_id: ElementId, relationship_type: impl Into<String>) -> Self {
        Self {
            parent_id,
            relationship_type: relationship_type.into(),
        }
    }
}

/// How a new element is brought into existence
#[derive(Debug, Clone, PartialEq)]
pub enum CreationMode {
    /// Create the element from explicit properties
    Direct {
        /// Type of the new element
        type_name: String,
        /// Properties of the new element
        properties: BTreeMap<String, String>,
    },

    /// Copy a template element, substituting placeholder values
    FromTemplate {
        /// Element to copy
        template_id: ElementId,
        /// Values for `~{name}~` placeholders in the template's properties
        placeholders: BTreeMap<String, String>,
        /// Properties that override the copied ones outright
        replacement_properties: BTreeMap<String, String>,
    },
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Ordering of ids follows the underlying value
        #[test]
        fn test_id_ordering_property(a: u128, b: u128) {
            let id_a = ElementId::from_value(a);
            let id_b = ElementId::from_value(b);
            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        #[test]
        fn test_id_string_roundtrip(value: u128) {
            let id = ElementId::from_value(value);
            match ElementId::from_string(&id.to_string()) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
