//! Ferry Local Catalog
//!
//! Implements the [`MetadataStore`] trait on SQLite. The catalog stands in for
//! the external metadata repository: the CLI keeps one on disk next to the
//! files it provisions, and tests open it with `:memory:`.
//!
//! # Architecture
//!
//! - Elements, their string properties and classifications in three tables
//! - Relationships keyed by (type, end1, end2) so "ensure exists" calls are idempotent
//! - A creation sequence on relationships so paged listings are stable
//!
//! # Examples
//!
//! ```no_run
//! use ferry_catalog::SqliteCatalog;
//!
//! let catalog = SqliteCatalog::new(":memory:").unwrap();
//! // Catalog is now ready for element operations
//! ```

#![warn(missing_docs)]

pub mod registration;

use ferry_domain::names::classifications;
use ferry_domain::{Direction, ElementId, MetadataElement, MetadataStore, ParentLink, RelatedElement};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors that can occur during catalog operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Element not found
    #[error("Element not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of MetadataStore
///
/// # Thread Safety
///
/// The connection sits behind a mutex, so a single catalog can be shared
/// (e.g. through an `Arc`) by concurrent provisioning runs. Every trait call
/// holds the lock for the duration of its statements only.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open (or create) a catalog at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of relationships of the given type (used by diagnostics and tests)
    pub fn count_relationships(&self, relationship_type: &str) -> Result<usize, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM relationships WHERE type_name = ?1",
            params![relationship_type],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Number of elements of the given type
    pub fn count_elements(&self, type_name: &str) -> Result<usize, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM elements WHERE type_name = ?1",
            params![type_name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Convert ElementId to bytes for storage
fn id_to_bytes(id: ElementId) -> Vec<u8> {
    id.value().to_be_bytes().to_vec()
}

/// Convert bytes to ElementId
fn bytes_to_id(bytes: &[u8]) -> Result<ElementId, StoreError> {
    if bytes.len() != 16 {
        return Err(StoreError::InvalidData(format!(
            "Expected 16 bytes for ElementId, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; 16];
    arr.copy_from_slice(bytes);
    Ok(ElementId::from_value(u128::from_be_bytes(arr)))
}

/// Read an id column inside a row mapper
fn row_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<ElementId> {
    let bytes: Vec<u8> = row.get(idx)?;
    bytes_to_id(&bytes).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Blob, Box::new(e))
    })
}

fn element_exists(conn: &Connection, id: ElementId) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM elements WHERE id = ?1",
            params![id_to_bytes(id)],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false))
}

fn load_element(conn: &Connection, id: ElementId) -> Result<Option<MetadataElement>, StoreError> {
    let id_bytes = id_to_bytes(id);

    let type_name: Option<String> = conn
        .query_row(
            "SELECT type_name FROM elements WHERE id = ?1",
            params![&id_bytes],
            |row| row.get(0),
        )
        .optional()?;
    let Some(type_name) = type_name else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT name, value FROM element_properties WHERE element_id = ?1")?;
    let properties = stmt
        .query_map(params![&id_bytes], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<BTreeMap<String, String>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT name FROM element_classifications WHERE element_id = ?1 ORDER BY rowid",
    )?;
    let classifications = stmt
        .query_map(params![&id_bytes], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(Some(MetadataElement {
        id,
        type_name,
        properties,
        classifications,
    }))
}

fn insert_element(
    conn: &Connection,
    type_name: &str,
    properties: &BTreeMap<String, String>,
) -> Result<ElementId, StoreError> {
    let id = ElementId::new();
    let id_bytes = id_to_bytes(id);

    conn.execute(
        "INSERT INTO elements (id, type_name) VALUES (?1, ?2)",
        params![&id_bytes, type_name],
    )?;
    for (name, value) in properties {
        conn.execute(
            "INSERT INTO element_properties (element_id, name, value) VALUES (?1, ?2, ?3)",
            params![&id_bytes, name, value],
        )?;
    }
    Ok(id)
}

fn insert_classification(conn: &Connection, id: ElementId, name: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR IGNORE INTO element_classifications (element_id, name) VALUES (?1, ?2)",
        params![id_to_bytes(id), name],
    )?;
    Ok(())
}

fn ensure_relationship(
    conn: &Connection,
    relationship_type: &str,
    end1: ElementId,
    end2: ElementId,
    properties: &BTreeMap<String, String>,
) -> Result<ElementId, StoreError> {
    for end in [end1, end2] {
        if !element_exists(conn, end)? {
            return Err(StoreError::NotFound(end.to_string()));
        }
    }

    let end1_bytes = id_to_bytes(end1);
    let end2_bytes = id_to_bytes(end2);

    let existing = conn
        .query_row(
            "SELECT id FROM relationships WHERE type_name = ?1 AND end1 = ?2 AND end2 = ?3",
            params![relationship_type, &end1_bytes, &end2_bytes],
            |row| row_id(row, 0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = ElementId::new();
    let id_bytes = id_to_bytes(id);
    conn.execute(
        "INSERT INTO relationships (id, type_name, end1, end2) VALUES (?1, ?2, ?3, ?4)",
        params![&id_bytes, relationship_type, &end1_bytes, &end2_bytes],
    )?;
    for (name, value) in properties {
        conn.execute(
            "INSERT INTO relationship_properties (relationship_id, name, value) VALUES (?1, ?2, ?3)",
            params![&id_bytes, name, value],
        )?;
    }

    tracing::debug!(relationship_type, %end1, %end2, "created relationship");
    Ok(id)
}

fn load_relationship_properties(
    conn: &Connection,
    relationship_id: ElementId,
) -> Result<BTreeMap<String, String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name, value FROM relationship_properties WHERE relationship_id = ?1",
    )?;
    let properties = stmt
        .query_map(params![id_to_bytes(relationship_id)], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<BTreeMap<String, String>, _>>()?;
    Ok(properties)
}

/// Replace `~{name}~` tokens with placeholder values
///
/// Tokens without a matching placeholder become the empty string.
pub(crate) fn substitute_placeholders(value: &str, placeholders: &BTreeMap<String, String>) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("~{") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}~") else {
            break;
        };
        result.push_str(&rest[..start]);
        let name = &after_open[..end];
        if let Some(replacement) = placeholders.get(name) {
            result.push_str(replacement);
        }
        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

impl MetadataStore for SqliteCatalog {
    type Error = StoreError;

    fn get_element(&self, id: ElementId) -> Result<Option<MetadataElement>, Self::Error> {
        let conn = self.lock();
        load_element(&conn, id)
    }

    fn get_element_by_unique_name(
        &self,
        name: &str,
        property_key: &str,
    ) -> Result<Option<ElementId>, Self::Error> {
        let conn = self.lock();
        let id = conn
            .query_row(
                "SELECT element_id FROM element_properties
                 WHERE name = ?1 AND value = ?2 ORDER BY rowid LIMIT 1",
                params![property_key, name],
                |row| row_id(row, 0),
            )
            .optional()?;
        Ok(id)
    }

    fn get_related_elements(
        &self,
        id: ElementId,
        direction: Direction,
        relationship_type: &str,
        page_start: usize,
        page_size: usize,
    ) -> Result<Vec<RelatedElement>, Self::Error> {
        let (from_end, to_end) = match direction {
            Direction::Outbound => ("end1", "end2"),
            Direction::Inbound => ("end2", "end1"),
        };
        let sql = format!(
            "SELECT id, type_name, {to_end} FROM relationships
             WHERE {from_end} = ?1 AND type_name = ?2
             ORDER BY seq LIMIT ?3 OFFSET ?4"
        );

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![id_to_bytes(id), relationship_type, page_size as i64, page_start as i64],
                |row| Ok((row_id(row, 0)?, row.get::<_, String>(1)?, row_id(row, 2)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let mut related = Vec::with_capacity(rows.len());
        for (relationship_id, relationship_type, other_end) in rows {
            let element = load_element(&conn, other_end)?
                .ok_or_else(|| StoreError::NotFound(other_end.to_string()))?;
            related.push(RelatedElement {
                relationship_id,
                relationship_type,
                relationship_properties: load_relationship_properties(&conn, relationship_id)?,
                element,
            });
        }
        Ok(related)
    }

    fn create_element(
        &self,
        type_name: &str,
        properties: &BTreeMap<String, String>,
        parent: Option<&ParentLink>,
    ) -> Result<ElementId, Self::Error> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let id = insert_element(&tx, type_name, properties)?;
        if let Some(parent) = parent {
            ensure_relationship(&tx, &parent.relationship_type, parent.parent_id, id, &BTreeMap::new())?;
        }

        tx.commit()?;
        tracing::debug!(type_name, %id, "created element");
        Ok(id)
    }

    fn create_element_from_template(
        &self,
        template_id: ElementId,
        placeholders: &BTreeMap<String, String>,
        replacement_properties: &BTreeMap<String, String>,
        parent: Option<&ParentLink>,
    ) -> Result<ElementId, Self::Error> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let template = load_element(&tx, template_id)?
            .ok_or_else(|| StoreError::NotFound(format!("template {}", template_id)))?;

        let mut properties: BTreeMap<String, String> = template
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), substitute_placeholders(value, placeholders)))
            .collect();
        properties.extend(replacement_properties.clone());

        let id = insert_element(&tx, &template.type_name, &properties)?;

        for classification in &template.classifications {
            if classification != classifications::TEMPLATE {
                insert_classification(&tx, id, classification)?;
            }
        }

        // Only relationships where the template is end 1 are copied; the
        // template's own parents stay with the template.
        let outbound = {
            let mut stmt = tx.prepare(
                "SELECT id, type_name, end2 FROM relationships WHERE end1 = ?1 ORDER BY seq",
            )?;
            let rows = stmt
                .query_map(params![id_to_bytes(template_id)], |row| {
                    Ok((row_id(row, 0)?, row.get::<_, String>(1)?, row_id(row, 2)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        for (relationship_id, relationship_type, end2) in outbound {
            let relationship_properties = load_relationship_properties(&tx, relationship_id)?;
            ensure_relationship(&tx, &relationship_type, id, end2, &relationship_properties)?;
        }

        if let Some(parent) = parent {
            ensure_relationship(&tx, &parent.relationship_type, parent.parent_id, id, &BTreeMap::new())?;
        }

        tx.commit()?;
        tracing::debug!(%template_id, %id, type_name = %template.type_name, "created element from template");
        Ok(id)
    }

    fn create_relationship(
        &self,
        relationship_type: &str,
        end1: ElementId,
        end2: ElementId,
        properties: &BTreeMap<String, String>,
    ) -> Result<ElementId, Self::Error> {
        let conn = self.lock();
        ensure_relationship(&conn, relationship_type, end1, end2, properties)
    }

    fn classify_element(&self, id: ElementId, classification: &str) -> Result<(), Self::Error> {
        let conn = self.lock();
        if !element_exists(&conn, id)? {
            return Err(StoreError::NotFound(id.to_string()));
        }
        insert_classification(&conn, id, classification)
    }
}
