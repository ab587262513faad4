//! Ferry Domain Layer
//!
//! This crate contains the data model shared by every other Ferry crate: the
//! metadata element handles lineage is built from, the provisioning request a
//! single run works on, and the completion record it produces. It has only one
//! external dependency (`uuid`) and defines the trait seam the metadata
//! repository is consumed through.
//!
//! ## Key Concepts
//!
//! - **Element**: a catalogued item (file, folder, process, schema attribute)
//!   owned by the metadata repository and addressed by an [`ElementId`]
//! - **Provisioning request**: what to copy, move or delete and where to
//! - **Lineage options**: which provenance nodes and edges to record
//! - **Guard**: the single outcome signal each provisioning run emits
//!
//! ## Architecture
//!
//! - Pure data types and trait definitions only
//! - File system and repository access live in `ferry-provision` and
//!   `ferry-catalog`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classification;
pub mod element;
pub mod names;
pub mod outcome;
pub mod request;
pub mod traits;

// Re-exports for convenience
pub use classification::FileClassification;
pub use element::{
    CreationMode, Direction, ElementId, MetadataElement, ParentLink, RelatedElement,
};
pub use outcome::{CompletionRecord, Guard};
pub use request::{FileOperation, FileReference, LineageOptions, ProvisioningRequest};
pub use traits::MetadataStore;
