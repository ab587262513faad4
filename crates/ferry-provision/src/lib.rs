//! Ferry Provisioning
//!
//! Copies, moves or deletes a single file and records the lineage of the
//! result in a metadata catalog.
//!
//! # Overview
//!
//! A provisioning run:
//! - **Resolves paths**: catalogued file and folder elements are turned into
//!   physical paths through a chain of [`resolver`] strategies
//! - **Allocates a destination name**: a pattern over the source base name
//!   and a per-folder index, shared by every run in the process
//! - **Performs the file operation** and emits exactly one guard
//! - **Builds lineage**: process, data flows and column mappings, each step
//!   ensured idempotently and failing soft
//!
//! # Usage
//!
//! ## Single Request
//!
//! ```no_run
//! use ferry_catalog::SqliteCatalog;
//! use ferry_domain::{FileOperation, ProvisioningRequest};
//! use ferry_provision::Provisioner;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SqliteCatalog::new("catalog.db")?);
//! let provisioner = Provisioner::new(store);
//!
//! let request = ProvisioningRequest::new("/in/report.csv", "/out", FileOperation::Copy)
//!     .with_pattern("{0}_{1}");
//! let record = provisioner.provision(&request);
//! println!("{} -> {:?}", record.guard, record.destination_path);
//! # Ok(())
//! # }
//! ```
//!
//! ## From Configuration
//!
//! ```no_run
//! use ferry_catalog::SqliteCatalog;
//! use ferry_provision::{Provisioner, ProvisionerConfig, RequestOverrides};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProvisionerConfig::from_file("ferry.toml")?;
//! let provisioner = Provisioner::new(Arc::new(SqliteCatalog::new("catalog.db")?))
//!     .with_schema_page_size(config.schema_page_size);
//!
//! let overrides = RequestOverrides {
//!     source_file: Some("/in/report.csv".into()),
//!     ..Default::default()
//! };
//! let record = provisioner.provision_with(&config, &overrides)?;
//! println!("{}", record.guard);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! destination_directory = "/landing"
//! destination_file_name_pattern = "{0}_{1}"
//! operation = "copy"
//! lineage = true
//! top_level_process_name = "file-provisioning"
//! top_level_process_only_lineage = false
//! source_folder_lineage = false
//! destination_folder_lineage = false
//! column_level_lineage = true
//! ```

#![warn(missing_docs)]

pub mod allocator;
pub mod classify;
pub mod config;
mod error;
mod executor;
mod graph;
pub mod lineage;
pub mod resolver;
mod worker;

pub use allocator::DestinationNameAllocator;
pub use config::{build_request, ProvisionerConfig, RequestOverrides};
pub use error::ProvisionError;
pub use executor::Provisioner;
pub use lineage::{LineageBuilder, LineageOutcome};
pub use resolver::PathResolver;
pub use worker::ProvisioningWorker;
