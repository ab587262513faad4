//! Error types for provisioning operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while provisioning a file
///
/// Only configuration and resolution errors reach the caller of
/// [`Provisioner::provision`](crate::Provisioner::provision) as errors; I/O
/// failures become a guard and lineage failures are logged and absorbed.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Configuration error (nothing to provision, invalid pattern, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file or folder reference could not be turned into a path
    #[error("Path not resolvable: {0}")]
    PathNotResolvable(String),

    /// File system error with the operation that triggered it
    #[error("I/O error while {context} ({path}): {source}")]
    Io {
        /// What was being done
        context: String,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Metadata store error
    #[error("Store error: {0}")]
    Store(String),
}

impl ProvisionError {
    /// Wrap an I/O error with the operation and path it concerns
    pub fn io(context: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProvisionError::Io {
            context: context.into(),
            path: path.into(),
            source,
        }
    }

    /// Convert any store error into [`ProvisionError::Store`]
    pub fn store<E: std::fmt::Display>(error: E) -> Self {
        ProvisionError::Store(error.to_string())
    }
}
