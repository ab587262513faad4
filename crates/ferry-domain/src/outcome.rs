//! Outcome of a provisioning run

use crate::ElementId;
use std::fmt;
use std::path::PathBuf;

/// Terminal signal of a provisioning run
///
/// Exactly one guard is produced per run; the hosting workflow branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Guard {
    /// The file operation succeeded
    ProvisioningComplete,

    /// Every candidate destination name was already taken
    ProvisioningFailedNoFileNames,

    /// The file operation raised an I/O error
    ProvisioningFailedException,
}

impl Guard {
    /// Wire name of the guard
    pub fn as_str(&self) -> &'static str {
        match self {
            Guard::ProvisioningComplete => "provisioning-complete",
            Guard::ProvisioningFailedNoFileNames => "provisioning-failed-no-file-names",
            Guard::ProvisioningFailedException => "provisioning-failed-exception",
        }
    }

    /// True for the success guard
    pub fn is_success(&self) -> bool {
        matches!(self, Guard::ProvisioningComplete)
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion record handed back to the hosting engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    /// The single outcome guard
    pub guard: Guard,

    /// Free text message; populated only for [`Guard::ProvisioningFailedException`]
    pub message: Option<String>,

    /// Path the file was written to (copy and move only)
    pub destination_path: Option<PathBuf>,

    /// Catalogued destination asset, when lineage created or found one
    pub new_asset: Option<ElementId>,
}

impl CompletionRecord {
    /// Successful run
    pub fn complete(destination_path: Option<PathBuf>, new_asset: Option<ElementId>) -> Self {
        Self {
            guard: Guard::ProvisioningComplete,
            message: None,
            destination_path,
            new_asset,
        }
    }

    /// No free destination name was found
    pub fn no_file_names() -> Self {
        Self {
            guard: Guard::ProvisioningFailedNoFileNames,
            message: None,
            destination_path: None,
            new_asset: None,
        }
    }

    /// The file operation failed with the given message
    pub fn exception(message: impl Into<String>) -> Self {
        Self {
            guard: Guard::ProvisioningFailedException,
            message: Some(message.into()),
            destination_path: None,
            new_asset: None,
        }
    }
}
