//! Provisioning request - the immutable input of one provisioning run

use crate::ElementId;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default destination file name pattern: the source base name, unchanged
pub const DEFAULT_NAME_PATTERN: &str = "{0}";

/// Default name of the top-level lineage process
pub const DEFAULT_PROCESS_NAME: &str = "file-provisioning";

/// A reference to a catalogued file or folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReference {
    /// An explicit file system path
    Path(PathBuf),

    /// A metadata element describing the file or folder
    Element(ElementId),
}

impl FileReference {
    /// The element id, when this reference is an element handle
    pub fn element_id(&self) -> Option<ElementId> {
        match self {
            FileReference::Element(id) => Some(*id),
            FileReference::Path(_) => None,
        }
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileReference::Path(path) => write!(f, "{}", path.display()),
            FileReference::Element(id) => write!(f, "element {}", id),
        }
    }
}

/// Physical operation performed on the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileOperation {
    /// Copy the source into the destination folder
    #[default]
    Copy,

    /// Move the source into the destination folder
    Move,

    /// Delete the source; nothing is written
    Delete,
}

impl FileOperation {
    /// Get the operation name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FileOperation::Copy => "copy",
            FileOperation::Move => "move",
            FileOperation::Delete => "delete",
        }
    }

    /// Parse an operation from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "copy" => Some(FileOperation::Copy),
            "move" => Some(FileOperation::Move),
            "delete" => Some(FileOperation::Delete),
            _ => None,
        }
    }
}

impl std::str::FromStr for FileOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid file operation: {}", s))
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which lineage nodes and edges a provisioning run records
///
/// Everything is switched on by default; callers opt out explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageOptions {
    /// Record lineage at all
    pub enabled: bool,

    /// Name of the durable top-level process, reused across runs
    pub top_level_process_name: String,

    /// Template to create the top-level process from, when it does not exist
    pub top_level_process_template_id: Option<ElementId>,

    /// Template to create the destination asset from
    pub destination_template_id: Option<ElementId>,

    /// Create a fresh child process for every run
    pub per_run_child_process: bool,

    /// Lineage starts at the source file (otherwise at its folder)
    pub lineage_from_source_file: bool,

    /// Lineage ends at the destination file (otherwise at its folder)
    pub lineage_to_destination_file: bool,

    /// Map schema attributes of source and destination pairwise
    pub column_level_lineage: bool,

    /// Supply chain the top-level process is linked into
    pub information_supply_chain_name: Option<String>,
}

impl Default for LineageOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            top_level_process_name: DEFAULT_PROCESS_NAME.to_string(),
            top_level_process_template_id: None,
            destination_template_id: None,
            per_run_child_process: true,
            lineage_from_source_file: true,
            lineage_to_destination_file: true,
            column_level_lineage: true,
            information_supply_chain_name: None,
        }
    }
}

impl LineageOptions {
    /// Options with lineage switched off entirely
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Input of a single provisioning run
///
/// Built once per invocation and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    source_path: PathBuf,
    source_element_id: Option<ElementId>,
    destination_folder: PathBuf,
    destination_name_pattern: String,
    operation: FileOperation,
    lineage: LineageOptions,
}

impl ProvisioningRequest {
    /// Create a request with the default pattern and lineage options
    ///
    /// # Examples
    ///
    /// ```
    /// use ferry_domain::{FileOperation, ProvisioningRequest};
    ///
    /// let request = ProvisioningRequest::new("/in/report.csv", "/out", FileOperation::Copy)
    ///     .with_pattern("{0}_{1}");
    /// assert_eq!(request.destination_name_pattern(), "{0}_{1}");
    /// assert!(request.lineage().enabled);
    /// ```
    pub fn new(
        source_path: impl Into<PathBuf>,
        destination_folder: impl Into<PathBuf>,
        operation: FileOperation,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            source_element_id: None,
            destination_folder: destination_folder.into(),
            destination_name_pattern: DEFAULT_NAME_PATTERN.to_string(),
            operation,
            lineage: LineageOptions::default(),
        }
    }

    /// Set the destination file name pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.destination_name_pattern = pattern.into();
        self
    }

    /// Attach the catalogued element of the source file
    pub fn with_source_element(mut self, id: ElementId) -> Self {
        self.source_element_id = Some(id);
        self
    }

    /// Replace the lineage options
    pub fn with_lineage(mut self, lineage: LineageOptions) -> Self {
        self.lineage = lineage;
        self
    }

    /// Path of the source file
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Catalogued element of the source file, if known
    pub fn source_element_id(&self) -> Option<ElementId> {
        self.source_element_id
    }

    /// Folder the destination file is written into
    pub fn destination_folder(&self) -> &Path {
        &self.destination_folder
    }

    /// Pattern applied to (base name, index) to form candidate names
    pub fn destination_name_pattern(&self) -> &str {
        &self.destination_name_pattern
    }

    /// Physical operation to perform
    pub fn operation(&self) -> FileOperation {
        self.operation
    }

    /// Lineage options
    pub fn lineage(&self) -> &LineageOptions {
        &self.lineage
    }

    /// The source as a reference for lineage linking
    ///
    /// Prefers the catalogued element over the raw path.
    pub fn source_reference(&self) -> FileReference {
        match self.source_element_id {
            Some(id) => FileReference::Element(id),
            None => FileReference::Path(self.source_path.clone()),
        }
    }
}
