//! Configuration for provisioning runs
//!
//! A [`ProvisionerConfig`] holds the standing settings (usually loaded from
//! TOML); [`RequestOverrides`] carries what a single call supplies. The two
//! are merged into an immutable [`ProvisioningRequest`] by [`build_request`].

use crate::graph::DEFAULT_PAGE_SIZE;
use crate::resolver::PathResolver;
use crate::ProvisionError;
use ferry_domain::names::properties;
use ferry_domain::request::{DEFAULT_NAME_PATTERN, DEFAULT_PROCESS_NAME};
use ferry_domain::{ElementId, FileOperation, FileReference, LineageOptions, MetadataStore, ProvisioningRequest};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Standing configuration of the provisioning service
///
/// # Examples
///
/// ```
/// use ferry_provision::ProvisionerConfig;
///
/// let config = ProvisionerConfig::from_toml(r#"
///     destination_directory = "/landing"
///     destination_file_name_pattern = "{0}_{1}"
///     column_level_lineage = false
/// "#).unwrap();
/// assert_eq!(config.destination_file_name_pattern, "{0}_{1}");
/// assert!(config.lineage);
/// assert!(!config.column_level_lineage);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// Source file path, when not supplied per call
    #[serde(default)]
    pub source_file: Option<String>,

    /// Destination folder, when not supplied per call
    #[serde(default)]
    pub destination_directory: Option<String>,

    /// Pattern for destination names: `{0}` base name, `{1}` index
    /// Default: "{0}" (keep the source name)
    #[serde(default = "default_pattern")]
    pub destination_file_name_pattern: String,

    /// File operation: "copy", "move" or "delete"
    /// Default: "copy"
    #[serde(default = "default_operation")]
    pub operation: String,

    /// Record lineage for provisioned files
    /// Default: true
    #[serde(default = "default_true")]
    pub lineage: bool,

    /// Name of the durable top-level process
    #[serde(default = "default_process_name")]
    pub top_level_process_name: String,

    /// Qualified name of a template for the top-level process
    #[serde(default)]
    pub top_level_process_template_name: Option<String>,

    /// Qualified name of a template for destination assets
    #[serde(default)]
    pub destination_template_name: Option<String>,

    /// Attach lineage to the top-level process only (no per-run child)
    #[serde(default)]
    pub top_level_process_only_lineage: bool,

    /// Start lineage at the source folder instead of the source file
    #[serde(default)]
    pub source_folder_lineage: bool,

    /// End lineage at the destination folder instead of the destination file
    #[serde(default)]
    pub destination_folder_lineage: bool,

    /// Map schema attributes between source and destination
    /// Default: true
    #[serde(default = "default_true")]
    pub column_level_lineage: bool,

    /// Information supply chain the process belongs to
    #[serde(default)]
    pub information_supply_chain: Option<String>,

    /// Page size for schema attribute listings
    #[serde(default = "default_page_size")]
    pub schema_page_size: usize,
}

fn default_pattern() -> String {
    DEFAULT_NAME_PATTERN.to_string()
}

fn default_operation() -> String {
    FileOperation::Copy.as_str().to_string()
}

fn default_process_name() -> String {
    DEFAULT_PROCESS_NAME.to_string()
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            source_file: None,
            destination_directory: None,
            destination_file_name_pattern: default_pattern(),
            operation: default_operation(),
            lineage: true,
            top_level_process_name: default_process_name(),
            top_level_process_template_name: None,
            destination_template_name: None,
            top_level_process_only_lineage: false,
            source_folder_lineage: false,
            destination_folder_lineage: false,
            column_level_lineage: true,
            information_supply_chain: None,
            schema_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProvisionerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.destination_file_name_pattern.is_empty() {
            return Err(ProvisionError::Config(
                "destination_file_name_pattern must not be empty".to_string(),
            ));
        }
        if self.top_level_process_name.is_empty() {
            return Err(ProvisionError::Config(
                "top_level_process_name must not be empty".to_string(),
            ));
        }
        if self.schema_page_size == 0 {
            return Err(ProvisionError::Config(
                "schema_page_size must be greater than 0".to_string(),
            ));
        }
        self.file_operation()?;
        Ok(())
    }

    /// The configured operation
    pub fn file_operation(&self) -> Result<FileOperation, ProvisionError> {
        FileOperation::parse(&self.operation)
            .ok_or_else(|| ProvisionError::Config(format!("unknown operation '{}'", self.operation)))
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ProvisionError> {
        toml::from_str(toml_str)
            .map_err(|e| ProvisionError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, ProvisionError> {
        toml::to_string_pretty(self)
            .map_err(|e| ProvisionError::Config(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProvisionError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProvisionError::io("reading configuration", path, e))?;
        let config = Self::from_toml(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

/// Values supplied by a single call; each one beats the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOverrides {
    /// Source file path
    pub source_file: Option<PathBuf>,

    /// Catalogued source file (action target)
    pub source_element: Option<ElementId>,

    /// Destination folder path
    pub destination_directory: Option<PathBuf>,

    /// Catalogued destination folder (action target)
    pub destination_element: Option<ElementId>,

    /// Destination name pattern
    pub destination_file_name_pattern: Option<String>,

    /// File operation
    pub operation: Option<FileOperation>,

    /// Switch lineage on or off
    pub lineage: Option<bool>,
}

/// Merge configuration and per-call values into a provisioning request
///
/// Element references beat path strings. When a source element does not
/// resolve but a source path string exists, the path is used and the element
/// is kept for lineage. Missing source or destination is a configuration
/// error, reported before any file is touched.
pub fn build_request<S: MetadataStore>(
    config: &ProvisionerConfig,
    overrides: &RequestOverrides,
    resolver: &PathResolver<S>,
    store: &S,
) -> Result<ProvisioningRequest, ProvisionError> {
    config.validate()?;

    let explicit_source = overrides
        .source_file
        .clone()
        .or_else(|| config.source_file.as_ref().map(PathBuf::from));

    let source_path = match overrides.source_element {
        Some(id) => match resolver.resolve(&FileReference::Element(id), store) {
            Ok(path) => path,
            Err(e) => match explicit_source {
                Some(path) => {
                    tracing::warn!(
                        element = %id,
                        path = %path.display(),
                        error = %e,
                        "source element has no resolvable path; using configured source file"
                    );
                    path
                }
                None => {
                    return Err(ProvisionError::Config(format!(
                        "no source file: element {} did not resolve ({})",
                        id, e
                    )))
                }
            },
        },
        None => explicit_source
            .ok_or_else(|| ProvisionError::Config("no source file specified".to_string()))?,
    };

    let destination_folder = match overrides.destination_element {
        Some(id) => resolver.resolve(&FileReference::Element(id), store)?,
        None => overrides
            .destination_directory
            .clone()
            .or_else(|| config.destination_directory.as_ref().map(PathBuf::from))
            .ok_or_else(|| ProvisionError::Config("no destination directory specified".to_string()))?,
    };

    let operation = match overrides.operation {
        Some(operation) => operation,
        None => config.file_operation()?,
    };

    let pattern = overrides
        .destination_file_name_pattern
        .clone()
        .unwrap_or_else(|| config.destination_file_name_pattern.clone());

    let lineage = if overrides.lineage.unwrap_or(config.lineage) {
        LineageOptions {
            enabled: true,
            top_level_process_name: config.top_level_process_name.clone(),
            top_level_process_template_id: find_template(store, config.top_level_process_template_name.as_deref()),
            destination_template_id: find_template(store, config.destination_template_name.as_deref()),
            per_run_child_process: !config.top_level_process_only_lineage,
            lineage_from_source_file: !config.source_folder_lineage,
            lineage_to_destination_file: !config.destination_folder_lineage,
            column_level_lineage: config.column_level_lineage,
            information_supply_chain_name: config.information_supply_chain.clone(),
        }
    } else {
        LineageOptions::disabled()
    };

    let mut request = ProvisioningRequest::new(source_path, destination_folder, operation)
        .with_pattern(pattern)
        .with_lineage(lineage);
    if let Some(id) = overrides.source_element {
        request = request.with_source_element(id);
    }
    Ok(request)
}

/// Look up a template by qualified name; a missing template only disables its use
fn find_template<S: MetadataStore>(store: &S, name: Option<&str>) -> Option<ElementId> {
    let name = name?;
    match store.get_element_by_unique_name(name, properties::QUALIFIED_NAME) {
        Ok(Some(id)) => Some(id),
        Ok(None) => {
            tracing::warn!(template = name, "template not found; elements will be created directly");
            None
        }
        Err(e) => {
            tracing::warn!(template = name, error = %e, "template lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_catalog::SqliteCatalog;
    use ferry_domain::names::types;
    use std::collections::BTreeMap;

    fn catalog() -> SqliteCatalog {
        SqliteCatalog::new(":memory:").unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ProvisionerConfig::default();
        assert_eq!(config.destination_file_name_pattern, "{0}");
        assert_eq!(config.operation, "copy");
        assert!(config.lineage);
        assert!(config.column_level_lineage);
        assert!(!config.top_level_process_only_lineage);
        assert_eq!(config.schema_page_size, DEFAULT_PAGE_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = ProvisionerConfig::from_toml("").unwrap();
        assert_eq!(config, ProvisionerConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ProvisionerConfig {
            destination_directory: Some("/out".to_string()),
            information_supply_chain: Some("landing-chain".to_string()),
            ..Default::default()
        };
        let parsed = ProvisionerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_invalid_operation() {
        let config = ProvisionerConfig {
            operation: "archive".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ProvisionError::Config(_))));
    }

    #[test]
    fn test_invalid_page_size() {
        let config = ProvisionerConfig {
            schema_page_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_take_priority() {
        let store = catalog();
        let config = ProvisionerConfig {
            source_file: Some("/config/in.csv".to_string()),
            destination_directory: Some("/config/out".to_string()),
            ..Default::default()
        };
        let overrides = RequestOverrides {
            source_file: Some(PathBuf::from("/call/in.csv")),
            destination_file_name_pattern: Some("{0}_{1}".to_string()),
            operation: Some(FileOperation::Move),
            lineage: Some(false),
            ..Default::default()
        };

        let request = build_request(&config, &overrides, &PathResolver::default_chain(), &store).unwrap();
        assert_eq!(request.source_path(), Path::new("/call/in.csv"));
        assert_eq!(request.destination_folder(), Path::new("/config/out"));
        assert_eq!(request.destination_name_pattern(), "{0}_{1}");
        assert_eq!(request.operation(), FileOperation::Move);
        assert!(!request.lineage().enabled);
    }

    #[test]
    fn test_missing_source_is_config_error() {
        let store = catalog();
        let config = ProvisionerConfig {
            destination_directory: Some("/out".to_string()),
            ..Default::default()
        };
        let result = build_request(&config, &RequestOverrides::default(), &PathResolver::default_chain(), &store);
        assert!(matches!(result, Err(ProvisionError::Config(_))));
    }

    #[test]
    fn test_missing_destination_is_config_error() {
        let store = catalog();
        let config = ProvisionerConfig {
            source_file: Some("/in/a.csv".to_string()),
            ..Default::default()
        };
        let result = build_request(&config, &RequestOverrides::default(), &PathResolver::default_chain(), &store);
        assert!(matches!(result, Err(ProvisionError::Config(_))));
    }

    #[test]
    fn test_element_references_beat_paths() {
        let store = catalog();
        let mut props = BTreeMap::new();
        props.insert("pathName".to_string(), "/catalogued/in.csv".to_string());
        let source = store.create_element(types::CSV_FILE, &props, None).unwrap();

        let mut props = BTreeMap::new();
        props.insert("pathName".to_string(), "/catalogued/out".to_string());
        let destination = store.create_element(types::FILE_FOLDER, &props, None).unwrap();

        let config = ProvisionerConfig {
            source_file: Some("/config/in.csv".to_string()),
            destination_directory: Some("/config/out".to_string()),
            ..Default::default()
        };
        let overrides = RequestOverrides {
            source_element: Some(source),
            destination_element: Some(destination),
            ..Default::default()
        };

        let request = build_request(&config, &overrides, &PathResolver::default_chain(), &store).unwrap();
        assert_eq!(request.source_path(), Path::new("/catalogued/in.csv"));
        assert_eq!(request.destination_folder(), Path::new("/catalogued/out"));
        assert_eq!(request.source_element_id(), Some(source));
    }

    #[test]
    fn test_unresolvable_source_element_tolerated_with_path() {
        let store = catalog();
        let source = store.create_element(types::CSV_FILE, &BTreeMap::new(), None).unwrap();
        let config = ProvisionerConfig {
            source_file: Some("/config/in.csv".to_string()),
            destination_directory: Some("/out".to_string()),
            ..Default::default()
        };
        let overrides = RequestOverrides {
            source_element: Some(source),
            ..Default::default()
        };

        let request = build_request(&config, &overrides, &PathResolver::default_chain(), &store).unwrap();
        assert_eq!(request.source_path(), Path::new("/config/in.csv"));
        assert_eq!(request.source_element_id(), Some(source));
    }

    #[test]
    fn test_unresolvable_destination_element_fails() {
        let store = catalog();
        let destination = store.create_element(types::FILE_FOLDER, &BTreeMap::new(), None).unwrap();
        let config = ProvisionerConfig {
            source_file: Some("/in/a.csv".to_string()),
            destination_directory: Some("/out".to_string()),
            ..Default::default()
        };
        let overrides = RequestOverrides {
            destination_element: Some(destination),
            ..Default::default()
        };

        let result = build_request(&config, &overrides, &PathResolver::default_chain(), &store);
        assert!(matches!(result, Err(ProvisionError::PathNotResolvable(_))));
    }

    #[test]
    fn test_lineage_flags_map_to_options() {
        let store = catalog();
        let mut props = BTreeMap::new();
        props.insert("qualifiedName".to_string(), "process-template".to_string());
        let template = store.create_element(types::PROCESS, &props, None).unwrap();

        let config = ProvisionerConfig {
            source_file: Some("/in/a.csv".to_string()),
            destination_directory: Some("/out".to_string()),
            top_level_process_template_name: Some("process-template".to_string()),
            destination_template_name: Some("missing-template".to_string()),
            top_level_process_only_lineage: true,
            source_folder_lineage: true,
            column_level_lineage: false,
            ..Default::default()
        };

        let request = build_request(&config, &RequestOverrides::default(), &PathResolver::default_chain(), &store).unwrap();
        let lineage = request.lineage();
        assert!(lineage.enabled);
        assert_eq!(lineage.top_level_process_template_id, Some(template));
        assert_eq!(lineage.destination_template_id, None);
        assert!(!lineage.per_run_child_process);
        assert!(!lineage.lineage_from_source_file);
        assert!(lineage.lineage_to_destination_file);
        assert!(!lineage.column_level_lineage);
    }
}
