//! Lineage graph construction
//!
//! After a file lands in its destination, the builder records where it came
//! from: a durable top-level process (optionally with a fresh child process
//! per run), data flows source → process → destination, and, when both ends
//! carry schemas, one data mapping per pair of positionally matched
//! attributes.
//!
//! Every step is an "ensure exists" call against the metadata store. A
//! failing step is logged and skipped; the steps after it still run with
//! whatever earlier steps produced.

use crate::classify::{classify, format_timestamp};
use crate::graph::{first_related, related_all, DEFAULT_PAGE_SIZE};
use crate::ProvisionError;
use ferry_domain::classification::FileKind;
use ferry_domain::names::{properties, relationships, types};
use ferry_domain::{
    CreationMode, Direction, ElementId, FileClassification, FileReference, LineageOptions,
    MetadataStore, ParentLink,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// What a lineage run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageOutcome {
    /// Process the data flows attach to (child process when one was created)
    pub process: Option<ElementId>,

    /// Catalogued destination file
    pub destination_asset: Option<ElementId>,

    /// Catalogued source file
    pub source_asset: Option<ElementId>,

    /// Data flow edges ensured (0, 1 or 2)
    pub data_flows: usize,

    /// Data mapping edges ensured
    pub data_mappings: usize,
}

/// Builds the lineage graph for one provisioned file
///
/// One builder is shared by every run of a provisioner. Lookup-or-create of
/// the shared process nodes happens under `shared_nodes`, so concurrent runs
/// see a single top-level process and supply chain.
pub struct LineageBuilder<S: MetadataStore> {
    store: Arc<S>,
    schema_page_size: usize,
    shared_nodes: Mutex<()>,
}

impl<S: MetadataStore> LineageBuilder<S> {
    /// Create a builder over a shared store
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            schema_page_size: DEFAULT_PAGE_SIZE,
            shared_nodes: Mutex::new(()),
        }
    }

    /// Page size used when listing schema attributes
    pub fn with_schema_page_size(mut self, page_size: usize) -> Self {
        self.schema_page_size = page_size.max(1);
        self
    }

    /// Record lineage for a file that has just been written to `destination_path`
    ///
    /// Only a failure to read the destination file is returned as an error;
    /// failures of individual graph steps are logged and absorbed.
    pub fn build(
        &self,
        source: &FileReference,
        destination_path: &Path,
        options: &LineageOptions,
    ) -> Result<LineageOutcome, ProvisionError> {
        let classification = classify(destination_path)?;
        let mut outcome = LineageOutcome::default();

        outcome.process = self.step("ensure lineage process", || self.lineage_process(options));
        outcome.destination_asset = self.step("ensure destination asset", || {
            self.ensure_destination_asset(&classification, options)
        });
        outcome.source_asset = self
            .step("find source asset", || self.find_source_asset(source))
            .flatten();

        if let Some(process) = outcome.process {
            let from = self.endpoint(outcome.source_asset, options.lineage_from_source_file, "source");
            let to = self.endpoint(outcome.destination_asset, options.lineage_to_destination_file, "destination");

            for (end1, end2, label) in [(from, Some(process), "source"), (Some(process), to, "destination")] {
                let (Some(end1), Some(end2)) = (end1, end2) else {
                    tracing::info!(side = label, "no catalogued {} endpoint; data flow skipped", label);
                    continue;
                };
                if self.step("ensure data flow", || self.ensure_relationship(relationships::DATA_FLOW, end1, end2)).is_some() {
                    outcome.data_flows += 1;
                }
            }
        }

        if options.column_level_lineage {
            if let (Some(source_asset), Some(destination_asset)) = (outcome.source_asset, outcome.destination_asset) {
                outcome.data_mappings = self
                    .step("column level lineage", || self.column_lineage(source_asset, destination_asset))
                    .unwrap_or(0);
            }
        }

        tracing::info!(
            destination = %destination_path.display(),
            process = ?outcome.process,
            destination_asset = ?outcome.destination_asset,
            data_flows = outcome.data_flows,
            data_mappings = outcome.data_mappings,
            "lineage recorded"
        );
        Ok(outcome)
    }

    /// Run one step, logging and swallowing its error
    fn step<T>(&self, name: &str, f: impl FnOnce() -> Result<T, ProvisionError>) -> Option<T> {
        match f() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(step = name, error = %e, "lineage step failed");
                None
            }
        }
    }

    /// The file itself, or its folder when folder-level lineage is requested
    fn endpoint(&self, file: Option<ElementId>, file_level: bool, side: &str) -> Option<ElementId> {
        let file = file?;
        if file_level {
            return Some(file);
        }
        let folder = self.step("find parent folder", || self.parent_folder(file)).flatten();
        if folder.is_none() {
            tracing::warn!(side, asset = %file, "asset is not nested in a catalogued folder");
        }
        folder
    }

    fn create(&self, mode: &CreationMode, parent: Option<&ParentLink>) -> Result<ElementId, ProvisionError> {
        match mode {
            CreationMode::Direct { type_name, properties } => self
                .store
                .create_element(type_name, properties, parent)
                .map_err(ProvisionError::store),
            CreationMode::FromTemplate {
                template_id,
                placeholders,
                replacement_properties,
            } => self
                .store
                .create_element_from_template(*template_id, placeholders, replacement_properties, parent)
                .map_err(ProvisionError::store),
        }
    }

    fn ensure_relationship(&self, relationship_type: &str, end1: ElementId, end2: ElementId) -> Result<ElementId, ProvisionError> {
        self.store
            .create_relationship(relationship_type, end1, end2, &BTreeMap::new())
            .map_err(ProvisionError::store)
    }

    fn lookup(&self, name: &str, property_key: &str) -> Result<Option<ElementId>, ProvisionError> {
        self.store
            .get_element_by_unique_name(name, property_key)
            .map_err(ProvisionError::store)
    }

    /// Process the data flows attach to for this run
    fn lineage_process(&self, options: &LineageOptions) -> Result<ElementId, ProvisionError> {
        let top_level = {
            let _guard = self.shared_nodes.lock().unwrap_or_else(PoisonError::into_inner);
            let top_level = self.ensure_top_level_process(options)?;
            if let Some(chain) = &options.information_supply_chain_name {
                self.step("link information supply chain", || self.link_supply_chain(chain, top_level));
            }
            top_level
        };

        if !options.per_run_child_process {
            return Ok(top_level);
        }

        let name = format!("{}:{}", options.top_level_process_name, ElementId::new());
        let mode = CreationMode::Direct {
            type_name: types::PROCESS.to_string(),
            properties: name_properties(&name),
        };
        let child = self.create(&mode, Some(&ParentLink::new(top_level, relationships::PROCESS_HIERARCHY)))?;
        tracing::debug!(%top_level, %child, name = %name, "created per-run process");
        Ok(child)
    }

    fn ensure_top_level_process(&self, options: &LineageOptions) -> Result<ElementId, ProvisionError> {
        let name = &options.top_level_process_name;
        if let Some(id) = self.lookup(name, properties::QUALIFIED_NAME)? {
            return Ok(id);
        }

        let mode = match options.top_level_process_template_id {
            Some(template_id) => {
                let mut placeholders = BTreeMap::new();
                placeholders.insert("processName".to_string(), name.clone());
                CreationMode::FromTemplate {
                    template_id,
                    placeholders,
                    replacement_properties: name_properties(name),
                }
            }
            None => CreationMode::Direct {
                type_name: types::PROCESS.to_string(),
                properties: name_properties(name),
            },
        };

        let id = self.create(&mode, None)?;
        tracing::info!(process = %name, %id, "created top-level process");
        Ok(id)
    }

    fn link_supply_chain(&self, chain: &str, process: ElementId) -> Result<ElementId, ProvisionError> {
        let chain_id = match self.lookup(chain, properties::QUALIFIED_NAME)? {
            Some(id) => id,
            None => self.create(
                &CreationMode::Direct {
                    type_name: types::INFORMATION_SUPPLY_CHAIN.to_string(),
                    properties: name_properties(chain),
                },
                None,
            )?,
        };
        self.ensure_relationship(relationships::INFORMATION_SUPPLY_CHAIN_LINK, chain_id, process)
    }

    /// Find the catalogued destination file, or create it
    fn ensure_destination_asset(
        &self,
        classification: &FileClassification,
        options: &LineageOptions,
    ) -> Result<ElementId, ProvisionError> {
        let qualified_name = classification.qualified_name();
        if let Some(id) = self.lookup(&qualified_name, properties::QUALIFIED_NAME)? {
            return Ok(id);
        }
        if let Some(id) = self.lookup(&classification.path_name, properties::PATH_NAME)? {
            return Ok(id);
        }

        let folder_path = Path::new(&classification.path_name)
            .parent()
            .map(|p| p.to_string_lossy().into_owned());
        let parent = match folder_path {
            Some(folder_path) => self
                .find_folder(&folder_path)?
                .map(|id| ParentLink::new(id, relationships::NESTED_FILE)),
            None => None,
        };
        if parent.is_none() {
            tracing::info!(path = %classification.path_name, "destination folder is not catalogued");
        }

        let mode = match options.destination_template_id {
            Some(template_id) => CreationMode::FromTemplate {
                template_id,
                placeholders: template_placeholders(classification),
                replacement_properties: BTreeMap::new(),
            },
            None => CreationMode::Direct {
                type_name: classification.asset_type_name.clone(),
                properties: asset_properties(classification),
            },
        };

        let id = self.create(&mode, parent.as_ref())?;
        tracing::info!(asset = %qualified_name, %id, "catalogued destination file");
        Ok(id)
    }

    /// Folder element by path, then resource name, then plain name
    fn find_folder(&self, folder_path: &str) -> Result<Option<ElementId>, ProvisionError> {
        for key in [properties::PATH_NAME, properties::RESOURCE_NAME, properties::NAME] {
            if let Some(id) = self.lookup(folder_path, key)? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    fn find_source_asset(&self, source: &FileReference) -> Result<Option<ElementId>, ProvisionError> {
        let path = match source {
            FileReference::Element(id) => return Ok(Some(*id)),
            FileReference::Path(path) => path,
        };

        let path_name = path.to_string_lossy();
        if let Some(id) = self.lookup(&path_name, properties::PATH_NAME)? {
            return Ok(Some(id));
        }

        let extension = path.extension().map(|e| e.to_string_lossy().into_owned());
        let kind = FileKind::from_extension(extension.as_deref());
        let qualified_name = format!("{}:{}", kind.asset_type_name, path_name);
        let found = self.lookup(&qualified_name, properties::QUALIFIED_NAME)?;
        if found.is_none() {
            tracing::warn!(source = %path_name, "source file is not catalogued");
        }
        Ok(found)
    }

    fn parent_folder(&self, asset: ElementId) -> Result<Option<ElementId>, ProvisionError> {
        Ok(first_related(self.store.as_ref(), asset, Direction::Inbound, relationships::NESTED_FILE)?
            .map(|related| related.element.id))
    }

    /// Pair schema attributes by position; returns the number of mappings
    fn column_lineage(&self, source: ElementId, destination: ElementId) -> Result<usize, ProvisionError> {
        let store = self.store.as_ref();
        let Some(source_schema) = first_related(store, source, Direction::Outbound, relationships::ASSET_SCHEMA_TYPE)? else {
            tracing::debug!(asset = %source, "source has no schema; column lineage skipped");
            return Ok(0);
        };
        let Some(destination_schema) = first_related(store, destination, Direction::Outbound, relationships::ASSET_SCHEMA_TYPE)? else {
            tracing::debug!(asset = %destination, "destination has no schema; column lineage skipped");
            return Ok(0);
        };

        let source_attributes = self.ordered_attributes(source_schema.element.id)?;
        let destination_attributes = self.ordered_attributes(destination_schema.element.id)?;

        if source_attributes.len() != destination_attributes.len() {
            tracing::info!(
                source_attributes = source_attributes.len(),
                destination_attributes = destination_attributes.len(),
                "attribute counts differ; trailing attributes left unmapped"
            );
        }

        let mut mapped = 0;
        for (from, to) in source_attributes.iter().zip(&destination_attributes) {
            self.ensure_relationship(relationships::DATA_MAPPING, *from, *to)?;
            mapped += 1;
        }
        Ok(mapped)
    }

    /// Attributes of a schema type sorted by declared position
    fn ordered_attributes(&self, schema_type: ElementId) -> Result<Vec<ElementId>, ProvisionError> {
        let mut attributes = related_all(
            self.store.as_ref(),
            schema_type,
            Direction::Outbound,
            relationships::ATTRIBUTE_FOR_SCHEMA,
            self.schema_page_size,
        )?;
        attributes.sort_by_key(|a| {
            a.element
                .property(properties::POSITION)
                .and_then(|p| p.parse::<u64>().ok())
                .unwrap_or(u64::MAX)
        });
        Ok(attributes.into_iter().map(|a| a.element.id).collect())
    }
}

fn name_properties(name: &str) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    props.insert(properties::QUALIFIED_NAME.to_string(), name.to_string());
    props.insert(properties::NAME.to_string(), name.to_string());
    props.insert(properties::DISPLAY_NAME.to_string(), name.to_string());
    props
}

fn asset_properties(c: &FileClassification) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    props.insert(properties::QUALIFIED_NAME.to_string(), c.qualified_name());
    props.insert(properties::NAME.to_string(), c.file_name.clone());
    props.insert(properties::FILE_NAME.to_string(), c.file_name.clone());
    props.insert(properties::PATH_NAME.to_string(), c.path_name.clone());
    props.insert(properties::FILE_TYPE.to_string(), c.file_type.clone());
    props.insert(
        properties::DEPLOYED_IMPLEMENTATION_TYPE.to_string(),
        c.deployed_implementation_type.clone(),
    );
    if let Some(ext) = &c.file_extension {
        props.insert(properties::FILE_EXTENSION.to_string(), ext.clone());
    }
    for (key, time) in [
        (properties::CREATE_TIME, c.creation_time),
        (properties::MODIFIED_TIME, c.last_modified_time),
        (properties::ACCESS_TIME, c.last_accessed_time),
    ] {
        if time.is_some() {
            props.insert(key.to_string(), format_timestamp(time));
        }
    }
    props
}

fn template_placeholders(c: &FileClassification) -> BTreeMap<String, String> {
    let mut placeholders = BTreeMap::new();
    placeholders.insert(properties::QUALIFIED_NAME.to_string(), c.qualified_name());
    placeholders.insert(properties::PATH_NAME.to_string(), c.path_name.clone());
    placeholders.insert(properties::FILE_NAME.to_string(), c.file_name.clone());
    placeholders.insert(properties::FILE_TYPE.to_string(), c.file_type.clone());
    placeholders.insert(
        properties::FILE_EXTENSION.to_string(),
        c.file_extension.clone().unwrap_or_default(),
    );
    placeholders.insert("assetTypeName".to_string(), c.asset_type_name.clone());
    placeholders.insert(
        properties::DEPLOYED_IMPLEMENTATION_TYPE.to_string(),
        c.deployed_implementation_type.clone(),
    );
    placeholders.insert(properties::CREATE_TIME.to_string(), format_timestamp(c.creation_time));
    placeholders.insert(properties::MODIFIED_TIME.to_string(), format_timestamp(c.last_modified_time));
    placeholders.insert(properties::ACCESS_TIME.to_string(), format_timestamp(c.last_accessed_time));
    placeholders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(created: bool) -> FileClassification {
        FileClassification {
            path_name: "/out/report.csv".to_string(),
            file_name: "report.csv".to_string(),
            file_type: "csv".to_string(),
            file_extension: Some("csv".to_string()),
            asset_type_name: "CSVFile".to_string(),
            deployed_implementation_type: "CSV Data File".to_string(),
            creation_time: created.then(std::time::SystemTime::now),
            last_modified_time: None,
            last_accessed_time: None,
        }
    }

    #[test]
    fn test_placeholders_default_to_empty() {
        let placeholders = template_placeholders(&classification(false));
        assert_eq!(placeholders.get("createTime").map(String::as_str), Some(""));
        assert_eq!(placeholders.get("modifiedTime").map(String::as_str), Some(""));
        assert_eq!(placeholders.get("pathName").map(String::as_str), Some("/out/report.csv"));
        assert_eq!(placeholders.get("qualifiedName").map(String::as_str), Some("CSVFile:/out/report.csv"));
    }

    #[test]
    fn test_asset_properties_omit_missing_times() {
        let props = asset_properties(&classification(false));
        assert!(!props.contains_key("createTime"));
        assert_eq!(props.get("fileExtension").map(String::as_str), Some("csv"));

        let props = asset_properties(&classification(true));
        assert!(props.contains_key("createTime"));
    }
}
