//! Cataloguing helpers for files, folders and their schemas
//!
//! These work against any [`MetadataStore`], so they can seed the local
//! catalog before provisioning runs as well as test fixtures.

use ferry_domain::classification::FileKind;
use ferry_domain::names::{properties, relationships, types};
use ferry_domain::{ElementId, MetadataStore, ParentLink};
use std::collections::BTreeMap;
use std::path::Path;

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn last_component(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_string(path))
}

/// Catalogue a folder, reusing an existing entry with the same path
///
/// The folder is nested under its parent folder when the parent is already
/// catalogued; parents are never created implicitly.
pub fn register_folder<S: MetadataStore>(store: &S, path: &Path) -> Result<ElementId, S::Error> {
    let path_name = path_string(path);
    if let Some(id) = store.get_element_by_unique_name(&path_name, properties::PATH_NAME)? {
        return Ok(id);
    }

    let mut props = BTreeMap::new();
    props.insert(
        properties::QUALIFIED_NAME.to_string(),
        format!("{}:{}", types::FILE_FOLDER, path_name),
    );
    props.insert(properties::NAME.to_string(), last_component(path));
    props.insert(properties::PATH_NAME.to_string(), path_name.clone());

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => store
            .get_element_by_unique_name(&path_string(parent), properties::PATH_NAME)?
            .map(|id| ParentLink::new(id, relationships::FOLDER_HIERARCHY)),
        _ => None,
    };

    let id = store.create_element(types::FILE_FOLDER, &props, parent.as_ref())?;
    tracing::info!(path = %path_name, %id, "catalogued folder");
    Ok(id)
}

/// Catalogue a data file, reusing an existing entry with the same path
///
/// The asset type comes from the file extension; the containing folder is
/// catalogued too so the file can be nested under it.
pub fn register_file<S: MetadataStore>(store: &S, path: &Path) -> Result<ElementId, S::Error> {
    let path_name = path_string(path);
    if let Some(id) = store.get_element_by_unique_name(&path_name, properties::PATH_NAME)? {
        return Ok(id);
    }

    let extension = path.extension().map(|ext| ext.to_string_lossy().into_owned());
    let kind = FileKind::from_extension(extension.as_deref());

    let mut props = BTreeMap::new();
    props.insert(
        properties::QUALIFIED_NAME.to_string(),
        format!("{}:{}", kind.asset_type_name, path_name),
    );
    props.insert(properties::NAME.to_string(), last_component(path));
    props.insert(properties::FILE_NAME.to_string(), last_component(path));
    props.insert(properties::PATH_NAME.to_string(), path_name.clone());
    props.insert(properties::FILE_TYPE.to_string(), kind.file_type.to_string());
    props.insert(
        properties::DEPLOYED_IMPLEMENTATION_TYPE.to_string(),
        kind.deployed_implementation_type.to_string(),
    );
    if let Some(ext) = extension {
        props.insert(properties::FILE_EXTENSION.to_string(), ext);
    }

    let parent = match path.parent() {
        Some(folder) if !folder.as_os_str().is_empty() => Some(ParentLink::new(
            register_folder(store, folder)?,
            relationships::NESTED_FILE,
        )),
        _ => None,
    };

    let id = store.create_element(kind.asset_type_name, &props, parent.as_ref())?;
    tracing::info!(path = %path_name, %id, asset_type = kind.asset_type_name, "catalogued file");
    Ok(id)
}

/// Attach a schema with ordered attributes to an asset
///
/// Attributes get positions 0, 1, 2, ... in the order given. Returns the
/// schema type id.
pub fn attach_schema<S: MetadataStore>(
    store: &S,
    asset_id: ElementId,
    columns: &[&str],
) -> Result<ElementId, S::Error> {
    let mut schema_props = BTreeMap::new();
    schema_props.insert(
        properties::QUALIFIED_NAME.to_string(),
        format!("{}:{}", types::SCHEMA_TYPE, asset_id),
    );
    let schema_id = store.create_element(
        types::SCHEMA_TYPE,
        &schema_props,
        Some(&ParentLink::new(asset_id, relationships::ASSET_SCHEMA_TYPE)),
    )?;

    let attribute_parent = ParentLink::new(schema_id, relationships::ATTRIBUTE_FOR_SCHEMA);
    for (position, column) in columns.iter().enumerate() {
        let mut props = BTreeMap::new();
        props.insert(
            properties::QUALIFIED_NAME.to_string(),
            format!("{}:{}:{}", types::SCHEMA_ATTRIBUTE, schema_id, column),
        );
        props.insert(properties::NAME.to_string(), column.to_string());
        props.insert(properties::POSITION.to_string(), position.to_string());
        store.create_element(types::SCHEMA_ATTRIBUTE, &props, Some(&attribute_parent))?;
    }

    Ok(schema_id)
}
