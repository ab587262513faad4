//! File classification from the physical file

use crate::ProvisionError;
use chrono::{DateTime, Utc};
use ferry_domain::classification::FileKind;
use ferry_domain::FileClassification;
use std::path::Path;
use std::time::SystemTime;

/// Describe a file on disk
///
/// Reads file system metadata every time; nothing is cached between runs.
/// Timestamps the platform cannot report are left empty.
pub fn classify(path: &Path) -> Result<FileClassification, ProvisionError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ProvisionError::io("reading file metadata", path, e))?;

    let file_extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned());
    let kind = FileKind::from_extension(file_extension.as_deref());

    Ok(FileClassification {
        path_name: path.to_string_lossy().into_owned(),
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        file_type: kind.file_type.to_string(),
        file_extension,
        asset_type_name: kind.asset_type_name.to_string(),
        deployed_implementation_type: kind.deployed_implementation_type.to_string(),
        creation_time: metadata.created().ok(),
        last_modified_time: metadata.modified().ok(),
        last_accessed_time: metadata.accessed().ok(),
    })
}

/// Render a timestamp for a template placeholder; absent times are empty
pub fn format_timestamp(time: Option<SystemTime>) -> String {
    time.map(|t| DateTime::<Utc>::from(t).to_rfc3339())
        .unwrap_or_default()
}
