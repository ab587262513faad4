//! File classification - what a concrete file is, derived from the file itself

use crate::names::types;
use std::time::SystemTime;

/// Read-only description of one concrete file
///
/// Computed fresh from the file system for every provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClassification {
    /// Full path of the file
    pub path_name: String,

    /// Last path component
    pub file_name: String,

    /// Logical file type (e.g. "csv", "json"); "file" when unrecognised
    pub file_type: String,

    /// Extension without the leading dot
    pub file_extension: Option<String>,

    /// Metadata type the catalogued asset should have
    pub asset_type_name: String,

    /// Technology label recorded on the asset
    pub deployed_implementation_type: String,

    /// Creation time, when the platform reports it
    pub creation_time: Option<SystemTime>,

    /// Last modification time
    pub last_modified_time: Option<SystemTime>,

    /// Last access time
    pub last_accessed_time: Option<SystemTime>,
}

/// Type information derived from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileKind {
    /// Logical file type
    pub file_type: &'static str,
    /// Metadata type name of the asset
    pub asset_type_name: &'static str,
    /// Technology label
    pub deployed_implementation_type: &'static str,
}

const UNKNOWN_KIND: FileKind = FileKind {
    file_type: "file",
    asset_type_name: types::DATA_FILE,
    deployed_implementation_type: "Data File",
};

impl FileKind {
    /// Look up the kind of a file from its extension (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use ferry_domain::classification::FileKind;
    ///
    /// assert_eq!(FileKind::from_extension(Some("CSV")).asset_type_name, "CSVFile");
    /// assert_eq!(FileKind::from_extension(None).asset_type_name, "DataFile");
    /// ```
    pub fn from_extension(extension: Option<&str>) -> Self {
        let Some(ext) = extension else {
            return UNKNOWN_KIND;
        };

        let (file_type, asset_type_name, deployed_implementation_type) =
            match ext.to_lowercase().as_str() {
                "csv" => ("csv", types::CSV_FILE, "CSV Data File"),
                "tsv" => ("tsv", types::CSV_FILE, "Tab Separated Data File"),
                "json" | "jsonl" | "ndjson" => ("json", types::JSON_FILE, "JSON Data File"),
                "parquet" => ("parquet", types::PARQUET_FILE, "Apache Parquet File"),
                "avro" => ("avro", types::AVRO_FILE, "Apache Avro Data File"),
                "txt" | "log" | "md" => ("text", types::TEXT_FILE, "Text File"),
                "png" | "jpg" | "jpeg" | "gif" | "mp3" | "wav" | "mp4" | "mov" => {
                    ("media", types::MEDIA_FILE, "Media File")
                }
                "zip" | "tar" | "gz" | "tgz" => ("archive", types::ARCHIVE_FILE, "Archive File"),
                _ => return UNKNOWN_KIND,
            };

        Self {
            file_type,
            asset_type_name,
            deployed_implementation_type,
        }
    }
}

impl FileClassification {
    /// Unique name of the asset describing this file: `assetType:path`
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.asset_type_name, self.path_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(asset_type_name: &str, path: &str) -> FileClassification {
        FileClassification {
            path_name: path.to_string(),
            file_name: "report.csv".to_string(),
            file_type: "csv".to_string(),
            file_extension: Some("csv".to_string()),
            asset_type_name: asset_type_name.to_string(),
            deployed_implementation_type: "CSV Data File".to_string(),
            creation_time: None,
            last_modified_time: None,
            last_accessed_time: None,
        }
    }

    #[test]
    fn test_qualified_name() {
        let c = classification("CSVFile", "/out/report.csv");
        assert_eq!(c.qualified_name(), "CSVFile:/out/report.csv");
    }

    #[test]
    fn test_known_extensions() {
        assert_eq!(FileKind::from_extension(Some("json")).asset_type_name, types::JSON_FILE);
        assert_eq!(FileKind::from_extension(Some("Parquet")).file_type, "parquet");
        assert_eq!(FileKind::from_extension(Some("log")).asset_type_name, types::TEXT_FILE);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_data_file() {
        let kind = FileKind::from_extension(Some("xyz"));
        assert_eq!(kind.asset_type_name, types::DATA_FILE);
        assert_eq!(kind.file_type, "file");
    }
}
