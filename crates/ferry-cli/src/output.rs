//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use ferry_domain::{CompletionRecord, ElementId, MetadataElement};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Serializable view of a completion record.
#[derive(Debug, Serialize)]
struct RecordView<'a> {
    guard: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination_path: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_asset: Option<String>,
}

impl<'a> From<&'a CompletionRecord> for RecordView<'a> {
    fn from(record: &'a CompletionRecord) -> Self {
        Self {
            guard: record.guard.as_str(),
            message: record.message.as_deref(),
            destination_path: record.destination_path.as_ref(),
            new_asset: record.new_asset.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ElementView<'a> {
    id: String,
    type_name: &'a str,
    properties: &'a BTreeMap<String, String>,
    classifications: &'a [String],
}

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat) -> Self {
        Self { format }
    }

    /// Format completion records.
    pub fn format_records(&self, records: &[CompletionRecord]) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let views: Vec<RecordView<'_>> = records.iter().map(RecordView::from).collect();
                if let [single] = views.as_slice() {
                    Ok(serde_json::to_string_pretty(single)?)
                } else {
                    Ok(serde_json::to_string_pretty(&views)?)
                }
            }
            CliFormat::Text => Ok(records
                .iter()
                .map(|record| {
                    let mut line = record.guard.to_string();
                    if let Some(path) = &record.destination_path {
                        line.push_str(&format!(" {}", path.display()));
                    }
                    if let Some(asset) = record.new_asset {
                        line.push_str(&format!(" asset={}", asset));
                    }
                    if let Some(message) = &record.message {
                        line.push_str(&format!(" ({})", message));
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format registered paths and their element ids.
    pub fn format_registered(&self, registered: &[(PathBuf, ElementId)]) -> Result<String> {
        match self.format {
            CliFormat::Json => {
                let map: BTreeMap<String, String> = registered
                    .iter()
                    .map(|(path, id)| (path.display().to_string(), id.to_string()))
                    .collect();
                Ok(serde_json::to_string_pretty(&map)?)
            }
            CliFormat::Text => Ok(registered
                .iter()
                .map(|(path, id)| format!("{} {}", id, path.display()))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format a catalogued element.
    pub fn format_element(&self, element: &MetadataElement) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(&ElementView {
                id: element.id.to_string(),
                type_name: &element.type_name,
                properties: &element.properties,
                classifications: &element.classifications,
            })?),
            CliFormat::Text => {
                let mut lines = vec![format!("{} ({})", element.id, element.type_name)];
                for (key, value) in &element.properties {
                    lines.push(format!("  {} = {}", key, value));
                }
                for classification in &element.classifications {
                    lines.push(format!("  [{}]", classification));
                }
                Ok(lines.join("\n"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_single_record() {
        let formatter = Formatter::new(CliFormat::Json);
        let record = CompletionRecord::complete(Some(PathBuf::from("/out/report.csv")), None);
        let output = formatter.format_records(&[record]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["guard"], "provisioning-complete");
        assert_eq!(value["destination_path"], "/out/report.csv");
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_json_batch_is_array() {
        let formatter = Formatter::new(CliFormat::Json);
        let records = vec![CompletionRecord::no_file_names(), CompletionRecord::exception("denied")];
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_records(&records).unwrap()).unwrap();

        assert_eq!(value[0]["guard"], "provisioning-failed-no-file-names");
        assert_eq!(value[1]["message"], "denied");
    }

    #[test]
    fn test_text_record() {
        let formatter = Formatter::new(CliFormat::Text);
        let output = formatter
            .format_records(&[CompletionRecord::exception("disk full")])
            .unwrap();
        assert_eq!(output, "provisioning-failed-exception (disk full)");
    }
}
