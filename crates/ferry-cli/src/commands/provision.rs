//! Provision command implementation.

use crate::cli::ProvisionArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use ferry_catalog::SqliteCatalog;
use ferry_domain::ElementId;
use ferry_provision::{build_request, Provisioner, ProvisionerConfig, ProvisioningWorker, RequestOverrides};
use std::sync::Arc;

fn parse_id(value: &str) -> Result<ElementId> {
    ElementId::from_string(value)
        .map_err(|e| CliError::InvalidInput(format!("Invalid element id '{}': {}", value, e)))
}

/// Per-call values from the command line, without the sources.
fn overrides(args: &ProvisionArgs) -> Result<RequestOverrides> {
    Ok(RequestOverrides {
        source_file: None,
        source_element: args.source_guid.as_deref().map(parse_id).transpose()?,
        destination_directory: args.destination.clone(),
        destination_element: args.destination_guid.as_deref().map(parse_id).transpose()?,
        destination_file_name_pattern: args.pattern.clone(),
        operation: args.operation.map(Into::into),
        lineage: args.no_lineage.then_some(false),
    })
}

/// Execute the provision command.
///
/// Returns true when every request completed.
pub async fn execute_provision(
    args: ProvisionArgs,
    config: &ProvisionerConfig,
    store: Arc<SqliteCatalog>,
    formatter: &Formatter,
) -> Result<bool> {
    let provisioner = Arc::new(
        Provisioner::new(Arc::clone(&store)).with_schema_page_size(config.schema_page_size),
    );
    let base = overrides(&args)?;

    let requests = if args.sources.is_empty() {
        vec![build_request(config, &base, provisioner.resolver(), store.as_ref())?]
    } else {
        args.sources
            .iter()
            .map(|source| {
                let overrides = RequestOverrides {
                    source_file: Some(source.clone()),
                    ..base.clone()
                };
                build_request(config, &overrides, provisioner.resolver(), store.as_ref())
            })
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    let records = ProvisioningWorker::new(provisioner).run_batch(requests).await;
    println!("{}", formatter.format_records(&records)?);
    Ok(records.iter().all(|record| record.guard.is_success()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CliFormat, OperationArg};
    use ferry_catalog::registration::register_folder;
    use std::path::PathBuf;

    fn args() -> ProvisionArgs {
        ProvisionArgs {
            sources: Vec::new(),
            source_guid: None,
            destination: None,
            destination_guid: None,
            pattern: None,
            operation: None,
            no_lineage: false,
        }
    }

    #[test]
    fn test_overrides_from_args() {
        let args = ProvisionArgs {
            destination: Some(PathBuf::from("/out")),
            pattern: Some("{0}_{1}".to_string()),
            operation: Some(OperationArg::Move),
            no_lineage: true,
            ..args()
        };
        let overrides = overrides(&args).unwrap();
        assert_eq!(overrides.destination_directory, Some(PathBuf::from("/out")));
        assert_eq!(overrides.lineage, Some(false));
        assert_eq!(overrides.operation, Some(ferry_domain::FileOperation::Move));
    }

    #[test]
    fn test_lineage_flag_absent_keeps_config() {
        assert_eq!(overrides(&args()).unwrap().lineage, None);
    }

    #[test]
    fn test_invalid_guid() {
        let args = ProvisionArgs {
            source_guid: Some("not-an-id".to_string()),
            ..args()
        };
        assert!(matches!(overrides(&args), Err(CliError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_provision_several_sources() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "1").unwrap();
        std::fs::write(&b, "2").unwrap();
        let out = dir.path().join("out");

        let store = Arc::new(SqliteCatalog::new(":memory:").unwrap());
        let args = ProvisionArgs {
            sources: vec![a, b],
            destination: Some(out.clone()),
            ..args()
        };

        let ok = execute_provision(args, &ProvisionerConfig::default(), Arc::clone(&store), &Formatter::new(CliFormat::Json))
            .await
            .unwrap();
        assert!(ok);
        assert!(out.join("a.csv").exists());
        assert!(out.join("b.csv").exists());
    }

    #[tokio::test]
    async fn test_destination_guid() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.csv");
        std::fs::write(&source, "1").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();

        let store = Arc::new(SqliteCatalog::new(":memory:").unwrap());
        let folder = register_folder(store.as_ref(), &out).unwrap();
        let args = ProvisionArgs {
            sources: vec![source],
            destination_guid: Some(folder.to_string()),
            no_lineage: true,
            ..args()
        };

        let ok = execute_provision(args, &ProvisionerConfig::default(), store, &Formatter::new(CliFormat::Text))
            .await
            .unwrap();
        assert!(ok);
        assert!(out.join("a.csv").exists());
    }

    #[tokio::test]
    async fn test_missing_destination_is_error() {
        let store = Arc::new(SqliteCatalog::new(":memory:").unwrap());
        let args = ProvisionArgs {
            sources: vec![PathBuf::from("/in/a.csv")],
            ..args()
        };
        let result = execute_provision(args, &ProvisionerConfig::default(), store, &Formatter::new(CliFormat::Json)).await;
        assert!(matches!(result, Err(CliError::Provision(_))));
    }
}
