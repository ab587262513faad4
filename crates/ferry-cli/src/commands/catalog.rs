//! Catalog command implementation.

use crate::cli::{CatalogCommand, RegisterArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use ferry_catalog::registration::{attach_schema, register_file, register_folder};
use ferry_catalog::SqliteCatalog;
use ferry_domain::{ElementId, MetadataStore};
use std::path::PathBuf;

/// Execute a catalog subcommand.
pub fn execute_catalog(command: CatalogCommand, store: &SqliteCatalog, formatter: &Formatter) -> Result<()> {
    match command {
        CatalogCommand::Register(args) => {
            let registered = register(args, store)?;
            println!("{}", formatter.format_registered(&registered)?);
        }
        CatalogCommand::Show { id } => {
            let id = ElementId::from_string(&id)
                .map_err(|e| CliError::InvalidInput(format!("Invalid element id '{}': {}", id, e)))?;
            let element = store
                .get_element(id)?
                .ok_or_else(|| CliError::InvalidInput(format!("No element with id {}", id)))?;
            println!("{}", formatter.format_element(&element)?);
        }
    }
    Ok(())
}

fn register(args: RegisterArgs, store: &SqliteCatalog) -> Result<Vec<(PathBuf, ElementId)>> {
    let columns: Vec<&str> = args.columns.iter().map(String::as_str).collect();
    let mut registered = Vec::with_capacity(args.paths.len());

    for path in args.paths {
        let path = std::path::absolute(&path)?;
        let id = if path.is_dir() {
            register_folder(store, &path)?
        } else {
            let id = register_file(store, &path)?;
            if !columns.is_empty() {
                attach_schema(store, id, &columns)?;
            }
            id
        };
        registered.push((path, id));
    }
    Ok(registered)
}
