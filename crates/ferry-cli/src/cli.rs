//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use ferry_domain::FileOperation;
use std::path::PathBuf;

/// Ferry - provision files and record their lineage.
#[derive(Debug, Parser)]
#[command(name = "ferry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "json")]
    pub format: CliFormat,

    /// Configuration file path (defaults to ./ferry.toml when present)
    #[arg(short, long, global = true, env = "FERRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Metadata catalog database
    #[arg(long, global = true, env = "FERRY_CATALOG", default_value = "ferry-catalog.db")]
    pub catalog: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// JSON format (default)
    Json,
    /// One line per record
    Text,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy, move or delete files and record lineage
    Provision(ProvisionArgs),

    /// Manage the local metadata catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for the provision command.
#[derive(Debug, Parser)]
pub struct ProvisionArgs {
    /// Source files; several are provisioned concurrently
    pub sources: Vec<PathBuf>,

    /// Catalogued source file (element id)
    #[arg(long, conflicts_with = "sources")]
    pub source_guid: Option<String>,

    /// Destination folder
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Catalogued destination folder (element id)
    #[arg(long, conflicts_with = "destination")]
    pub destination_guid: Option<String>,

    /// Destination name pattern ({0} base name, {1} index)
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// File operation
    #[arg(short, long, value_enum)]
    pub operation: Option<OperationArg>,

    /// Do not record lineage
    #[arg(long)]
    pub no_lineage: bool,
}

/// File operation argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OperationArg {
    /// Copy the file
    Copy,
    /// Move the file
    Move,
    /// Delete the source file
    Delete,
}

impl From<OperationArg> for FileOperation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Copy => FileOperation::Copy,
            OperationArg::Move => FileOperation::Move,
            OperationArg::Delete => FileOperation::Delete,
        }
    }
}

/// Catalog subcommands.
#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// Catalogue files or folders
    Register(RegisterArgs),

    /// Show a catalogued element
    Show {
        /// Element id
        id: String,
    },
}

/// Arguments for catalog register.
#[derive(Debug, Parser)]
pub struct RegisterArgs {
    /// Files or folders to catalogue
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Column names to attach as a schema (files only)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,
}

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default configuration file
    Init {
        /// Where to write it
        #[arg(short, long, default_value = "ferry.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_command() {
        let cli = Cli::parse_from([
            "ferry",
            "provision",
            "/in/report.csv",
            "--destination",
            "/out",
            "--pattern",
            "{0}_{1}",
            "--operation",
            "move",
        ]);
        match cli.command {
            Command::Provision(args) => {
                assert_eq!(args.sources, vec![PathBuf::from("/in/report.csv")]);
                assert_eq!(args.destination, Some(PathBuf::from("/out")));
                assert_eq!(args.pattern.as_deref(), Some("{0}_{1}"));
                assert_eq!(args.operation, Some(OperationArg::Move));
                assert!(!args.no_lineage);
            }
            _ => panic!("Expected Provision command"),
        }
        assert_eq!(cli.format, CliFormat::Json);
    }

    #[test]
    fn test_source_guid_conflicts_with_paths() {
        let result = Cli::try_parse_from([
            "ferry",
            "provision",
            "/in/a.csv",
            "--source-guid",
            "0192f1a0-0000-7000-8000-000000000000",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_register_columns() {
        let cli = Cli::parse_from(["ferry", "catalog", "register", "/in/a.csv", "--columns", "id,name,total"]);
        match cli.command {
            Command::Catalog(CatalogCommand::Register(args)) => {
                assert_eq!(args.columns, vec!["id", "name", "total"]);
            }
            _ => panic!("Expected catalog register"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["ferry", "-vv", "--format", "text", "config", "show"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, CliFormat::Text);
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Show)));
    }

    #[test]
    fn test_operation_conversion() {
        let op: FileOperation = OperationArg::Delete.into();
        assert_eq!(op, FileOperation::Delete);
    }
}
