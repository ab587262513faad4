//! Ferry CLI - provision files and record their lineage.

use clap::Parser;
use ferry_catalog::SqliteCatalog;
use ferry_cli::commands;
use ferry_cli::{Cli, Command, Formatter};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing (log to stderr, RUST_LOG wins over -v)
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> ferry_cli::Result<bool> {
    let config = commands::load_config(cli.config.as_deref())?;
    let formatter = Formatter::new(cli.format);

    match cli.command {
        Command::Config(command) => {
            commands::execute_config(command, &config)?;
            Ok(true)
        }
        Command::Catalog(command) => {
            let store = SqliteCatalog::new(&cli.catalog)?;
            commands::execute_catalog(command, &store, &formatter)?;
            Ok(true)
        }
        Command::Provision(args) => {
            let store = Arc::new(SqliteCatalog::new(&cli.catalog)?);
            commands::execute_provision(args, &config, store, &formatter).await
        }
    }
}
