//! Config command implementation and configuration loading.

use crate::cli::ConfigCommand;
use crate::error::{CliError, Result};
use ferry_provision::ProvisionerConfig;
use std::fs;
use std::path::Path;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ferry.toml";

/// Load the configuration from `path`, or from ./ferry.toml, or use defaults.
pub fn load_config(path: Option<&Path>) -> Result<ProvisionerConfig> {
    match path {
        Some(path) => Ok(ProvisionerConfig::from_file(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Ok(ProvisionerConfig::from_file(DEFAULT_CONFIG_FILE)?)
        }
        None => {
            tracing::debug!("no configuration file; using defaults");
            Ok(ProvisionerConfig::default())
        }
    }
}

/// Execute a config subcommand.
pub fn execute_config(command: ConfigCommand, config: &ProvisionerConfig) -> Result<()> {
    match command {
        ConfigCommand::Init { output, force } => {
            if output.exists() && !force {
                return Err(CliError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    output.display()
                )));
            }
            fs::write(&output, ProvisionerConfig::default().to_toml()?)?;
            println!("Wrote {}", output.display());
        }
        ConfigCommand::Show => {
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ferry.toml");

        execute_config(
            ConfigCommand::Init { output: output.clone(), force: false },
            &ProvisionerConfig::default(),
        )
        .unwrap();

        let loaded = load_config(Some(&output)).unwrap();
        assert_eq!(loaded, ProvisionerConfig::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ferry.toml");
        fs::write(&output, "lineage = false\n").unwrap();

        let result = execute_config(
            ConfigCommand::Init { output: output.clone(), force: false },
            &ProvisionerConfig::default(),
        );
        assert!(matches!(result, Err(CliError::Config(_))));
        assert_eq!(fs::read_to_string(&output).unwrap(), "lineage = false\n");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "operation = \"shred\"\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
