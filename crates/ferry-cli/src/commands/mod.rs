//! Command implementations.

pub mod catalog;
pub mod config;
pub mod provision;

pub use self::catalog::execute_catalog;
pub use self::config::{execute_config, load_config};
pub use self::provision::execute_provision;
