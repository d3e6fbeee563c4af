//! Process-level plumbing shared by the server binary: layered configuration
//! and logging bootstrap.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, CliArgs, DatabaseConfig, Environment, LoggingConfig, Section, ServerConfig};
pub use logging::init_logging_from_config;
