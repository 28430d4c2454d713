//! Host-side runtime helpers: layered configuration, logging setup, home
//! directory resolution and the database connection used by the server binary.

pub mod config;
pub mod db;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, AppConfig, AppConfigProvider, CliArgs, DatabaseConfig, LoggingConfig,
    Section, ServerConfig,
};
pub use db::{absolutize_sqlite_dsn, connect_database, detect_backend, Backend};
