//! Application configuration
//!
//! Loaded once at process start and handed to each service explicitly.

mod settings;

pub use settings::{
    AppConfig, ConfigError, MediaConfig, ServerConfig, SmtpConfig, SmtpSecurity, StorageConfig,
    CONFIG_FILE_VAR,
};
