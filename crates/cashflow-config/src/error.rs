use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),

    #[error("Configuration backup not found: {0}")]
    BackupNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
