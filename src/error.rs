//! Error types for Cloud Map target discovery

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A registry API call failed
    #[error("Registry {operation} failed: {message}")]
    RegistryError {
        operation: &'static str,
        message: String,
    },

    /// Filesystem error while persisting targets
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The output sink stopped accepting target group batches
    #[error("Target group sink closed")]
    SinkClosed,
}

impl Error {
    /// Build a registry error for the named API operation
    pub fn registry(operation: &'static str, message: impl ToString) -> Self {
        Error::RegistryError {
            operation,
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
