//! Error types for config loading and validation.

use crate::schema::ValidationError;
use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A caller transform returned something other than `false` or `{ key, value }`.
    #[error(
        "Invalid transform result for key \"{key}\": expected {{ key: string, value: unknown }} or false, received: {received}"
    )]
    TransformContractViolation { key: String, received: String },
    /// Nesting separator expansion found a path that is both a leaf and an object.
    #[error("Nested key conflict: {0}")]
    NestedKeyConflict(String),
    /// The merged config failed schema validation.
    #[error("invalid config: {0}")]
    Validation(#[from] ValidationError),
    /// A deferred adapter was handed to the synchronous loader.
    #[error(
        "Data returned from {adapter} is deferred. Use load_config instead of load_config_sync to use asynchronous adapters."
    )]
    SyncAdapterMisuse { adapter: String },
    /// Two adapter specifiers claim the same file extension.
    #[error(
        "Ambiguous adapter mapping for file extension {extension} - please ensure file extensions are specified at most once across all adapter specifiers."
    )]
    AmbiguousExtension { extension: String },
    /// A directory adapter was constructed with unusable arguments.
    #[error("invalid directory adapter: {0}")]
    DirectoryScan(String),
    /// Converting the validated value into a typed config failed.
    #[error("failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure of a single adapter read.
///
/// The loader logs these (unless the adapter is silenced) and carries on with
/// an empty contribution, so the message is all that is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
}

impl AdapterError {
    /// Create an adapter error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Message describing the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for AdapterError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for AdapterError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
