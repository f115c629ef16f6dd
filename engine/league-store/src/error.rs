//! Error types for the league store

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the league store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// I/O errors (seed files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A row from the external store failed boundary validation
    #[error("Invalid {entity} row: {message}")]
    InvalidRow { entity: &'static str, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("Store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Create a new invalid row error
    pub fn invalid_row(entity: &'static str, msg: impl Into<String>) -> Self {
        Self::InvalidRow { entity, message: msg.into() }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
