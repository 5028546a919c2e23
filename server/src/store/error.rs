//! Record store error types.

use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded into its domain type.
    #[error("Corrupt value in column {column}: {value}")]
    CorruptValue { column: &'static str, value: String },

    /// The connection string names a backend we do not support.
    #[error("Unsupported database url: {0}")]
    UnsupportedUrl(String),
}

impl StoreError {
    pub fn corrupt(column: &'static str, value: impl Into<String>) -> Self {
        Self::CorruptValue {
            column,
            value: value.into(),
        }
    }

    /// True when the error is a unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;
