//! Error types for stitch-watch.
//!
//! Every variant is fatal for the current run: the pipelines propagate with
//! `?` and the binary reports and exits non-zero.

use reqwest::StatusCode;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Data store errors, for both the LIMS and the counter store.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_) => DatabaseError::Connection(e.to_string()),
            other => DatabaseError::Query(other.to_string()),
        }
    }
}

/// Malformed identifiers and fields.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Source name {name:?} is shorter than {min} characters")]
    TooShort { name: String, min: usize },

    #[error("Source name {name:?} has non-numeric workflow id {field:?}")]
    NonNumeric { name: String, field: String },

    #[error("Invalid timestamp in {column}: {value:?}")]
    Timestamp { column: String, value: String },
}

/// Strain table lookups.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("No variant registered for plate code {code:?}")]
    VariantNotFound { code: String },
}

/// Notification channel errors.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Request to {channel} failed: {reason}")]
    Request { channel: String, reason: String },

    #[error("{channel} rejected the message ({status}): {body}")]
    Rejected {
        channel: String,
        status: StatusCode,
        body: String,
    },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
