//! Error types for globalcal.

use thiserror::Error;

/// Errors that can occur in globalcal operations.
#[derive(Error, Debug)]
pub enum GlobalCalError {
    /// Invalid domain filter, missing or mistyped field mapping, invalid color.
    /// Fatal for the source it concerns: raised before any event is written.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single field value could not be read. Absorbed per record by the reconciler.
    #[error("Cannot resolve value of field '{field}': {reason}")]
    ValueResolution { field: String, reason: String },

    #[error("Source not found: {0}")]
    SourceNotFound(u64),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("There is already a calendar event for {model} record {record_id} (source {source_id})")]
    DuplicateEvent {
        model: String,
        record_id: i64,
        source_id: u64,
    },

    #[error("Calendar event not found: {0}")]
    EventNotFound(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GlobalCalError {
    pub fn value(field: &str, reason: impl Into<String>) -> Self {
        GlobalCalError::ValueResolution {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for globalcal operations.
pub type GlobalCalResult<T> = Result<T, GlobalCalError>;
