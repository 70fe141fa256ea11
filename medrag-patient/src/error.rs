//! Error types for the `medrag-patient` crate.

use thiserror::Error;

/// Errors that can occur in patient record storage.
#[derive(Debug, Error)]
pub enum PatientError {
    /// A patient with this ID already exists.
    #[error("patient '{0}' already exists")]
    DuplicateId(String),

    /// No patient with this ID is on record.
    #[error("patient '{0}' not found")]
    NotFound(String),

    /// The store file could not be read or written.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file holds malformed JSON.
    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// A convenience result type for patient store operations.
pub type Result<T> = std::result::Result<T, PatientError>;
