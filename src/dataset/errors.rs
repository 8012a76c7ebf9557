//! Dataset catalog errors

use thiserror::Error;

/// Result type for catalog operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors raised by the dataset catalog
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatasetError {
    /// Id contains an underscore or is blank
    #[error("invalid dataset id: '{0}'")]
    InvalidId(String),

    /// A dataset with this id is already loaded
    #[error("dataset '{0}' already exists")]
    AlreadyExists(String),

    /// No dataset with this id is loaded
    #[error("dataset '{0}' not found")]
    NotFound(String),

    /// The record payload did not deserialize into the declared kind
    #[error("invalid records for kind '{kind}': {reason}")]
    InvalidRecords { kind: String, reason: String },
}
