//! Error types for tree operations

use thiserror::Error;

/// Error types for tree construction and proof decoding
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("Path must be greater than 0")]
    PathOutOfRange,

    #[error("Cannot add leaf inside branch")]
    LeafInBranch,

    #[error("Cannot extend tree through leaf")]
    LeafOutOfBounds,

    #[error("Malformed tree path: {0}")]
    Decode(String),
}

impl From<commit_core::CodecError> for TreeError {
    fn from(err: commit_core::CodecError) -> Self {
        TreeError::Decode(err.to_string())
    }
}

impl From<commit_core::HashError> for TreeError {
    fn from(err: commit_core::HashError) -> Self {
        TreeError::Decode(err.to_string())
    }
}
