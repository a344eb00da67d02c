//! Error types for the commitment layer

use thiserror::Error;

/// Error types for commitment construction and payload decoding
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ApiError {
    #[error("Authenticator and transaction hash must both be present or both be absent")]
    AuthenticatorMismatch,

    #[error("Malformed payload: {0}")]
    Decode(String),
}

impl From<commit_core::HashError> for ApiError {
    fn from(err: commit_core::HashError) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<commit_core::CodecError> for ApiError {
    fn from(err: commit_core::CodecError) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<commit_core::CryptoError> for ApiError {
    fn from(err: commit_core::CryptoError) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<commit_trees::TreeError> for ApiError {
    fn from(err: commit_trees::TreeError) -> Self {
        ApiError::Decode(err.to_string())
    }
}
