//! Error types for core primitives

use thiserror::Error;

/// Error types for hashing operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HashError {
    #[error("Unsupported hash algorithm identifier: {0}")]
    UnsupportedAlgorithm(u16),

    #[error("Imprint must have 2 bytes of algorithm and at least 1 byte of data")]
    InvalidImprint,

    #[error("Invalid hex encoding")]
    InvalidHex,
}

/// Error types for cryptographic operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Signature must contain 64 signature bytes and a recovery byte")]
    InvalidSignatureFormat,

    #[error("Invalid secret key")]
    InvalidSecretKey,

    #[error("Signing input must be a raw digest of supported width")]
    InvalidMessage,
}

/// Error types for the canonical structured encoding
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed encoding: {0}")]
    Malformed(String),

    #[error("Expected {expected}, found another data item")]
    UnexpectedItem { expected: &'static str },

    #[error("Expected a sequence of {expected} items, found {found}")]
    WrongArity { expected: usize, found: usize },
}
