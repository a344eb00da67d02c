//! Core functionality for the commitment client
//! Contains hashing, canonical encoding, signing and bit-path primitives
//! shared by the tree and API crates.

pub mod bitstring;
pub mod codec;
pub mod errors;
pub mod hash;
pub mod signing;

pub use bitstring::{big_uint_from_bytes, big_uint_to_bytes, BitString};
pub use errors::{CodecError, CryptoError, HashError};
pub use hash::{DataHash, DataHasher, HashAlgorithm};
pub use signing::{Signature, Signer, SigningService};
