//! Committed value stored under a request's tree address

use crate::authenticator::Authenticator;
use commit_core::{DataHash, DataHasher, HashAlgorithm};

/// The leaf value of a commitment:
/// `H(authenticator, transaction hash imprint)`, carried as an imprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafValue(Vec<u8>);

impl LeafValue {
    pub fn create(authenticator: &Authenticator, transaction_hash: &DataHash) -> Self {
        let hash = DataHasher::new(HashAlgorithm::Sha256)
            .update(&authenticator.to_cbor())
            .update(&transaction_hash.imprint())
            .finalize();

        Self(hash.imprint())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Compare against raw bytes taken from a proof step
    pub fn matches(&self, data: &[u8]) -> bool {
        self.0 == data
    }
}
