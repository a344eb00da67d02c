//! Commitment payload ready for submission

use crate::authenticator::Authenticator;
use crate::leaf_value::LeafValue;
use commit_core::DataHash;

/// An authenticator and transaction hash with their derived leaf value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    authenticator: Authenticator,
    transaction_hash: DataHash,
    leaf_value: LeafValue,
}

impl Transaction {
    pub fn create(authenticator: Authenticator, transaction_hash: DataHash) -> Self {
        let leaf_value = LeafValue::create(&authenticator, &transaction_hash);

        Self {
            authenticator,
            transaction_hash,
            leaf_value,
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn transaction_hash(&self) -> &DataHash {
        &self.transaction_hash
    }

    /// The value committed under the request's tree address
    pub fn leaf_value(&self) -> &LeafValue {
        &self.leaf_value
    }
}
