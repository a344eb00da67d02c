//! Signature binding a state transition to its prior state

use crate::errors::ApiError;
use commit_core::{codec, CryptoError, DataHash, Signature, Signer, SigningService};
use serde::{Deserialize, Serialize};

/// A signature over a transaction hash, bound to a prior state hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticator {
    public_key: Vec<u8>,
    algorithm: String,
    signature: Signature,
    state_hash: DataHash,
}

impl Authenticator {
    pub fn new(public_key: Vec<u8>, algorithm: String, signature: Signature, state_hash: DataHash) -> Self {
        Self {
            public_key,
            algorithm,
            signature,
            state_hash,
        }
    }

    /// Signs the transaction hash with the given signer
    pub fn create(signer: &impl Signer, transaction_hash: &DataHash, state_hash: DataHash) -> Result<Self, CryptoError> {
        Ok(Self {
            public_key: signer.public_key(),
            algorithm: signer.algorithm().to_string(),
            signature: signer.sign(transaction_hash)?,
            state_hash,
        })
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn state_hash(&self) -> &DataHash {
        &self.state_hash
    }

    /// Checks the signature against the given transaction hash
    pub fn verify(&self, transaction_hash: &DataHash) -> bool {
        SigningService::verify_with_public_key(transaction_hash, &self.signature.to_bytes(), &self.public_key)
    }

    /// Canonical binary form:
    /// `[algorithm, public key, signature, state hash imprint]`
    pub fn to_cbor(&self) -> Vec<u8> {
        codec::encode(&codec::array(vec![
            codec::text_string(&self.algorithm),
            codec::byte_string(&self.public_key),
            codec::byte_string(&self.signature.to_bytes()),
            codec::byte_string(&self.state_hash.imprint()),
        ]))
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, ApiError> {
        let value = codec::decode(bytes)?;
        let items = codec::expect_array(&value, 4)?;

        Ok(Self {
            algorithm: codec::expect_text(&items[0])?.to_string(),
            public_key: codec::expect_bytes(&items[1])?.to_vec(),
            signature: Signature::from_bytes(codec::expect_bytes(&items[2])?)?,
            state_hash: DataHash::from_imprint(codec::expect_bytes(&items[3])?)?,
        })
    }

    /// Convert to the JSON-facing form
    pub fn to_dto(&self) -> AuthenticatorDto {
        AuthenticatorDto {
            public_key: hex::encode(&self.public_key),
            algorithm: self.algorithm.clone(),
            signature: hex::encode(self.signature.to_bytes()),
            state_hash: self.state_hash.to_hex(),
        }
    }

    /// Parse the JSON-facing form
    pub fn from_dto(dto: &AuthenticatorDto) -> Result<Self, ApiError> {
        Ok(Self {
            public_key: hex::decode(&dto.public_key).map_err(|e| ApiError::Decode(e.to_string()))?,
            algorithm: dto.algorithm.clone(),
            signature: Signature::from_bytes(
                &hex::decode(&dto.signature).map_err(|e| ApiError::Decode(e.to_string()))?,
            )?,
            state_hash: DataHash::from_hex(&dto.state_hash)?,
        })
    }
}

/// JSON-facing form of an authenticator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorDto {
    pub public_key: String,
    pub algorithm: String,
    pub signature: String,
    pub state_hash: String,
}
