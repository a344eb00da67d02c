//! Submission identifier doubling as the tree address

use crate::errors::ApiError;
use commit_core::bitstring::BitString;
use commit_core::{codec, DataHash, DataHasher, HashAlgorithm};
use num_bigint::BigUint;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Hash of a requester's public key and prior state hash.
///
/// The same value identifies the submission towards the aggregator and
/// addresses the commitment leaf in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(DataHash);

impl RequestId {
    /// `H(public key, state hash imprint)`
    pub fn create(public_key: &[u8], state_hash: &DataHash) -> Self {
        let hash = DataHasher::new(HashAlgorithm::Sha256)
            .update(public_key)
            .update(&state_hash.imprint())
            .finalize();

        Self(hash)
    }

    pub fn from_hash(hash: DataHash) -> Self {
        Self(hash)
    }

    pub fn hash(&self) -> &DataHash {
        &self.0
    }

    /// The tree address: the imprint reinterpreted as a
    /// sentinel-prefixed bit string
    pub fn to_big_uint(&self) -> BigUint {
        BitString::new(&self.0.imprint()).to_big_uint()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn from_hex(text: &str) -> Result<Self, ApiError> {
        Ok(Self(DataHash::from_hex(text)?))
    }

    pub fn to_cbor(&self) -> Vec<u8> {
        codec::encode(&codec::byte_string(&self.0.imprint()))
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, ApiError> {
        let value = codec::decode(bytes)?;
        Ok(Self(DataHash::from_imprint(codec::expect_bytes(&value)?)?))
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        RequestId::from_hex(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_hash() -> DataHash {
        DataHasher::new(HashAlgorithm::Sha256).update(b"state").finalize()
    }

    #[test]
    fn test_create_is_deterministic() {
        let a = RequestId::create(&[1u8; 33], &state_hash());
        let b = RequestId::create(&[1u8; 33], &state_hash());
        let c = RequestId::create(&[2u8; 33], &state_hash());

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_tree_address_has_sentinel() {
        let request_id = RequestId::create(&[1u8; 33], &state_hash());
        let address = request_id.to_big_uint();

        // 34 imprint bytes below a single sentinel bit
        assert_eq!(address.bits(), 34 * 8 + 1);
    }

    #[test]
    fn test_hex_and_cbor_roundtrip() {
        let request_id = RequestId::create(&[7u8; 33], &state_hash());

        assert_eq!(RequestId::from_hex(&request_id.to_hex()).unwrap(), request_id);
        assert_eq!(RequestId::from_cbor(&request_id.to_cbor()).unwrap(), request_id);
    }

    #[test]
    fn test_json_form_is_hex_imprint() {
        let request_id = RequestId::create(&[7u8; 33], &state_hash());
        let json = serde_json::to_string(&request_id).unwrap();
        assert_eq!(json, format!("\"{}\"", request_id.to_hex()));

        let restored: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(request_id, restored);
    }
}
