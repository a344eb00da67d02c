//! Algorithm-tagged hashing primitives

use crate::errors::HashError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;

/// Supported digest algorithms with their stable 2-byte identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha224,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Stable identifier carried in the first two bytes of an imprint
    pub fn id(&self) -> u16 {
        match self {
            HashAlgorithm::Sha256 => 0,
            HashAlgorithm::Sha224 => 1,
            HashAlgorithm::Sha384 => 2,
            HashAlgorithm::Sha512 => 3,
        }
    }

    /// Resolve an identifier back to an algorithm
    pub fn from_id(id: u16) -> Result<Self, HashError> {
        match id {
            0 => Ok(HashAlgorithm::Sha256),
            1 => Ok(HashAlgorithm::Sha224),
            2 => Ok(HashAlgorithm::Sha384),
            3 => Ok(HashAlgorithm::Sha512),
            other => Err(HashError::UnsupportedAlgorithm(other)),
        }
    }

    /// Canonical algorithm name
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha224 => "SHA-224",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable digest tagged with the algorithm that produced it.
///
/// The wire form is the imprint: two big-endian bytes of algorithm
/// identifier followed by the raw digest bytes. The imprint is used for
/// equality, JSON and CBOR; signing uses the raw `data` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataHash {
    algorithm: HashAlgorithm,
    data: Vec<u8>,
}

impl DataHash {
    pub fn new(algorithm: HashAlgorithm, data: Vec<u8>) -> Self {
        Self { algorithm, data }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes without the algorithm tag
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Algorithm identifier followed by the digest bytes
    pub fn imprint(&self) -> Vec<u8> {
        let id = self.algorithm.id();
        let mut imprint = Vec::with_capacity(self.data.len() + 2);
        imprint.push((id >> 8) as u8);
        imprint.push((id & 0xff) as u8);
        imprint.extend_from_slice(&self.data);
        imprint
    }

    /// Parse an imprint back into a tagged digest
    pub fn from_imprint(imprint: &[u8]) -> Result<Self, HashError> {
        if imprint.len() < 3 {
            return Err(HashError::InvalidImprint);
        }

        let id = ((imprint[0] as u16) << 8) | imprint[1] as u16;
        Ok(Self {
            algorithm: HashAlgorithm::from_id(id)?,
            data: imprint[2..].to_vec(),
        })
    }

    /// Lowercase hex of the imprint, the JSON wire form
    pub fn to_hex(&self) -> String {
        hex::encode(self.imprint())
    }

    pub fn from_hex(text: &str) -> Result<Self, HashError> {
        let bytes = hex::decode(text).map_err(|_| HashError::InvalidHex)?;
        Self::from_imprint(&bytes)
    }
}

impl fmt::Display for DataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.algorithm, hex::encode(&self.data))
    }
}

impl Serialize for DataHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DataHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        DataHash::from_hex(&text).map_err(D::Error::custom)
    }
}

enum Inner {
    Sha256(Sha256),
    Sha224(Sha224),
    Sha384(Sha384),
    Sha512(Sha512),
}

/// Streaming hasher producing algorithm-tagged digests
pub struct DataHasher {
    algorithm: HashAlgorithm,
    inner: Inner,
}

impl DataHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let inner = match algorithm {
            HashAlgorithm::Sha256 => Inner::Sha256(Sha256::new()),
            HashAlgorithm::Sha224 => Inner::Sha224(Sha224::new()),
            HashAlgorithm::Sha384 => Inner::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => Inner::Sha512(Sha512::new()),
        };

        Self { algorithm, inner }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Add data for hashing
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        match &mut self.inner {
            Inner::Sha256(d) => d.update(data),
            Inner::Sha224(d) => d.update(data),
            Inner::Sha384(d) => d.update(data),
            Inner::Sha512(d) => d.update(data),
        }
        self
    }

    /// Produce the digest and reset the hasher state
    pub fn finalize(&mut self) -> DataHash {
        let data = match &mut self.inner {
            Inner::Sha256(d) => d.finalize_reset().to_vec(),
            Inner::Sha224(d) => d.finalize_reset().to_vec(),
            Inner::Sha384(d) => d.finalize_reset().to_vec(),
            Inner::Sha512(d) => d.finalize_reset().to_vec(),
        };

        DataHash::new(self.algorithm, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        let hash = DataHasher::new(HashAlgorithm::Sha256).update(b"abc").finalize();
        assert_eq!(
            hex::encode(hash.data()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hash.to_hex(),
            "0000ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_incremental_update_matches_single_update() {
        let split = DataHasher::new(HashAlgorithm::Sha256)
            .update(b"hello ")
            .update(b"world")
            .finalize();
        let whole = DataHasher::new(HashAlgorithm::Sha256).update(b"hello world").finalize();
        assert_eq!(split, whole);
    }

    #[test]
    fn test_imprint_roundtrip() {
        let hash = DataHasher::new(HashAlgorithm::Sha512).update(b"payload").finalize();
        let restored = DataHash::from_imprint(&hash.imprint()).unwrap();
        assert_eq!(hash, restored);
        assert_eq!(restored.algorithm(), HashAlgorithm::Sha512);
    }

    #[test]
    fn test_invalid_imprints() {
        assert_eq!(DataHash::from_imprint(&[0, 0]), Err(HashError::InvalidImprint));
        assert_eq!(
            DataHash::from_imprint(&[0xff, 0xff, 1]),
            Err(HashError::UnsupportedAlgorithm(0xffff))
        );
    }

    #[test]
    fn test_json_form_is_hex_imprint() {
        let hash = DataHasher::new(HashAlgorithm::Sha256).update(b"abc").finalize();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(
            json,
            "\"0000ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\""
        );
        let restored: DataHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, restored);
    }
}
