//! ECDSA signing service over secp256k1

use crate::errors::CryptoError;
use crate::hash::{DataHash, DataHasher, HashAlgorithm};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// Signing capability consumed by the commitment layer
pub trait Signer {
    /// Compressed public key bytes
    fn public_key(&self) -> Vec<u8>;

    /// Signature algorithm name
    fn algorithm(&self) -> &str;

    /// Sign a digest; the raw digest bytes are signed, never the imprint
    fn sign(&self, hash: &DataHash) -> Result<Signature, CryptoError>;
}

/// Compact ECDSA signature with its recovery id.
///
/// The wire form is 65 bytes: r and s followed by the recovery byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; 64],
    recovery: u8,
}

impl Signature {
    pub fn new(bytes: [u8; 64], recovery: u8) -> Self {
        Self { bytes, recovery }
    }

    /// The 64 compact signature bytes
    pub fn bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    pub fn recovery(&self) -> u8 {
        self.recovery
    }

    /// Serialize to the 65-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&self.bytes);
        out.push(self.recovery);
        out
    }

    /// Parse the 65-byte wire form
    pub fn from_bytes(data: &[u8]) -> Result<Self, CryptoError> {
        if data.len() != 65 {
            return Err(CryptoError::InvalidSignatureFormat);
        }

        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&data[..64]);
        Ok(Self {
            bytes,
            recovery: data[64],
        })
    }
}

/// Default signing service backed by a secp256k1 secret key
pub struct SigningService {
    secp: Secp256k1<secp256k1::All>,
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl SigningService {
    /// Create a signing service from raw secret key bytes
    pub fn new(secret: &[u8]) -> Result<Self, CryptoError> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(secret).map_err(|_| CryptoError::InvalidSecretKey)?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        Ok(Self {
            secp,
            secret_key,
            public_key,
        })
    }

    /// Create a signing service with a freshly generated secret key
    pub fn random() -> Self {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::new(&mut rand::thread_rng());
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        Self {
            secp,
            secret_key,
            public_key,
        }
    }

    /// Derive a signing service from a secret and an optional nonce
    pub fn from_secret(secret: &[u8], nonce: Option<&[u8]>) -> Result<Self, CryptoError> {
        let mut hasher = DataHasher::new(HashAlgorithm::Sha256);
        hasher.update(secret);
        if let Some(nonce) = nonce {
            hasher.update(nonce);
        }

        Self::new(hasher.finalize().data())
    }

    /// Verify a wire-form signature against a digest and a compressed public key
    pub fn verify_with_public_key(hash: &DataHash, signature: &[u8], public_key: &[u8]) -> bool {
        if signature.len() < 64 {
            return false;
        }

        let secp = Secp256k1::verification_only();
        let signature = match secp256k1::ecdsa::Signature::from_compact(&signature[..64]) {
            Ok(s) => s,
            Err(_) => return false,
        };
        let public_key = match PublicKey::from_slice(public_key) {
            Ok(k) => k,
            Err(_) => return false,
        };
        let message = match Message::from_slice(hash.data()) {
            Ok(m) => m,
            Err(_) => return false,
        };

        secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
    }

    /// Verify a signature by recovering the public key from it
    pub fn verify_with_recovered_key(hash: &DataHash, signature: &Signature) -> Result<bool, CryptoError> {
        let secp = Secp256k1::new();
        let recovery =
            RecoveryId::from_i32(signature.recovery() as i32).map_err(|_| CryptoError::InvalidSignatureFormat)?;
        let recoverable = RecoverableSignature::from_compact(signature.bytes(), recovery)
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;
        let message = Message::from_slice(hash.data()).map_err(|_| CryptoError::InvalidMessage)?;
        let public_key = secp
            .recover_ecdsa(&message, &recoverable)
            .map_err(|_| CryptoError::InvalidSignature)?;

        Ok(Self::verify_with_public_key(
            hash,
            &signature.to_bytes(),
            &public_key.serialize(),
        ))
    }

    /// Verify a signature against this service's own public key
    pub fn verify(&self, hash: &DataHash, signature: &Signature) -> bool {
        Self::verify_with_public_key(hash, &signature.to_bytes(), &self.public_key.serialize())
    }
}

impl Signer for SigningService {
    fn public_key(&self) -> Vec<u8> {
        self.public_key.serialize().to_vec()
    }

    fn algorithm(&self) -> &str {
        "secp256k1"
    }

    fn sign(&self, hash: &DataHash) -> Result<Signature, CryptoError> {
        let message = Message::from_slice(hash.data()).map_err(|_| CryptoError::InvalidMessage)?;
        let signature = self.secp.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery, bytes) = signature.serialize_compact();

        Ok(Signature::new(bytes, recovery.to_i32() as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(data: &[u8]) -> DataHash {
        DataHasher::new(HashAlgorithm::Sha256).update(data).finalize()
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let service = SigningService::random();
        let hash = digest(b"state transition");
        let signature = service.sign(&hash).expect("signing should succeed");

        assert!(service.verify(&hash, &signature));
        assert!(SigningService::verify_with_public_key(
            &hash,
            &signature.to_bytes(),
            &service.public_key()
        ));
    }

    #[test]
    fn test_tampered_digest_fails() {
        let service = SigningService::random();
        let signature = service.sign(&digest(b"original")).unwrap();
        assert!(!service.verify(&digest(b"tampered"), &signature));
    }

    #[test]
    fn test_recovered_key_verification() {
        let service = SigningService::random();
        let hash = digest(b"recoverable");
        let signature = service.sign(&hash).unwrap();
        assert!(SigningService::verify_with_recovered_key(&hash, &signature).unwrap());
    }

    #[test]
    fn test_wire_form_roundtrip() {
        let service = SigningService::random();
        let signature = service.sign(&digest(b"wire")).unwrap();
        let bytes = signature.to_bytes();
        assert_eq!(bytes.len(), 65);
        assert_eq!(Signature::from_bytes(&bytes).unwrap(), signature);
        assert_eq!(
            Signature::from_bytes(&bytes[..64]),
            Err(CryptoError::InvalidSignatureFormat)
        );
    }

    #[test]
    fn test_deterministic_key_from_secret() {
        let a = SigningService::from_secret(b"secret", Some(b"nonce")).unwrap();
        let b = SigningService::from_secret(b"secret", Some(b"nonce")).unwrap();
        let c = SigningService::from_secret(b"secret", None).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.public_key(), c.public_key());
    }

    #[test]
    fn test_rejects_non_digest_input() {
        let service = SigningService::random();
        let short = DataHash::new(HashAlgorithm::Sha256, vec![1, 2, 3]);
        assert_eq!(service.sign(&short), Err(CryptoError::InvalidMessage));
    }
}
