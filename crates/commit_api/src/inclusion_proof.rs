//! Inclusion proof verification against a published commitment root

use crate::authenticator::{Authenticator, AuthenticatorDto};
use crate::errors::ApiError;
use crate::leaf_value::LeafValue;
use crate::request_id::RequestId;
use commit_core::{codec, DataHash};
use commit_trees::smt::{MerkleTreePath, MerkleTreePathDto};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Verdict of verifying an inclusion proof.
///
/// These are ordinary outcomes, not errors: an absent or forged leaf is
/// expected business behavior a caller has to handle in-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionProofVerificationStatus {
    /// Signature verification failed
    NotAuthenticated,
    /// The tree routes the request to a different leaf or to no leaf
    PathNotIncluded,
    /// The steps do not re-derive the claimed root
    PathInvalid,
    /// Valid inclusion proof for the request
    Ok,
}

/// A tree path together with the commitment it claims to include.
///
/// The authenticator and transaction hash are either both present,
/// claiming inclusion of a specific commitment, or both absent,
/// claiming non-inclusion. Any other combination is a construction
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    merkle_tree_path: MerkleTreePath,
    authenticator: Option<Authenticator>,
    transaction_hash: Option<DataHash>,
}

impl InclusionProof {
    pub fn new(
        merkle_tree_path: MerkleTreePath,
        authenticator: Option<Authenticator>,
        transaction_hash: Option<DataHash>,
    ) -> Result<Self, ApiError> {
        if authenticator.is_some() != transaction_hash.is_some() {
            return Err(ApiError::AuthenticatorMismatch);
        }

        Ok(Self {
            merkle_tree_path,
            authenticator,
            transaction_hash,
        })
    }

    pub fn merkle_tree_path(&self) -> &MerkleTreePath {
        &self.merkle_tree_path
    }

    pub fn authenticator(&self) -> Option<&Authenticator> {
        self.authenticator.as_ref()
    }

    pub fn transaction_hash(&self) -> Option<&DataHash> {
        self.transaction_hash.as_ref()
    }

    /// Verifies the proof for the given request id.
    ///
    /// For an inclusion claim the signature is checked first, then the
    /// committed leaf value, then the tree path; a non-inclusion claim
    /// goes straight to the tree path.
    pub fn verify(&self, request_id: &RequestId) -> InclusionProofVerificationStatus {
        let status = self.verify_inner(request_id);
        debug!(request_id = %request_id.to_hex(), ?status, "inclusion proof verified");
        status
    }

    fn verify_inner(&self, request_id: &RequestId) -> InclusionProofVerificationStatus {
        if let (Some(authenticator), Some(transaction_hash)) = (&self.authenticator, &self.transaction_hash) {
            if !authenticator.verify(transaction_hash) {
                return InclusionProofVerificationStatus::NotAuthenticated;
            }

            // The committed leaf value must match the deepest step
            let leaf_value = LeafValue::create(authenticator, transaction_hash);
            let committed = self
                .merkle_tree_path
                .steps
                .first()
                .and_then(|step| step.branch.as_ref())
                .and_then(|branch| branch.value.as_deref());
            if committed != Some(leaf_value.bytes()) {
                return InclusionProofVerificationStatus::PathNotIncluded;
            }
        }

        let result = self.merkle_tree_path.verify(&request_id.to_big_uint());
        if !result.is_path_valid {
            return InclusionProofVerificationStatus::PathInvalid;
        }
        if !result.is_path_included {
            return InclusionProofVerificationStatus::PathNotIncluded;
        }

        InclusionProofVerificationStatus::Ok
    }

    /// Convert to the JSON-facing form
    pub fn to_dto(&self) -> InclusionProofDto {
        InclusionProofDto {
            merkle_tree_path: self.merkle_tree_path.to_dto(),
            authenticator: self.authenticator.as_ref().map(Authenticator::to_dto),
            transaction_hash: self.transaction_hash.as_ref().map(DataHash::to_hex),
        }
    }

    /// Parse the JSON-facing form, enforcing the presence invariant
    pub fn from_dto(dto: &InclusionProofDto) -> Result<Self, ApiError> {
        let authenticator = dto.authenticator.as_ref().map(Authenticator::from_dto).transpose()?;
        let transaction_hash = dto
            .transaction_hash
            .as_deref()
            .map(DataHash::from_hex)
            .transpose()?;

        Self::new(MerkleTreePath::from_dto(&dto.merkle_tree_path)?, authenticator, transaction_hash)
    }

    /// Canonical binary form:
    /// `[merkle tree path, authenticator | null, transaction hash | null]`
    pub fn to_cbor(&self) -> Vec<u8> {
        codec::encode(&codec::array(vec![
            codec::byte_string(&self.merkle_tree_path.to_cbor()),
            codec::optional(self.authenticator.as_ref(), |a| codec::byte_string(&a.to_cbor())),
            codec::optional(self.transaction_hash.as_ref(), |t| codec::byte_string(&t.imprint())),
        ]))
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, ApiError> {
        let value = codec::decode(bytes)?;
        let items = codec::expect_array(&value, 3)?;

        let merkle_tree_path = MerkleTreePath::from_cbor(codec::expect_bytes(&items[0])?)?;
        let authenticator = codec::expect_optional(&items[1], codec::expect_bytes)?
            .map(Authenticator::from_cbor)
            .transpose()?;
        let transaction_hash = codec::expect_optional(&items[2], codec::expect_bytes)?
            .map(DataHash::from_imprint)
            .transpose()?;

        Self::new(merkle_tree_path, authenticator, transaction_hash)
    }
}

/// JSON-facing form of an inclusion proof
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProofDto {
    pub merkle_tree_path: MerkleTreePathDto,
    pub authenticator: Option<AuthenticatorDto>,
    pub transaction_hash: Option<String>,
}
