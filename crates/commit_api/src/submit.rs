//! Request and response payloads exchanged with the aggregator
//!
//! Thin data carriers only; the JSON-RPC transport that moves them is a
//! separate concern.

use crate::authenticator::{Authenticator, AuthenticatorDto};
use crate::errors::ApiError;
use crate::request_id::RequestId;
use commit_core::DataHash;
use serde::{Deserialize, Serialize};

/// Commitment submission sent by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCommitmentRequest {
    pub request_id: RequestId,
    pub transaction_hash: DataHash,
    pub authenticator: Authenticator,
    /// Ask the aggregator for a signed receipt
    pub receipt: Option<bool>,
}

impl SubmitCommitmentRequest {
    pub fn new(
        request_id: RequestId,
        transaction_hash: DataHash,
        authenticator: Authenticator,
        receipt: Option<bool>,
    ) -> Self {
        Self {
            request_id,
            transaction_hash,
            authenticator,
            receipt,
        }
    }

    /// Convert to the JSON-facing form
    pub fn to_dto(&self) -> SubmitCommitmentRequestDto {
        SubmitCommitmentRequestDto {
            request_id: self.request_id.clone(),
            transaction_hash: self.transaction_hash.clone(),
            authenticator: self.authenticator.to_dto(),
            receipt: self.receipt,
        }
    }

    /// Parse the JSON-facing form
    pub fn from_dto(dto: &SubmitCommitmentRequestDto) -> Result<Self, ApiError> {
        Ok(Self {
            request_id: dto.request_id.clone(),
            transaction_hash: dto.transaction_hash.clone(),
            authenticator: Authenticator::from_dto(&dto.authenticator)?,
            receipt: dto.receipt,
        })
    }
}

/// JSON-facing form of a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCommitmentRequestDto {
    pub request_id: RequestId,
    pub transaction_hash: DataHash,
    pub authenticator: AuthenticatorDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<bool>,
}

/// Possible aggregator verdicts for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmitCommitmentStatus {
    /// The commitment was accepted and stored
    Success,
    /// Signature verification failed
    AuthenticatorVerificationFailed,
    /// Request identifier did not match the payload
    RequestIdMismatch,
    /// A commitment with the same request id already exists
    RequestIdExists,
}

/// Aggregator response to a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitCommitmentResponse {
    pub status: SubmitCommitmentStatus,
}
