//! Commitment and authentication layer
//!
//! Binds signed state-transition requests to tree addresses and turns
//! tree path verification into inclusion proof verdicts. Consumed by a
//! transport layer that is out of scope here.

pub mod authenticator;
pub mod errors;
pub mod inclusion_proof;
pub mod leaf_value;
pub mod request_id;
pub mod submit;
pub mod transaction;

pub use authenticator::{Authenticator, AuthenticatorDto};
pub use errors::ApiError;
pub use inclusion_proof::{InclusionProof, InclusionProofDto, InclusionProofVerificationStatus};
pub use leaf_value::LeafValue;
pub use request_id::RequestId;
pub use submit::{SubmitCommitmentRequest, SubmitCommitmentRequestDto, SubmitCommitmentResponse, SubmitCommitmentStatus};
pub use transaction::Transaction;
