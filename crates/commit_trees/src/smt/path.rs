//! Proof generation and verification for the sparse merkle tree

use crate::errors::TreeError;
use crate::path_utils::calculate_common_path;
use crate::smt::branch::{combine_hash, step_hash, Branch};
use commit_core::bitstring::{big_uint_from_bytes, big_uint_to_bytes};
use commit_core::{codec, DataHash, HashAlgorithm};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// A finalized point-in-time snapshot of the tree.
///
/// The root has the implicit path `1` and is never itself a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootNode {
    left: Option<Arc<Branch>>,
    right: Option<Arc<Branch>>,
    hash: DataHash,
}

impl RootNode {
    pub(crate) fn create(left: Option<Arc<Branch>>, right: Option<Arc<Branch>>, algorithm: HashAlgorithm) -> Self {
        let hash = combine_hash(
            algorithm,
            left.as_ref().map(|b| b.hash().imprint()).as_deref(),
            right.as_ref().map(|b| b.hash().imprint()).as_deref(),
        );

        Self { left, right, hash }
    }

    pub fn hash(&self) -> &DataHash {
        &self.hash
    }

    pub fn left(&self) -> Option<&Arc<Branch>> {
        self.left.as_ref()
    }

    pub fn right(&self) -> Option<&Arc<Branch>> {
        self.right.as_ref()
    }

    /// Generates the ordered proof for the given address, deepest step
    /// first and root-level step last
    pub fn get_path(&self, path: &BigUint) -> MerkleTreePath {
        MerkleTreePath {
            root: self.hash.clone(),
            steps: generate_path(path, self.left.as_ref(), self.right.as_ref()),
        }
    }
}

fn generate_path(
    remaining_path: &BigUint,
    left: Option<&Arc<Branch>>,
    right: Option<&Arc<Branch>>,
) -> Vec<MerkleTreePathStep> {
    let is_right = remaining_path.bit(0);
    let (branch, sibling) = if is_right { (right, left) } else { (left, right) };

    let branch = match branch {
        Some(branch) => branch,
        // The addressed slot is empty; emit a step with no branch payload
        None => return vec![MerkleTreePathStep::without_branch(remaining_path.clone(), sibling)],
    };

    let common = calculate_common_path(remaining_path, branch.path());

    if *branch.path() == common.path {
        if let Branch::Node(node) = branch.as_ref() {
            let shifted = remaining_path >> common.length;
            // If the address has not ended, descend and append the
            // ancestor step after the deeper ones
            if shifted != BigUint::from(1u32) {
                let mut steps = generate_path(&shifted, Some(node.left()), Some(node.right()));
                steps.push(MerkleTreePathStep::marker(branch.path().clone(), sibling));
                return steps;
            }
        }
    }

    // Leaf reached, address fully consumed, or the walk diverged from
    // the stored path: the visited branch contributes its payload
    vec![MerkleTreePathStep::with_branch(branch, sibling)]
}

/// Payload of a step that carries a realized branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepBranch {
    /// Leaf value or already-combined children hash imprint; `None` on
    /// ancestor steps that merely mark a present branch
    pub value: Option<Vec<u8>>,
}

/// One level of a tree proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTreePathStep {
    /// The address fragment committed by the visited branch
    pub path: BigUint,
    /// Sibling hash at this level, if a sibling exists
    pub sibling: Option<DataHash>,
    /// Branch payload; `None` when the addressed slot is absent
    pub branch: Option<StepBranch>,
}

impl MerkleTreePathStep {
    fn without_branch(path: BigUint, sibling: Option<&Arc<Branch>>) -> Self {
        Self {
            path,
            sibling: sibling.map(|b| b.hash().clone()),
            branch: None,
        }
    }

    fn marker(path: BigUint, sibling: Option<&Arc<Branch>>) -> Self {
        Self {
            path,
            sibling: sibling.map(|b| b.hash().clone()),
            branch: Some(StepBranch { value: None }),
        }
    }

    fn with_branch(branch: &Arc<Branch>, sibling: Option<&Arc<Branch>>) -> Self {
        let value = match branch.as_ref() {
            Branch::Leaf(leaf) => leaf.value().to_vec(),
            Branch::Node(node) => node.children_hash().imprint(),
        };

        Self {
            path: branch.path().clone(),
            sibling: sibling.map(|b| b.hash().clone()),
            branch: Some(StepBranch { value: Some(value) }),
        }
    }
}

/// Outcome of verifying a tree path against a root and an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathVerificationResult {
    /// The steps re-derive the claimed root hash
    pub is_path_valid: bool,
    /// The reconstructed address equals the requested one
    pub is_path_included: bool,
}

impl PathVerificationResult {
    /// True only for a valid inclusion proof
    pub fn result(&self) -> bool {
        self.is_path_valid && self.is_path_included
    }
}

/// An ordered proof extracted from a [`RootNode`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTreePath {
    pub root: DataHash,
    pub steps: Vec<MerkleTreePathStep>,
}

impl MerkleTreePath {
    pub fn new(root: DataHash, steps: Vec<MerkleTreePathStep>) -> Self {
        Self { root, steps }
    }

    /// Re-derives the root hash and the routed address from the steps.
    ///
    /// A single routine serves inclusion and non-inclusion claims;
    /// callers read both flags of the result instead of branching into
    /// different algorithms.
    pub fn verify(&self, request_id: &BigUint) -> PathVerificationResult {
        let algorithm = self.root.algorithm();
        let one = BigUint::from(1u32);
        let mut current_path = one.clone();
        let mut current_hash: Option<DataHash> = None;

        for (index, step) in self.steps.iter().enumerate() {
            let mut hash = None;
            if let Some(branch) = &step.branch {
                let source = if index == 0 {
                    branch.value.clone()
                } else {
                    current_hash.as_ref().map(|h| h.imprint())
                };
                hash = Some(step_hash(algorithm, &step.path, source.as_deref()));

                let length = step.path.bits().saturating_sub(1);
                let mask = (&one << length) - 1u32;
                current_path = (current_path << length) | (&step.path & &mask);
            }

            let own = hash.as_ref().map(|h| h.imprint());
            let sibling = step.sibling.as_ref().map(|s| s.imprint());
            let (left, right) = if step.path.bit(0) { (sibling, own) } else { (own, sibling) };
            current_hash = Some(combine_hash(algorithm, left.as_deref(), right.as_deref()));
        }

        PathVerificationResult {
            is_path_valid: current_hash.as_ref() == Some(&self.root),
            is_path_included: current_path == *request_id,
        }
    }

    /// Convert the path to its JSON-facing form
    pub fn to_dto(&self) -> MerkleTreePathDto {
        MerkleTreePathDto {
            root: self.root.to_hex(),
            steps: self.steps.iter().map(step_to_dto).collect(),
        }
    }

    /// Parse the JSON-facing form
    pub fn from_dto(dto: &MerkleTreePathDto) -> Result<Self, TreeError> {
        Ok(Self {
            root: DataHash::from_hex(&dto.root)?,
            steps: dto.steps.iter().map(step_from_dto).collect::<Result<_, _>>()?,
        })
    }

    /// Canonical binary form: `[root, steps]`
    pub fn to_cbor(&self) -> Vec<u8> {
        codec::encode(&codec::array(vec![
            codec::byte_string(&self.root.imprint()),
            codec::array(self.steps.iter().map(step_to_value).collect()),
        ]))
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, TreeError> {
        let value = codec::decode(bytes)?;
        let items = codec::expect_array(&value, 2)?;
        let root = DataHash::from_imprint(codec::expect_bytes(&items[0])?)?;
        let steps = codec::expect_seq(&items[1])?
            .iter()
            .map(step_from_value)
            .collect::<Result<_, _>>()?;

        Ok(Self { root, steps })
    }
}

/// JSON-facing form of a step branch payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepBranchDto {
    pub value: Option<String>,
}

/// JSON-facing form of a proof step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleTreePathStepDto {
    pub path: String,
    pub sibling: Option<String>,
    pub branch: Option<StepBranchDto>,
}

/// JSON-facing form of a proof
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleTreePathDto {
    pub root: String,
    pub steps: Vec<MerkleTreePathStepDto>,
}

fn step_to_dto(step: &MerkleTreePathStep) -> MerkleTreePathStepDto {
    MerkleTreePathStepDto {
        path: step.path.to_string(),
        sibling: step.sibling.as_ref().map(|s| s.to_hex()),
        branch: step.branch.as_ref().map(|b| StepBranchDto {
            value: b.value.as_ref().map(hex::encode),
        }),
    }
}

fn step_from_dto(dto: &MerkleTreePathStepDto) -> Result<MerkleTreePathStep, TreeError> {
    let path = BigUint::from_str(&dto.path).map_err(|e| TreeError::Decode(e.to_string()))?;
    let sibling = match &dto.sibling {
        Some(text) => Some(DataHash::from_hex(text)?),
        None => None,
    };
    let branch = match &dto.branch {
        Some(branch) => Some(StepBranch {
            value: branch
                .value
                .as_deref()
                .map(hex::decode)
                .transpose()
                .map_err(|e| TreeError::Decode(e.to_string()))?,
        }),
        None => None,
    };

    Ok(MerkleTreePathStep { path, sibling, branch })
}

fn step_to_value(step: &MerkleTreePathStep) -> codec::Value {
    codec::array(vec![
        codec::byte_string(&big_uint_to_bytes(&step.path)),
        codec::optional(step.sibling.as_ref(), |s| codec::byte_string(&s.imprint())),
        codec::optional(step.branch.as_ref(), |b| {
            codec::array(vec![codec::optional(b.value.as_deref(), codec::byte_string)])
        }),
    ])
}

fn step_from_value(value: &codec::Value) -> Result<MerkleTreePathStep, TreeError> {
    let items = codec::expect_array(value, 3)?;
    let path = big_uint_from_bytes(codec::expect_bytes(&items[0])?);
    let sibling = codec::expect_optional(&items[1], codec::expect_bytes)?
        .map(DataHash::from_imprint)
        .transpose()?;
    let branch = codec::expect_optional(&items[2], |v| {
        let fields = codec::expect_array(v, 1)?;
        Ok(StepBranch {
            value: codec::expect_optional(&fields[0], codec::expect_bytes)?.map(<[u8]>::to_vec),
        })
    })?;

    Ok(MerkleTreePathStep { path, sibling, branch })
}
