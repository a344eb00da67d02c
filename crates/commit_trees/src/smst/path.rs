//! Proof generation and verification for the sparse merkle sum tree

use crate::errors::TreeError;
use crate::path_utils::calculate_common_path;
use crate::smst::branch::{combine_hash, step_hash, Branch};
use commit_core::bitstring::{big_uint_from_bytes, big_uint_to_bytes};
use commit_core::{codec, DataHash, HashAlgorithm};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::smt::PathVerificationResult;

/// A finalized snapshot of the sum tree, carrying the aggregate of all
/// leaf sums next to the root hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumRootNode {
    left: Option<Arc<Branch>>,
    right: Option<Arc<Branch>>,
    sum: BigUint,
    hash: DataHash,
}

impl SumRootNode {
    pub(crate) fn create(left: Option<Arc<Branch>>, right: Option<Arc<Branch>>, algorithm: HashAlgorithm) -> Self {
        let left_imprint = left.as_ref().map(|b| b.hash().imprint());
        let right_imprint = right.as_ref().map(|b| b.hash().imprint());
        let hash = combine_hash(
            algorithm,
            left.as_ref()
                .zip(left_imprint.as_deref())
                .map(|(b, imprint)| (imprint, b.sum())),
            right
                .as_ref()
                .zip(right_imprint.as_deref())
                .map(|(b, imprint)| (imprint, b.sum())),
        );
        let zero = BigUint::from(0u32);
        let sum = left.as_ref().map_or(&zero, |b| b.sum()) + right.as_ref().map_or(&zero, |b| b.sum());

        Self { left, right, sum, hash }
    }

    pub fn hash(&self) -> &DataHash {
        &self.hash
    }

    /// Aggregate of every leaf sum in this snapshot
    pub fn sum(&self) -> &BigUint {
        &self.sum
    }

    pub fn left(&self) -> Option<&Arc<Branch>> {
        self.left.as_ref()
    }

    pub fn right(&self) -> Option<&Arc<Branch>> {
        self.right.as_ref()
    }

    /// Generates the ordered proof for the given address, deepest step
    /// first and root-level step last
    pub fn get_path(&self, path: &BigUint) -> MerkleSumTreePath {
        MerkleSumTreePath {
            root: self.hash.clone(),
            sum: self.sum.clone(),
            steps: generate_path(path, self.left.as_ref(), self.right.as_ref()),
        }
    }
}

fn generate_path(
    remaining_path: &BigUint,
    left: Option<&Arc<Branch>>,
    right: Option<&Arc<Branch>>,
) -> Vec<MerkleSumTreePathStep> {
    let is_right = remaining_path.bit(0);
    let (branch, sibling) = if is_right { (right, left) } else { (left, right) };

    let branch = match branch {
        Some(branch) => branch,
        None => return vec![MerkleSumTreePathStep::without_branch(remaining_path.clone(), sibling)],
    };

    let common = calculate_common_path(remaining_path, branch.path());

    if *branch.path() == common.path {
        if let Branch::Node(node) = branch.as_ref() {
            let shifted = remaining_path >> common.length;
            if shifted != BigUint::from(1u32) {
                let mut steps = generate_path(&shifted, Some(node.left()), Some(node.right()));
                steps.push(MerkleSumTreePathStep::marker(branch.path().clone(), sibling));
                return steps;
            }
        }
    }

    vec![MerkleSumTreePathStep::with_branch(branch, sibling)]
}

/// Payload of a step side: a declared sum plus the realized bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumStepBranch {
    /// Declared aggregate for this side
    pub sum: BigUint,
    /// Leaf value, children hash imprint, or sibling hash imprint;
    /// `None` on ancestor marker steps
    pub value: Option<Vec<u8>>,
}

/// One level of a sum tree proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleSumTreePathStep {
    pub path: BigUint,
    /// Sibling hash and sum at this level, if a sibling exists
    pub sibling: Option<SumStepBranch>,
    /// Branch payload; `None` when the addressed slot is absent
    pub branch: Option<SumStepBranch>,
}

impl MerkleSumTreePathStep {
    fn sibling_of(sibling: Option<&Arc<Branch>>) -> Option<SumStepBranch> {
        sibling.map(|branch| SumStepBranch {
            sum: branch.sum().clone(),
            value: Some(branch.hash().imprint()),
        })
    }

    fn without_branch(path: BigUint, sibling: Option<&Arc<Branch>>) -> Self {
        Self {
            path,
            sibling: Self::sibling_of(sibling),
            branch: None,
        }
    }

    fn marker(path: BigUint, sibling: Option<&Arc<Branch>>) -> Self {
        Self {
            path,
            sibling: Self::sibling_of(sibling),
            branch: Some(SumStepBranch {
                sum: BigUint::from(0u32),
                value: None,
            }),
        }
    }

    fn with_branch(branch: &Arc<Branch>, sibling: Option<&Arc<Branch>>) -> Self {
        let value = match branch.as_ref() {
            Branch::Leaf(leaf) => leaf.value().to_vec(),
            Branch::Node(node) => node.children_hash().imprint(),
        };

        Self {
            path: branch.path().clone(),
            sibling: Self::sibling_of(sibling),
            branch: Some(SumStepBranch {
                sum: branch.sum().clone(),
                value: Some(value),
            }),
        }
    }
}

/// An ordered sum tree proof with the declared root aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleSumTreePath {
    pub root: DataHash,
    pub sum: BigUint,
    pub steps: Vec<MerkleSumTreePathStep>,
}

impl MerkleSumTreePath {
    pub fn new(root: DataHash, sum: BigUint, steps: Vec<MerkleSumTreePathStep>) -> Self {
        Self { root, sum, steps }
    }

    /// Re-derives the root hash, the routed address and the aggregate
    /// sum from the steps.
    ///
    /// Sibling sums are folded into the running total level by level,
    /// so a prover cannot inflate or deflate the aggregate without
    /// breaking the hash chain: the final total must equal the declared
    /// root sum for the path to be valid.
    pub fn verify(&self, request_id: &BigUint) -> PathVerificationResult {
        let algorithm = self.root.algorithm();
        let one = BigUint::from(1u32);
        let mut current_path = one.clone();
        let mut current_hash: Option<DataHash> = None;
        let mut current_sum = self
            .steps
            .first()
            .and_then(|step| step.branch.as_ref())
            .map(|branch| branch.sum.clone())
            .unwrap_or_default();

        for (index, step) in self.steps.iter().enumerate() {
            let mut hash = None;
            if let Some(branch) = &step.branch {
                let source = if index == 0 {
                    branch.value.clone()
                } else {
                    current_hash.as_ref().map(|h| h.imprint())
                };
                hash = Some(step_hash(algorithm, &step.path, source.as_deref(), &current_sum));

                let length = step.path.bits().saturating_sub(1);
                let mask = (&one << length) - 1u32;
                current_path = (current_path << length) | (&step.path & &mask);
            }

            let own_imprint = hash.as_ref().map(|h| h.imprint());
            let own = own_imprint.as_deref().map(|imprint| (imprint, &current_sum));
            let sibling = step
                .sibling
                .as_ref()
                .and_then(|s| s.value.as_deref().map(|imprint| (imprint, &s.sum)));
            let (left, right) = if step.path.bit(0) { (sibling, own) } else { (own, sibling) };
            current_hash = Some(combine_hash(algorithm, left, right));

            if let Some(sibling) = &step.sibling {
                current_sum += &sibling.sum;
            }
        }

        PathVerificationResult {
            is_path_valid: current_hash.as_ref() == Some(&self.root) && current_sum == self.sum,
            is_path_included: current_path == *request_id,
        }
    }

    /// Convert the path to its JSON-facing form
    pub fn to_dto(&self) -> MerkleSumTreePathDto {
        MerkleSumTreePathDto {
            root: self.root.to_hex(),
            sum: self.sum.to_string(),
            steps: self.steps.iter().map(step_to_dto).collect(),
        }
    }

    /// Parse the JSON-facing form
    pub fn from_dto(dto: &MerkleSumTreePathDto) -> Result<Self, TreeError> {
        Ok(Self {
            root: DataHash::from_hex(&dto.root)?,
            sum: BigUint::from_str(&dto.sum).map_err(|e| TreeError::Decode(e.to_string()))?,
            steps: dto.steps.iter().map(step_from_dto).collect::<Result<_, _>>()?,
        })
    }

    /// Canonical binary form: `[root, sum, steps]`
    pub fn to_cbor(&self) -> Vec<u8> {
        codec::encode(&codec::array(vec![
            codec::byte_string(&self.root.imprint()),
            codec::byte_string(&big_uint_to_bytes(&self.sum)),
            codec::array(self.steps.iter().map(step_to_value).collect()),
        ]))
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, TreeError> {
        let value = codec::decode(bytes)?;
        let items = codec::expect_array(&value, 3)?;
        let root = DataHash::from_imprint(codec::expect_bytes(&items[0])?)?;
        let sum = big_uint_from_bytes(codec::expect_bytes(&items[1])?);
        let steps = codec::expect_seq(&items[2])?
            .iter()
            .map(step_from_value)
            .collect::<Result<_, _>>()?;

        Ok(Self { root, sum, steps })
    }
}

/// JSON-facing form of a step side payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SumStepBranchDto {
    pub sum: String,
    pub value: Option<String>,
}

/// JSON-facing form of a sum tree proof step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleSumTreePathStepDto {
    pub path: String,
    pub sibling: Option<SumStepBranchDto>,
    pub branch: Option<SumStepBranchDto>,
}

/// JSON-facing form of a sum tree proof
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleSumTreePathDto {
    pub root: String,
    pub sum: String,
    pub steps: Vec<MerkleSumTreePathStepDto>,
}

fn side_to_dto(side: &SumStepBranch) -> SumStepBranchDto {
    SumStepBranchDto {
        sum: side.sum.to_string(),
        value: side.value.as_ref().map(hex::encode),
    }
}

fn side_from_dto(dto: &SumStepBranchDto) -> Result<SumStepBranch, TreeError> {
    Ok(SumStepBranch {
        sum: BigUint::from_str(&dto.sum).map_err(|e| TreeError::Decode(e.to_string()))?,
        value: dto
            .value
            .as_deref()
            .map(hex::decode)
            .transpose()
            .map_err(|e| TreeError::Decode(e.to_string()))?,
    })
}

fn step_to_dto(step: &MerkleSumTreePathStep) -> MerkleSumTreePathStepDto {
    MerkleSumTreePathStepDto {
        path: step.path.to_string(),
        sibling: step.sibling.as_ref().map(side_to_dto),
        branch: step.branch.as_ref().map(side_to_dto),
    }
}

fn step_from_dto(dto: &MerkleSumTreePathStepDto) -> Result<MerkleSumTreePathStep, TreeError> {
    Ok(MerkleSumTreePathStep {
        path: BigUint::from_str(&dto.path).map_err(|e| TreeError::Decode(e.to_string()))?,
        sibling: dto.sibling.as_ref().map(side_from_dto).transpose()?,
        branch: dto.branch.as_ref().map(side_from_dto).transpose()?,
    })
}

fn side_to_value(side: &SumStepBranch) -> codec::Value {
    codec::array(vec![
        codec::byte_string(&big_uint_to_bytes(&side.sum)),
        codec::optional(side.value.as_deref(), codec::byte_string),
    ])
}

fn side_from_value(value: &codec::Value) -> Result<SumStepBranch, commit_core::CodecError> {
    let fields = codec::expect_array(value, 2)?;
    Ok(SumStepBranch {
        sum: big_uint_from_bytes(codec::expect_bytes(&fields[0])?),
        value: codec::expect_optional(&fields[1], codec::expect_bytes)?.map(<[u8]>::to_vec),
    })
}

fn step_to_value(step: &MerkleSumTreePathStep) -> codec::Value {
    codec::array(vec![
        codec::byte_string(&big_uint_to_bytes(&step.path)),
        codec::optional(step.sibling.as_ref(), side_to_value),
        codec::optional(step.branch.as_ref(), side_to_value),
    ])
}

fn step_from_value(value: &codec::Value) -> Result<MerkleSumTreePathStep, TreeError> {
    let items = codec::expect_array(value, 3)?;
    Ok(MerkleSumTreePathStep {
        path: big_uint_from_bytes(codec::expect_bytes(&items[0])?),
        sibling: codec::expect_optional(&items[1], side_from_value)?,
        branch: codec::expect_optional(&items[2], side_from_value)?,
    })
}
