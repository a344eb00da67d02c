//! Finalized and pending branch variants of the sparse merkle sum tree

use commit_core::bitstring::big_uint_to_bytes;
use commit_core::{codec, DataHash, DataHasher, HashAlgorithm};
use num_bigint::BigUint;
use std::sync::Arc;

/// A hashed leaf holding a committed value and its sum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafBranch {
    path: BigUint,
    value: Vec<u8>,
    sum: BigUint,
    hash: DataHash,
}

impl LeafBranch {
    pub fn path(&self) -> &BigUint {
        &self.path
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn sum(&self) -> &BigUint {
        &self.sum
    }

    pub fn hash(&self) -> &DataHash {
        &self.hash
    }
}

/// A hashed internal branch; its sum is the sum of both children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBranch {
    path: BigUint,
    left: Arc<Branch>,
    right: Arc<Branch>,
    sum: BigUint,
    children_hash: DataHash,
    hash: DataHash,
}

impl NodeBranch {
    pub fn path(&self) -> &BigUint {
        &self.path
    }

    pub fn left(&self) -> &Arc<Branch> {
        &self.left
    }

    pub fn right(&self) -> &Arc<Branch> {
        &self.right
    }

    pub fn sum(&self) -> &BigUint {
        &self.sum
    }

    pub fn children_hash(&self) -> &DataHash {
        &self.children_hash
    }

    pub fn hash(&self) -> &DataHash {
        &self.hash
    }
}

/// An immutable, fully hashed subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    Leaf(LeafBranch),
    Node(NodeBranch),
}

impl Branch {
    pub fn path(&self) -> &BigUint {
        match self {
            Branch::Leaf(leaf) => leaf.path(),
            Branch::Node(node) => node.path(),
        }
    }

    pub fn sum(&self) -> &BigUint {
        match self {
            Branch::Leaf(leaf) => leaf.sum(),
            Branch::Node(node) => node.sum(),
        }
    }

    pub fn hash(&self) -> &DataHash {
        match self {
            Branch::Leaf(leaf) => leaf.hash(),
            Branch::Node(node) => node.hash(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PendingLeafBranch {
    pub(crate) path: BigUint,
    pub(crate) value: Vec<u8>,
    pub(crate) sum: BigUint,
}

impl PendingLeafBranch {
    pub(crate) fn new(path: BigUint, value: Vec<u8>, sum: BigUint) -> Self {
        Self { path, value, sum }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PendingNodeBranch {
    pub(crate) path: BigUint,
    pub(crate) left: Arc<PendingBranch>,
    pub(crate) right: Arc<PendingBranch>,
}

impl PendingNodeBranch {
    pub(crate) fn new(path: BigUint, left: Arc<PendingBranch>, right: Arc<PendingBranch>) -> Self {
        Self { path, left, right }
    }
}

/// A branch that has not been finalized yet
#[derive(Debug, Clone)]
pub(crate) enum PendingBranch {
    Leaf(PendingLeafBranch),
    Node(PendingNodeBranch),
    Finalized(Arc<Branch>),
}

pub(crate) enum BranchView<'a> {
    Leaf {
        path: &'a BigUint,
        value: &'a [u8],
        sum: &'a BigUint,
    },
    Node {
        path: &'a BigUint,
        left: Arc<PendingBranch>,
        right: Arc<PendingBranch>,
    },
}

impl PendingBranch {
    pub(crate) fn path(&self) -> &BigUint {
        match self {
            PendingBranch::Leaf(leaf) => &leaf.path,
            PendingBranch::Node(node) => &node.path,
            PendingBranch::Finalized(branch) => branch.path(),
        }
    }

    pub(crate) fn view(&self) -> BranchView<'_> {
        match self {
            PendingBranch::Leaf(leaf) => BranchView::Leaf {
                path: &leaf.path,
                value: &leaf.value,
                sum: &leaf.sum,
            },
            PendingBranch::Node(node) => BranchView::Node {
                path: &node.path,
                left: node.left.clone(),
                right: node.right.clone(),
            },
            PendingBranch::Finalized(branch) => match branch.as_ref() {
                Branch::Leaf(leaf) => BranchView::Leaf {
                    path: leaf.path(),
                    value: leaf.value(),
                    sum: leaf.sum(),
                },
                Branch::Node(node) => BranchView::Node {
                    path: node.path(),
                    left: Arc::new(PendingBranch::Finalized(node.left().clone())),
                    right: Arc::new(PendingBranch::Finalized(node.right().clone())),
                },
            },
        }
    }

    /// Hash the subtree bottom-up, propagating child sums into every
    /// internal branch. Idempotent for already finalized subtrees.
    pub(crate) fn finalize(&self, algorithm: HashAlgorithm) -> Arc<Branch> {
        match self {
            PendingBranch::Leaf(leaf) => Arc::new(Branch::Leaf(LeafBranch {
                path: leaf.path.clone(),
                hash: leaf_hash(algorithm, &leaf.path, &leaf.value, &leaf.sum),
                value: leaf.value.clone(),
                sum: leaf.sum.clone(),
            })),
            PendingBranch::Node(node) => {
                let left = node.left.finalize(algorithm);
                let right = node.right.finalize(algorithm);
                let sum = left.sum() + right.sum();
                let left_imprint = left.hash().imprint();
                let right_imprint = right.hash().imprint();
                let children_hash = combine_hash(
                    algorithm,
                    Some((left_imprint.as_slice(), left.sum())),
                    Some((right_imprint.as_slice(), right.sum())),
                );
                let children_imprint = children_hash.imprint();
                let hash = step_hash(algorithm, &node.path, Some(children_imprint.as_slice()), &sum);

                Arc::new(Branch::Node(NodeBranch {
                    path: node.path.clone(),
                    left,
                    right,
                    sum,
                    children_hash,
                    hash,
                }))
            }
            PendingBranch::Finalized(branch) => branch.clone(),
        }
    }
}

/// `H([path, source, sum])`, shared by leaf hashing, node hashing and
/// the per-step recomputation during verification
pub(crate) fn step_hash(algorithm: HashAlgorithm, path: &BigUint, source: Option<&[u8]>, sum: &BigUint) -> DataHash {
    let preimage = codec::encode(&codec::array(vec![
        codec::byte_string(&big_uint_to_bytes(path)),
        codec::optional(source, codec::byte_string),
        codec::byte_string(&big_uint_to_bytes(sum)),
    ]));

    DataHasher::new(algorithm).update(&preimage).finalize()
}

pub(crate) fn leaf_hash(algorithm: HashAlgorithm, path: &BigUint, value: &[u8], sum: &BigUint) -> DataHash {
    step_hash(algorithm, path, Some(value), sum)
}

/// `H([[left imprint, left sum] | null, [right imprint, right sum] | null])`
pub(crate) fn combine_hash(
    algorithm: HashAlgorithm,
    left: Option<(&[u8], &BigUint)>,
    right: Option<(&[u8], &BigUint)>,
) -> DataHash {
    let entry = |side: Option<(&[u8], &BigUint)>| {
        codec::optional(side, |(imprint, sum)| {
            codec::array(vec![
                codec::byte_string(imprint),
                codec::byte_string(&big_uint_to_bytes(sum)),
            ])
        })
    };
    let preimage = codec::encode(&codec::array(vec![entry(left), entry(right)]));

    DataHasher::new(algorithm).update(&preimage).finalize()
}
