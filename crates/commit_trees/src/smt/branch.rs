//! Finalized and pending branch variants of the sparse merkle tree

use commit_core::bitstring::big_uint_to_bytes;
use commit_core::{codec, DataHash, DataHasher, HashAlgorithm};
use num_bigint::BigUint;
use std::sync::Arc;

/// A hashed leaf holding a committed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafBranch {
    path: BigUint,
    value: Vec<u8>,
    hash: DataHash,
}

impl LeafBranch {
    pub fn path(&self) -> &BigUint {
        &self.path
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn hash(&self) -> &DataHash {
        &self.hash
    }
}

/// A hashed internal branch with exactly two children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBranch {
    path: BigUint,
    left: Arc<Branch>,
    right: Arc<Branch>,
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

    pub fn hash(&self) -> &DataHash {
        match self {
            Branch::Leaf(leaf) => leaf.hash(),
            Branch::Node(node) => node.hash(),
        }
    }
}

/// An unhashed leaf accumulated during insertion
#[derive(Debug, Clone)]
pub(crate) struct PendingLeafBranch {
    pub(crate) path: BigUint,
    pub(crate) value: Vec<u8>,
}

impl PendingLeafBranch {
    pub(crate) fn new(path: BigUint, value: Vec<u8>) -> Self {
        Self { path, value }
    }
}

/// An unhashed internal branch accumulated during insertion
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

/// A branch that has not been finalized yet.
///
/// Subtrees hashed by an earlier root calculation re-enter later
/// insertions through the `Finalized` variant, so snapshots share
/// structure instead of copying it.
#[derive(Debug, Clone)]
pub(crate) enum PendingBranch {
    Leaf(PendingLeafBranch),
    Node(PendingNodeBranch),
    Finalized(Arc<Branch>),
}

/// Insertion-time view of a pending branch, with finalized children
/// re-wrapped so the splitting logic stays uniform
pub(crate) enum BranchView<'a> {
    Leaf {
        path: &'a BigUint,
        value: &'a [u8],
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
                },
                Branch::Node(node) => BranchView::Node {
                    path: node.path(),
                    left: Arc::new(PendingBranch::Finalized(node.left().clone())),
                    right: Arc::new(PendingBranch::Finalized(node.right().clone())),
                },
            },
        }
    }

    /// Hash the subtree bottom-up. Already finalized branches are
    /// returned as-is, which makes repeated finalization idempotent.
    pub(crate) fn finalize(&self, algorithm: HashAlgorithm) -> Arc<Branch> {
        match self {
            PendingBranch::Leaf(leaf) => Arc::new(Branch::Leaf(LeafBranch {
                path: leaf.path.clone(),
                hash: leaf_hash(algorithm, &leaf.path, &leaf.value),
                value: leaf.value.clone(),
            })),
            PendingBranch::Node(node) => {
                let left = node.left.finalize(algorithm);
                let right = node.right.finalize(algorithm);
                let left_imprint = left.hash().imprint();
                let right_imprint = right.hash().imprint();
                let children_hash = combine_hash(
                    algorithm,
                    Some(left_imprint.as_slice()),
                    Some(right_imprint.as_slice()),
                );
                let children_imprint = children_hash.imprint();
                let hash = step_hash(algorithm, &node.path, Some(children_imprint.as_slice()));

                Arc::new(Branch::Node(NodeBranch {
                    path: node.path.clone(),
                    left,
                    right,
                    children_hash,
                    hash,
                }))
            }
            PendingBranch::Finalized(branch) => branch.clone(),
        }
    }
}

/// `H([path, source])`, shared by leaf hashing, node hashing and the
/// per-step recomputation during verification
pub(crate) fn step_hash(algorithm: HashAlgorithm, path: &BigUint, source: Option<&[u8]>) -> DataHash {
    let preimage = codec::encode(&codec::array(vec![
        codec::byte_string(&big_uint_to_bytes(path)),
        codec::optional(source, codec::byte_string),
    ]));

    DataHasher::new(algorithm).update(&preimage).finalize()
}

pub(crate) fn leaf_hash(algorithm: HashAlgorithm, path: &BigUint, value: &[u8]) -> DataHash {
    step_hash(algorithm, path, Some(value))
}

/// `H([left imprint | null, right imprint | null])`, shared by the
/// children hash of internal branches and the root combine rule
pub(crate) fn combine_hash(algorithm: HashAlgorithm, left: Option<&[u8]>, right: Option<&[u8]>) -> DataHash {
    let preimage = codec::encode(&codec::array(vec![
        codec::optional(left, codec::byte_string),
        codec::optional(right, codec::byte_string),
    ]));

    DataHasher::new(algorithm).update(&preimage).finalize()
}
