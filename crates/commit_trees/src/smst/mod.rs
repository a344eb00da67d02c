//! Sparse merkle sum tree: the sum-conserving variant
//!
//! Structurally identical to the plain tree, with a non-negative
//! aggregate carried on every branch and proof step. Internal and root
//! sums always equal the exact sum of their descendant leaves.

mod branch;
mod path;
mod tree;

pub use branch::{Branch, LeafBranch, NodeBranch};
pub use path::{
    MerkleSumTreePath, MerkleSumTreePathDto, MerkleSumTreePathStep, MerkleSumTreePathStepDto, SumRootNode,
    SumStepBranch, SumStepBranchDto,
};
pub use tree::SparseMerkleSumTree;
