//! Sparse merkle tree: branch model, incremental builder, proofs

mod branch;
mod path;
mod tree;

pub use branch::{Branch, LeafBranch, NodeBranch};
pub use path::{
    MerkleTreePath, MerkleTreePathDto, MerkleTreePathStep, MerkleTreePathStepDto, PathVerificationResult, RootNode,
    StepBranch, StepBranchDto,
};
pub use tree::SparseMerkleTree;
