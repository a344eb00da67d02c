//! Incremental sparse merkle tree builder

use crate::errors::TreeError;
use crate::path_utils::calculate_common_path;
use crate::smt::branch::{Branch, BranchView, PendingBranch, PendingLeafBranch, PendingNodeBranch};
use crate::smt::path::RootNode;
use commit_core::HashAlgorithm;
use num_bigint::BigUint;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Incrementally built sparse merkle tree.
///
/// The two root halves are independent resources. Mutation is
/// serialized per half by a fair mutex, so overlapping `add_leaf` calls
/// targeting the same half apply in invocation order while calls
/// targeting different halves proceed concurrently. An insertion that
/// fails leaves its half untouched.
pub struct SparseMerkleTree {
    algorithm: HashAlgorithm,
    left: Mutex<Option<Arc<PendingBranch>>>,
    right: Mutex<Option<Arc<PendingBranch>>>,
}

impl SparseMerkleTree {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            left: Mutex::new(None),
            right: Mutex::new(None),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Adds a leaf at the given sentinel-prefixed path.
    ///
    /// Fails if the path is below the sentinel or if the insertion
    /// conflicts with the existing structure.
    pub async fn add_leaf(&self, path: BigUint, value: Vec<u8>) -> Result<(), TreeError> {
        if path < BigUint::from(1u32) {
            return Err(TreeError::PathOutOfRange);
        }

        let is_right = path.bit(0);
        let half = if is_right { &self.right } else { &self.left };
        let mut guard = half.lock().await;
        let new_branch = match guard.as_ref() {
            Some(branch) => build_tree(branch, &path, value)?,
            None => PendingBranch::Leaf(PendingLeafBranch::new(path.clone(), value)),
        };
        *guard = Some(Arc::new(new_branch));
        debug!(bits = path.bits(), right = %is_right, "leaf added");

        Ok(())
    }

    /// Finalizes the pending structure and returns the new root.
    ///
    /// The finalized halves are stored back, so later insertions build
    /// on top of them and earlier roots keep referring to the same
    /// immutable subtrees. Calling this twice without intervening
    /// insertions yields structurally equal roots.
    pub async fn calculate_root(&self) -> RootNode {
        let left = Self::finalize_half(&self.left, self.algorithm).await;
        let right = Self::finalize_half(&self.right, self.algorithm).await;
        let root = RootNode::create(left, right, self.algorithm);
        debug!(root = %root.hash(), "root calculated");

        root
    }

    async fn finalize_half(
        half: &Mutex<Option<Arc<PendingBranch>>>,
        algorithm: HashAlgorithm,
    ) -> Option<Arc<Branch>> {
        let mut guard = half.lock().await;
        match guard.as_ref() {
            Some(pending) => {
                let finalized = pending.finalize(algorithm);
                *guard = Some(Arc::new(PendingBranch::Finalized(finalized.clone())));
                Some(finalized)
            }
            None => None,
        }
    }
}

/// Insert a value below `branch`, splitting where the paths diverge.
///
/// Builds a fresh spine over shared children instead of mutating in
/// place; the caller swaps it in only when the whole insertion
/// succeeded.
fn build_tree(branch: &Arc<PendingBranch>, remaining_path: &BigUint, value: Vec<u8>) -> Result<PendingBranch, TreeError> {
    let common = calculate_common_path(remaining_path, branch.path());
    let shifted = remaining_path >> common.length;
    let is_right = shifted.bit(0);

    if common.path == *remaining_path {
        return Err(TreeError::LeafInBranch);
    }

    match branch.view() {
        // A leaf must be split from the middle
        BranchView::Leaf { path, value: leaf_value } => {
            if common.path == *path {
                return Err(TreeError::LeafOutOfBounds);
            }

            let old = Arc::new(PendingBranch::Leaf(PendingLeafBranch::new(
                path >> common.length,
                leaf_value.to_vec(),
            )));
            let new = Arc::new(PendingBranch::Leaf(PendingLeafBranch::new(shifted, value)));
            let (left, right) = if is_right { (old, new) } else { (new, old) };

            Ok(PendingBranch::Node(PendingNodeBranch::new(common.path, left, right)))
        }
        BranchView::Node { path, left, right } => {
            // The node itself is split in the middle
            if common.path < *path {
                let new = Arc::new(PendingBranch::Leaf(PendingLeafBranch::new(shifted, value)));
                let old = Arc::new(PendingBranch::Node(PendingNodeBranch::new(
                    path >> common.length,
                    left,
                    right,
                )));
                let (left, right) = if is_right { (old, new) } else { (new, old) };

                return Ok(PendingBranch::Node(PendingNodeBranch::new(common.path, left, right)));
            }

            // Otherwise descend into the child selected by the next bit
            if is_right {
                let right = Arc::new(build_tree(&right, &shifted, value)?);
                Ok(PendingBranch::Node(PendingNodeBranch::new(path.clone(), left, right)))
            } else {
                let left = Arc::new(build_tree(&left, &shifted, value)?);
                Ok(PendingBranch::Node(PendingNodeBranch::new(path.clone(), left, right)))
            }
        }
    }
}
