//! Incremental sparse merkle sum tree builder

use crate::errors::TreeError;
use crate::path_utils::calculate_common_path;
use crate::smst::branch::{Branch, BranchView, PendingBranch, PendingLeafBranch, PendingNodeBranch};
use crate::smst::path::SumRootNode;
use commit_core::HashAlgorithm;
use num_bigint::BigUint;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Incrementally built sparse merkle sum tree.
///
/// Follows the same per-half serialization contract as the plain tree;
/// sums ride along with every leaf and are aggregated during
/// finalization. Sums are unsigned by construction.
pub struct SparseMerkleSumTree {
    algorithm: HashAlgorithm,
    left: Mutex<Option<Arc<PendingBranch>>>,
    right: Mutex<Option<Arc<PendingBranch>>>,
}

impl SparseMerkleSumTree {
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

    /// Adds a leaf with its sum at the given sentinel-prefixed path
    pub async fn add_leaf(&self, path: BigUint, value: Vec<u8>, sum: BigUint) -> Result<(), TreeError> {
        if path < BigUint::from(1u32) {
            return Err(TreeError::PathOutOfRange);
        }

        let is_right = path.bit(0);
        let half = if is_right { &self.right } else { &self.left };
        let mut guard = half.lock().await;
        let new_branch = match guard.as_ref() {
            Some(branch) => build_tree(branch, &path, value, sum)?,
            None => PendingBranch::Leaf(PendingLeafBranch::new(path.clone(), value, sum)),
        };
        *guard = Some(Arc::new(new_branch));
        debug!(bits = path.bits(), right = %is_right, "sum leaf added");

        Ok(())
    }

    /// Finalizes the pending structure and returns the new root with
    /// its aggregated sum
    pub async fn calculate_root(&self) -> SumRootNode {
        let left = Self::finalize_half(&self.left, self.algorithm).await;
        let right = Self::finalize_half(&self.right, self.algorithm).await;
        let root = SumRootNode::create(left, right, self.algorithm);
        debug!(root = %root.hash(), sum = %root.sum(), "sum root calculated");

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

fn build_tree(
    branch: &Arc<PendingBranch>,
    remaining_path: &BigUint,
    value: Vec<u8>,
    sum: BigUint,
) -> Result<PendingBranch, TreeError> {
    let common = calculate_common_path(remaining_path, branch.path());
    let shifted = remaining_path >> common.length;
    let is_right = shifted.bit(0);

    if common.path == *remaining_path {
        return Err(TreeError::LeafInBranch);
    }

    match branch.view() {
        // A leaf must be split from the middle
        BranchView::Leaf {
            path,
            value: leaf_value,
            sum: leaf_sum,
        } => {
            if common.path == *path {
                return Err(TreeError::LeafOutOfBounds);
            }

            let old = Arc::new(PendingBranch::Leaf(PendingLeafBranch::new(
                path >> common.length,
                leaf_value.to_vec(),
                leaf_sum.clone(),
            )));
            let new = Arc::new(PendingBranch::Leaf(PendingLeafBranch::new(shifted, value, sum)));
            let (left, right) = if is_right { (old, new) } else { (new, old) };

            Ok(PendingBranch::Node(PendingNodeBranch::new(common.path, left, right)))
        }
        BranchView::Node { path, left, right } => {
            // The node itself is split in the middle
            if common.path < *path {
                let new = Arc::new(PendingBranch::Leaf(PendingLeafBranch::new(shifted, value, sum)));
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
                let right = Arc::new(build_tree(&right, &shifted, value, sum)?);
                Ok(PendingBranch::Node(PendingNodeBranch::new(path.clone(), left, right)))
            } else {
                let left = Arc::new(build_tree(&left, &shifted, value, sum)?);
                Ok(PendingBranch::Node(PendingNodeBranch::new(path.clone(), left, right)))
            }
        }
    }
}
