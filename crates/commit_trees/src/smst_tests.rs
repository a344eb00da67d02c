//! Tests for the sum-conserving sparse merkle tree

use crate::errors::TreeError;
use crate::smst::{MerkleSumTreePath, SparseMerkleSumTree, SumRootNode};
use commit_core::HashAlgorithm;
use num_bigint::BigUint;

fn path(bits: u64) -> BigUint {
    BigUint::from(bits)
}

fn sum(value: u64) -> BigUint {
    BigUint::from(value)
}

const SUM_LEAVES: [(u64, &str, u64); 4] = [
    (0b1000, "left-1", 10),
    (0b1001, "left-2", 20),
    (0b1010, "right-1", 30),
    (0b1011, "right-2", 40),
];

async fn build_tree(leaves: &[(u64, &str, u64)]) -> (SparseMerkleSumTree, SumRootNode) {
    let tree = SparseMerkleSumTree::new(HashAlgorithm::Sha256);
    for (bits, value, leaf_sum) in leaves {
        tree.add_leaf(path(*bits), value.as_bytes().to_vec(), sum(*leaf_sum))
            .await
            .expect("insertion should succeed");
    }
    let root = tree.calculate_root().await;
    (tree, root)
}

#[tokio::test]
async fn test_sum_conservation_scenario() {
    let (tree, root) = build_tree(&SUM_LEAVES).await;
    assert_eq!(*root.sum(), sum(100));

    for (bits, value, leaf_sum) in &SUM_LEAVES {
        let proof = root.get_path(&path(*bits));
        let result = proof.verify(&path(*bits));
        assert!(result.is_path_valid, "path {bits:b} should be valid");
        assert!(result.is_path_included, "path {bits:b} should be included");

        // The proof declares the root aggregate and the leaf's own sum
        assert_eq!(proof.sum, *root.sum());
        assert_eq!(proof.root, *root.hash());
        let branch = proof.steps[0].branch.as_ref().expect("leaf step has a branch");
        assert_eq!(branch.sum, sum(*leaf_sum));
        assert_eq!(branch.value.as_deref(), Some(value.as_bytes()));
    }

    // A fifth leaf raises the aggregate accordingly
    tree.add_leaf(path(0b1110), vec![0u8; 32], sum(100)).await.unwrap();
    let root = tree.calculate_root().await;
    assert_eq!(*root.sum(), sum(200));
}

#[tokio::test]
async fn test_non_inclusion() {
    let (_, root) = build_tree(&SUM_LEAVES).await;

    let absent = path(0b111000);
    let result = root.get_path(&absent).verify(&absent);
    assert!(result.is_path_valid);
    assert!(!result.is_path_included);
}

#[tokio::test]
async fn test_insertion_order_independence() {
    let (_, forward) = build_tree(&SUM_LEAVES).await;
    let mut reversed = SUM_LEAVES;
    reversed.reverse();
    let (_, backward) = build_tree(&reversed).await;

    assert_eq!(forward.hash(), backward.hash());
    assert_eq!(forward.sum(), backward.sum());
}

#[tokio::test]
async fn test_path_below_sentinel_is_rejected() {
    let tree = SparseMerkleSumTree::new(HashAlgorithm::Sha256);
    let result = tree.add_leaf(BigUint::from(0u32), b"value".to_vec(), sum(10)).await;
    assert_eq!(result, Err(TreeError::PathOutOfRange));
}

#[tokio::test]
async fn test_structural_conflicts_leave_half_unchanged() {
    let (tree, before) = build_tree(&SUM_LEAVES).await;

    let result = tree.add_leaf(path(0b10), b"inside".to_vec(), sum(1)).await;
    assert_eq!(result, Err(TreeError::LeafInBranch));
    let result = tree.add_leaf(path(0b101000), b"through".to_vec(), sum(1)).await;
    assert_eq!(result, Err(TreeError::LeafOutOfBounds));

    let after = tree.calculate_root().await;
    assert_eq!(before.hash(), after.hash());
    assert_eq!(before.sum(), after.sum());
}

#[tokio::test]
async fn test_tampered_sibling_sum_breaks_validity() {
    let (_, root) = build_tree(&SUM_LEAVES).await;
    let target = path(0b1000);
    let mut proof = root.get_path(&target);
    assert!(proof.verify(&target).is_path_valid);

    let step = proof
        .steps
        .iter_mut()
        .find(|step| step.sibling.is_some())
        .expect("proof should have a sibling step");
    let sibling = step.sibling.as_mut().unwrap();
    sibling.sum += 5u32;

    assert!(!proof.verify(&target).is_path_valid);
}

#[tokio::test]
async fn test_tampered_root_sum_breaks_validity() {
    let (_, root) = build_tree(&SUM_LEAVES).await;
    let target = path(0b1010);
    let mut proof = root.get_path(&target);

    proof.sum += 1u32;
    assert!(!proof.verify(&target).is_path_valid);
}

#[tokio::test]
async fn test_calculate_root_is_idempotent() {
    let (tree, first) = build_tree(&SUM_LEAVES).await;
    let second = tree.calculate_root().await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_dto_roundtrip() {
    let (_, root) = build_tree(&SUM_LEAVES).await;
    let proof = root.get_path(&path(0b1001));

    let dto = proof.to_dto();
    let json = serde_json::to_string(&dto).unwrap();
    let parsed: crate::smst::MerkleSumTreePathDto = serde_json::from_str(&json).unwrap();
    let restored = MerkleSumTreePath::from_dto(&parsed).unwrap();
    assert_eq!(proof, restored);
    assert!(restored.verify(&path(0b1001)).result());
}

#[tokio::test]
async fn test_cbor_roundtrip() {
    let (_, root) = build_tree(&SUM_LEAVES).await;

    for bits in [0b1000u64, 0b111000] {
        let proof = root.get_path(&path(bits));
        let restored = MerkleSumTreePath::from_cbor(&proof.to_cbor()).unwrap();
        assert_eq!(proof, restored);
    }
}
