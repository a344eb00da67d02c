//! Tests for the sparse merkle tree builder, proof generation and verification

use crate::errors::TreeError;
use crate::smt::{MerkleTreePath, RootNode, SparseMerkleTree};
use commit_core::HashAlgorithm;
use num_bigint::BigUint;

fn path(bits: u64) -> BigUint {
    BigUint::from(bits)
}

const SPARSE_LEAVES: [(u64, &str); 9] = [
    (0b110010000, "value00010000"),
    (0b100000000, "value00000000"),
    (0b100010000, "value00010000"),
    (0b111100101, "value11100101"),
    (0b1100, "value100"),
    (0b1011, "value011"),
    (0b111101111, "value11101111"),
    (0b10001010, "value0001010"),
    (0b11010101, "value1010101"),
];

async fn build_tree(leaves: &[(u64, &str)]) -> RootNode {
    let tree = SparseMerkleTree::new(HashAlgorithm::Sha256);
    for (bits, value) in leaves {
        tree.add_leaf(path(*bits), value.as_bytes().to_vec())
            .await
            .expect("insertion should succeed");
    }
    tree.calculate_root().await
}

#[tokio::test]
async fn test_round_trip_inclusion() {
    let root = build_tree(&SPARSE_LEAVES).await;

    for (bits, value) in &SPARSE_LEAVES {
        let proof = root.get_path(&path(*bits));
        let result = proof.verify(&path(*bits));
        assert!(result.is_path_valid, "path {bits:b} should be valid");
        assert!(result.is_path_included, "path {bits:b} should be included");
        assert!(result.result());
        assert_eq!(proof.root, *root.hash());

        // The deepest step carries the committed leaf value
        let branch = proof.steps[0].branch.as_ref().expect("leaf step has a branch");
        assert_eq!(branch.value.as_deref(), Some(value.as_bytes()));
    }
}

#[tokio::test]
async fn test_non_inclusion() {
    let root = build_tree(&SPARSE_LEAVES).await;

    for absent in [0b1111111111u64, 0b1000000001, 0b10110] {
        let result = root.get_path(&path(absent)).verify(&path(absent));
        assert!(result.is_path_valid, "path {absent:b} proof should be valid");
        assert!(!result.is_path_included, "path {absent:b} should not be included");
        assert!(!result.result());
    }
}

#[tokio::test]
async fn test_insertion_order_independence() {
    let forward = build_tree(&SPARSE_LEAVES).await;
    let mut reversed = SPARSE_LEAVES;
    reversed.reverse();
    let backward = build_tree(&reversed).await;

    assert_eq!(forward.hash(), backward.hash());
}

#[tokio::test]
async fn test_path_below_sentinel_is_rejected() {
    let tree = SparseMerkleTree::new(HashAlgorithm::Sha256);
    let result = tree.add_leaf(BigUint::from(0u32), b"value".to_vec()).await;
    assert_eq!(result, Err(TreeError::PathOutOfRange));
}

#[tokio::test]
async fn test_leaf_inside_branch_is_rejected() {
    let tree = SparseMerkleTree::new(HashAlgorithm::Sha256);
    tree.add_leaf(path(0b1000), b"deep".to_vec()).await.unwrap();
    let before = tree.calculate_root().await;

    // 0b10 is a strict prefix of the existing leaf path
    let result = tree.add_leaf(path(0b10), b"shallow".to_vec()).await;
    assert_eq!(result, Err(TreeError::LeafInBranch));

    // The failed insertion must leave the half unchanged
    assert_eq!(tree.calculate_root().await.hash(), before.hash());
}

#[tokio::test]
async fn test_extension_through_leaf_is_rejected() {
    let tree = SparseMerkleTree::new(HashAlgorithm::Sha256);
    tree.add_leaf(path(0b10), b"shallow".to_vec()).await.unwrap();
    let before = tree.calculate_root().await;

    // The existing leaf path is a strict prefix of the new one
    let result = tree.add_leaf(path(0b1000), b"deep".to_vec()).await;
    assert_eq!(result, Err(TreeError::LeafOutOfBounds));

    assert_eq!(tree.calculate_root().await.hash(), before.hash());
}

#[tokio::test]
async fn test_calculate_root_is_idempotent() {
    let tree = SparseMerkleTree::new(HashAlgorithm::Sha256);
    for (bits, value) in &SPARSE_LEAVES[..4] {
        tree.add_leaf(path(*bits), value.as_bytes().to_vec()).await.unwrap();
    }

    let first = tree.calculate_root().await;
    let second = tree.calculate_root().await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_snapshots_are_append_only() {
    let tree = SparseMerkleTree::new(HashAlgorithm::Sha256);
    tree.add_leaf(path(0b1000), b"first".to_vec()).await.unwrap();
    let root1 = tree.calculate_root().await;
    let proof1 = root1.get_path(&path(0b1000));

    tree.add_leaf(path(0b1010), b"second".to_vec()).await.unwrap();
    let root2 = tree.calculate_root().await;

    assert_ne!(root1.hash(), root2.hash());
    // The earlier snapshot and its proofs stay valid
    assert!(proof1.verify(&path(0b1000)).result());
    assert!(root2.get_path(&path(0b1000)).verify(&path(0b1000)).result());
    assert!(root2.get_path(&path(0b1010)).verify(&path(0b1010)).result());
}

#[tokio::test]
async fn test_concurrent_insertions_match_sequential_build() {
    let tree = SparseMerkleTree::new(HashAlgorithm::Sha256);
    let results = tokio::join!(
        tree.add_leaf(path(0b1000), b"a".to_vec()),
        tree.add_leaf(path(0b1001), b"b".to_vec()),
        tree.add_leaf(path(0b1010), b"c".to_vec()),
        tree.add_leaf(path(0b1011), b"d".to_vec()),
    );
    results.0.unwrap();
    results.1.unwrap();
    results.2.unwrap();
    results.3.unwrap();

    let concurrent = tree.calculate_root().await;
    let sequential = build_tree(&[(0b1000, "a"), (0b1001, "b"), (0b1010, "c"), (0b1011, "d")]).await;
    assert_eq!(concurrent.hash(), sequential.hash());
}

#[tokio::test]
async fn test_single_leaf_half() {
    let tree = SparseMerkleTree::new(HashAlgorithm::Sha256);
    tree.add_leaf(path(0b1000), b"only".to_vec()).await.unwrap();
    let root = tree.calculate_root().await;

    assert!(root.left().is_some());
    assert!(root.right().is_none());
    assert!(root.get_path(&path(0b1000)).verify(&path(0b1000)).result());

    // The empty half produces a valid non-inclusion proof
    let result = root.get_path(&path(0b1001)).verify(&path(0b1001));
    assert!(result.is_path_valid);
    assert!(!result.is_path_included);
}

#[tokio::test]
async fn test_tampered_sibling_breaks_validity() {
    let root = build_tree(&SPARSE_LEAVES).await;
    let mut proof = root.get_path(&path(0b1100));

    let step = proof
        .steps
        .iter_mut()
        .find(|step| step.sibling.is_some())
        .expect("proof should have a sibling step");
    step.sibling = Some(commit_core::DataHasher::new(HashAlgorithm::Sha256).update(b"forged").finalize());

    assert!(!proof.verify(&path(0b1100)).is_path_valid);
}

#[tokio::test]
async fn test_dto_roundtrip() {
    let root = build_tree(&SPARSE_LEAVES).await;
    let proof = root.get_path(&path(0b110010000));

    let dto = proof.to_dto();
    let json = serde_json::to_string(&dto).unwrap();
    let parsed: crate::smt::MerkleTreePathDto = serde_json::from_str(&json).unwrap();
    let restored = MerkleTreePath::from_dto(&parsed).unwrap();
    assert_eq!(proof, restored);
    assert!(restored.verify(&path(0b110010000)).result());
}

#[tokio::test]
async fn test_cbor_roundtrip() {
    let root = build_tree(&SPARSE_LEAVES).await;

    // Include a non-inclusion path so absent branches survive the codec
    for bits in [0b110010000u64, 0b1111111111] {
        let proof = root.get_path(&path(bits));
        let restored = MerkleTreePath::from_cbor(&proof.to_cbor()).unwrap();
        assert_eq!(proof, restored);
    }

    assert!(MerkleTreePath::from_cbor(&[0x00]).is_err());
}
