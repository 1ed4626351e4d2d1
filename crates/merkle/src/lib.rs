//! Ordered Merkle tree commitments.
//!
//! The tree commits to a sequence of leaf digests in order, and its inclusion proofs bind a leaf
//! to a specific index as well as to the root. The construction:
//!
//! - leaves are `keccak256(0x00 || data)`, see [hash_leaf];
//! - interior nodes are `keccak256(0x01 || left || right)`;
//! - on a level with an odd number of nodes the last node is promoted unchanged to the next
//!   level;
//! - the root is `keccak256(0x02 || u64_be(leaf_count) || top)`, so a proof cannot reinterpret
//!   the shape of the tree it was produced for.

use ethers::{types::H256, utils::keccak256};

mod error;
pub use error::MerkleError;

mod proof;
pub use proof::OrderedProof;

mod tree;
pub use tree::OrderedMerkleTree;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;
const ROOT_PREFIX: u8 = 0x02;

/// Hashes raw leaf data into a leaf digest.
pub fn hash_leaf(data: &[u8]) -> H256 {
    let mut preimage = Vec::with_capacity(data.len() + 1);
    preimage.push(LEAF_PREFIX);
    preimage.extend_from_slice(data);
    H256::from(keccak256(preimage))
}

pub(crate) fn hash_nodes(left: &H256, right: &H256) -> H256 {
    let mut preimage = [0u8; 65];
    preimage[0] = NODE_PREFIX;
    preimage[1..33].copy_from_slice(left.as_bytes());
    preimage[33..].copy_from_slice(right.as_bytes());
    H256::from(keccak256(preimage))
}

pub(crate) fn seal_root(leaf_count: u64, top: &H256) -> H256 {
    let mut preimage = [0u8; 41];
    preimage[0] = ROOT_PREFIX;
    preimage[1..9].copy_from_slice(&leaf_count.to_be_bytes());
    preimage[9..].copy_from_slice(top.as_bytes());
    H256::from(keccak256(preimage))
}

/// Computes the root of the ordered tree over `leaves`.
pub fn build_root(leaves: &[H256]) -> H256 {
    OrderedMerkleTree::new(leaves.to_vec()).root()
}

/// Produces a proof that `leaf` sits at `index` within `leaves`.
///
/// ### Takes
/// - `leaf`: The leaf digest being proven.
/// - `index`: The zero based position of the leaf.
/// - `leaves`: The full, ordered leaf sequence.
///
/// ### Returns
/// - `Ok(OrderedProof)`: The sibling path for `index`.
/// - `Err(MerkleError)`: `index` is out of range or `leaves[index] != leaf`.
pub fn prove_ordered(leaf: H256, index: usize, leaves: &[H256]) -> Result<OrderedProof, MerkleError> {
    match leaves.get(index) {
        None => Err(MerkleError::IndexOutOfRange {
            index: index as u64,
            leaf_count: leaves.len() as u64,
        }),
        Some(found) if *found != leaf => Err(MerkleError::LeafMismatch { index: index as u64 }),
        Some(_) => OrderedMerkleTree::new(leaves.to_vec()).prove(index),
    }
}

/// Verifies that `leaf` sits at `index` in the tree committed to by `root`.
///
/// The walk up the tree is fully determined by `index` and `proof.leaf_count`: at every level
/// the parity of the running index decides whether the sibling is concatenated on the left or
/// on the right, and an unpaired last node consumes no sibling. A proof whose sibling count
/// differs from that path length is rejected outright.
pub fn verify_ordered(proof: &OrderedProof, root: H256, leaf: H256, index: u64) -> bool {
    if index >= proof.leaf_count {
        return false;
    }

    let mut siblings = proof.siblings.iter();
    let mut node = leaf;
    let mut position = index;
    let mut width = proof.leaf_count;
    while width > 1 {
        if position % 2 == 1 {
            let Some(sibling) = siblings.next() else {
                return false;
            };
            node = hash_nodes(sibling, &node);
        } else if position + 1 < width {
            let Some(sibling) = siblings.next() else {
                return false;
            };
            node = hash_nodes(&node, sibling);
        }
        position /= 2;
        width = width / 2 + width % 2;
    }

    siblings.next().is_none() && seal_root(proof.leaf_count, &node) == root
}
