//! The tree module holds the [OrderedMerkleTree].

use crate::{hash_leaf, hash_nodes, seal_root, MerkleError, OrderedProof};
use ethers::types::H256;

/// A fully built ordered Merkle tree.
#[derive(Debug, Clone, Default)]
pub struct OrderedMerkleTree {
    /// Every level of the tree, leaves first. The last level holds the single top node, or is
    /// absent for an empty tree.
    levels: Vec<Vec<H256>>,
}

impl OrderedMerkleTree {
    /// Builds the tree over already hashed leaves.
    pub fn new(leaves: Vec<H256>) -> Self {
        if leaves.is_empty() {
            return Self::default();
        }

        let mut levels = vec![leaves];
        loop {
            let level = &levels[levels.len() - 1];
            if level.len() == 1 {
                break;
            }
            let next = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_nodes(left, right),
                    [lone] => *lone,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            levels.push(next);
        }
        Self { levels }
    }

    /// Builds the tree over raw leaf data, hashing each item with [hash_leaf].
    pub fn from_data<T: AsRef<[u8]>>(data: &[T]) -> Self {
        Self::new(data.iter().map(|item| hash_leaf(item.as_ref())).collect())
    }

    /// Returns the number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Returns the root, which commits to both the leaves and their count.
    pub fn root(&self) -> H256 {
        let top = self
            .levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_default();
        seal_root(self.leaf_count() as u64, &top)
    }

    /// Produces the inclusion proof for the leaf at `index`.
    pub fn prove(&self, index: usize) -> Result<OrderedProof, MerkleError> {
        if index >= self.leaf_count() {
            return Err(MerkleError::IndexOutOfRange {
                index: index as u64,
                leaf_count: self.leaf_count() as u64,
            });
        }

        let mut siblings = Vec::with_capacity(self.levels.len());
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = if position % 2 == 1 {
                Some(position - 1)
            } else if position + 1 < level.len() {
                Some(position + 1)
            } else {
                None
            };
            siblings.extend(sibling.map(|i| level[i]));
            position /= 2;
        }

        Ok(OrderedProof {
            leaf_count: self.leaf_count() as u64,
            siblings,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{build_root, prove_ordered, verify_ordered};
    use proptest::prelude::*;

    fn leaves(n: usize) -> Vec<H256> {
        (0..n)
            .map(|i| hash_leaf(&(i as u64).to_be_bytes()))
            .collect()
    }

    #[test]
    fn proofs_verify_for_every_index() {
        for n in 1..=33 {
            let leaves = leaves(n);
            let root = build_root(&leaves);
            for (i, leaf) in leaves.iter().enumerate() {
                let proof = prove_ordered(*leaf, i, &leaves).unwrap();
                assert!(verify_ordered(&proof, root, *leaf, i as u64), "n = {n}, i = {i}");
            }
        }
    }

    #[test]
    fn lone_node_is_promoted() {
        let leaves = leaves(3);
        let tree = OrderedMerkleTree::new(leaves.clone());
        let top = hash_nodes(&hash_nodes(&leaves[0], &leaves[1]), &leaves[2]);
        assert_eq!(tree.root(), seal_root(3, &top));
        // The promoted leaf has a single sibling: the node above the first pair.
        assert_eq!(tree.prove(2).unwrap().siblings.len(), 1);
    }

    #[test]
    fn single_leaf_has_empty_path() {
        let leaves = leaves(1);
        let proof = prove_ordered(leaves[0], 0, &leaves).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(verify_ordered(&proof, build_root(&leaves), leaves[0], 0));
    }

    #[test]
    fn proof_is_bound_to_its_position() {
        let leaves = leaves(8);
        let root = build_root(&leaves);
        let proof = prove_ordered(leaves[3], 3, &leaves).unwrap();
        for other in (0..8u64).filter(|i| *i != 3) {
            assert!(!verify_ordered(&proof, root, leaves[3], other));
        }
        // The same leaf value cannot be claimed for a neighbour's slot either.
        assert!(!verify_ordered(&proof, root, leaves[2], 3));
    }

    #[test]
    fn leaf_count_cannot_be_reinterpreted() {
        // With three leaves the last leaf is promoted, so a two leaf reading of the same top
        // node would place it at index 1. The sealed root rules that out.
        let leaves = leaves(3);
        let root = build_root(&leaves);
        let forged = OrderedProof {
            leaf_count: 2,
            siblings: vec![hash_nodes(&leaves[0], &leaves[1])],
        };
        assert!(!verify_ordered(&forged, root, leaves[2], 1));
    }

    #[test]
    fn rejects_wrong_path_lengths() {
        let leaves = leaves(6);
        let root = build_root(&leaves);
        let mut proof = prove_ordered(leaves[4], 4, &leaves).unwrap();
        proof.siblings.push(H256::zero());
        assert!(!verify_ordered(&proof, root, leaves[4], 4));
        proof.siblings.truncate(proof.siblings.len() - 2);
        assert!(!verify_ordered(&proof, root, leaves[4], 4));
    }

    #[test]
    fn rejects_out_of_range_requests() {
        let leaves = leaves(4);
        assert_eq!(
            prove_ordered(leaves[0], 4, &leaves),
            Err(MerkleError::IndexOutOfRange {
                index: 4,
                leaf_count: 4
            })
        );
        assert_eq!(
            prove_ordered(leaves[0], 1, &leaves),
            Err(MerkleError::LeafMismatch { index: 1 })
        );
        let proof = prove_ordered(leaves[3], 3, &leaves).unwrap();
        assert!(!verify_ordered(&proof, build_root(&leaves), leaves[3], 4));
    }

    #[test]
    fn empty_tree_has_a_root() {
        let tree = OrderedMerkleTree::new(vec![]);
        assert_eq!(tree.leaf_count(), 0);
        assert_eq!(tree.root(), seal_root(0, &H256::zero()));
        assert!(tree.prove(0).is_err());
    }

    proptest! {
        #[test]
        fn corrupted_proof_bytes_never_verify(
            n in 1usize..40,
            seed in any::<usize>(),
            offset in any::<usize>(),
            flip in 1u8..=255,
        ) {
            let leaves = leaves(n);
            let index = seed % n;
            let root = build_root(&leaves);
            let mut bytes = prove_ordered(leaves[index], index, &leaves).unwrap().to_bytes().to_vec();
            let at = offset % bytes.len();
            bytes[at] ^= flip;
            if let Ok(proof) = OrderedProof::from_bytes(&bytes) {
                prop_assert!(!verify_ordered(&proof, root, leaves[index], index as u64));
            }
        }

        #[test]
        fn corrupted_index_or_root_never_verifies(
            n in 2usize..40,
            seed in any::<usize>(),
            shift in 1usize..40,
            byte in 0usize..32,
            flip in 1u8..=255,
        ) {
            let leaves = leaves(n);
            let index = seed % n;
            let root = build_root(&leaves);
            let proof = prove_ordered(leaves[index], index, &leaves).unwrap();

            let wrong_index = (index + 1 + shift % (n - 1)) % n;
            prop_assert!(!verify_ordered(&proof, root, leaves[index], wrong_index as u64));

            let mut wrong_root = root;
            wrong_root.as_bytes_mut()[byte] ^= flip;
            prop_assert!(!verify_ordered(&proof, wrong_root, leaves[index], index as u64));
        }
    }
}
