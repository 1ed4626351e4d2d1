//! The proof module holds the [OrderedProof] type and its byte encoding.

use crate::MerkleError;
use ethers::types::{Bytes, H256};
use serde::{Deserialize, Serialize};

const COUNT_SIZE: usize = 8;
const DIGEST_SIZE: usize = 32;

/// An inclusion proof binding a leaf to its position in an [crate::OrderedMerkleTree].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedProof {
    /// The number of leaves in the tree the proof was produced for.
    pub leaf_count: u64,
    /// The sibling digests from the leaf level upwards. Levels where the path node is
    /// promoted unpaired contribute no sibling.
    pub siblings: Vec<H256>,
}

impl OrderedProof {
    /// Encodes the proof as `u64_be(leaf_count) || sibling_0 || .. || sibling_n`.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(COUNT_SIZE + self.siblings.len() * DIGEST_SIZE);
        out.extend_from_slice(&self.leaf_count.to_be_bytes());
        for sibling in &self.siblings {
            out.extend_from_slice(sibling.as_bytes());
        }
        Bytes::from(out)
    }

    /// Decodes a proof from its byte encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MerkleError> {
        if bytes.len() < COUNT_SIZE || (bytes.len() - COUNT_SIZE) % DIGEST_SIZE != 0 {
            return Err(MerkleError::MalformedProof(bytes.len()));
        }
        let (count, siblings) = bytes.split_at(COUNT_SIZE);
        let mut count_bytes = [0u8; COUNT_SIZE];
        count_bytes.copy_from_slice(count);
        Ok(Self {
            leaf_count: u64::from_be_bytes(count_bytes),
            siblings: siblings
                .chunks_exact(DIGEST_SIZE)
                .map(H256::from_slice)
                .collect(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_ragged_encodings() {
        assert_eq!(
            OrderedProof::from_bytes(&[0u8; 7]),
            Err(MerkleError::MalformedProof(7))
        );
        assert_eq!(
            OrderedProof::from_bytes(&[0u8; 8 + 31]),
            Err(MerkleError::MalformedProof(39))
        );
    }

    #[test]
    fn decodes_what_it_encodes() {
        let proof = OrderedProof {
            leaf_count: 5,
            siblings: vec![H256::repeat_byte(0xaa), H256::repeat_byte(0xbb)],
        };
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), 8 + 64);
        assert_eq!(OrderedProof::from_bytes(&bytes), Ok(proof));
    }
}
