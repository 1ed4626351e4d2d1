use thiserror::Error;

/// The [MerkleError] enum describes why a proof could not be produced or decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("index {index} is out of range for a tree of {leaf_count} leaves")]
    IndexOutOfRange { index: u64, leaf_count: u64 },
    #[error("the leaf at index {index} does not match the supplied leaf")]
    LeafMismatch { index: u64 },
    #[error("malformed proof: {0} bytes is not a leaf count followed by whole digests")]
    MalformedProof(usize),
}
