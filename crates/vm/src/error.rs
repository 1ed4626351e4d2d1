//! The error type shared by all VM implementations.

use thiserror::Error;

/// The [VmError] enum covers every way a VM call can fail. All of them are decoding failures
/// of caller supplied bytes; a step over well formed values never fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// An encoded state or action has the wrong length.
    #[error("malformed {kind}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// What was being decoded.
        kind: &'static str,
        /// The required length.
        expected: usize,
        /// The supplied length.
        actual: usize,
    },
    /// An encoded state or action has the right length but an invalid layout.
    #[error("malformed {kind}: {reason}")]
    InvalidEncoding {
        /// What was being decoded.
        kind: &'static str,
        /// Why the bytes were rejected.
        reason: String,
    },
    /// More steps were requested than actions were supplied.
    #[error("cannot run {count} steps over {available} actions")]
    StepCountOutOfRange {
        /// The requested number of steps.
        count: usize,
        /// The number of supplied actions.
        available: usize,
    },
    /// No VM is registered under the given reference.
    #[error("unknown vm `{0}`")]
    UnknownVm(String),
}

impl VmError {
    /// Checks that `bytes` is exactly `expected` bytes long.
    pub(crate) fn check_len(kind: &'static str, bytes: &[u8], expected: usize) -> Result<(), Self> {
        if bytes.len() != expected {
            return Err(Self::InvalidLength {
                kind,
                expected,
                actual: bytes.len(),
            });
        }
        Ok(())
    }
}
