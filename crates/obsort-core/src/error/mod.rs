//! Error types surfaced by the sort engine.
//!
//! Nothing here is recovered internally: the sort aborts on the first error
//! and returns it to the caller, who pattern-matches on the kind. The usual
//! remedy for [`SortError::BucketOverflow`] is retrying with a larger bucket
//! capacity.

use std::fmt;

use thiserror::Error;

/// Which output of a MergeSplit pair would have exceeded capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowSide {
    /// The bucket receiving records whose routed bit is 0.
    Output0,
    /// The bucket receiving records whose routed bit is 1.
    Output1,
}

impl fmt::Display for OverflowSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output0 => f.write_str("output 0"),
            Self::Output1 => f.write_str("output 1"),
        }
    }
}

/// Failure raised by an untrusted store backend.
///
/// The in-memory reference store never fails; backends with a real I/O path
/// report through here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Errors produced by a sort invocation.
#[derive(Debug, Error)]
pub enum SortError {
    /// The input size and bucket capacity are inconsistent, or the
    /// configuration itself is invalid. Not retriable.
    #[error("invalid parameters: {reason}")]
    Parameter { reason: String },

    /// The random bin assignment routed more than Z real records toward one
    /// output bucket. Retriable with a larger bucket capacity.
    #[error("bucket overflow at level {level}, pair {pair_index}, {side}")]
    BucketOverflow {
        level: u32,
        pair_index: u32,
        side: OverflowSide,
    },

    /// A sealed record read back from the store could not be opened. Fatal.
    #[error("decryption failed: {reason}")]
    Decryption { reason: String },

    /// The untrusted store itself failed.
    #[error("store: {0}")]
    Io(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_display_names_side() {
        let err = SortError::BucketOverflow {
            level: 2,
            pair_index: 7,
            side: OverflowSide::Output1,
        };
        assert_eq!(
            err.to_string(),
            "bucket overflow at level 2, pair 7, output 1"
        );
    }

    #[test]
    fn store_error_converts() {
        let err: SortError = StoreError::Backend("disk gone".into()).into();
        assert!(matches!(err, SortError::Io(_)));
    }
}
