//! Errors reported by storages, histograms, and the byte codec.
//!
//! Arithmetic on bin counts never fails: the widest classes absorb any value.
//! What can fail is addressing (a bin or axis index out of range), arity
//! (the wrong number of per-axis arguments), asking a storage for something
//! it does not track, and decoding bytes that were not produced by `encode`.

/// Errors surfaced by the public operations of this crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A flat bin index at or beyond the number of bins.
    #[error("bin index {index} out of range for storage of {size} bins")]
    IndexOutOfRange { index: usize, size: usize },

    /// Per-axis indices that do not address a bin, including any reserved flow bins.
    #[error("axis indices {indices:?} do not address a bin")]
    InvalidIndex { indices: Vec<i32> },

    /// The number of per-axis arguments differs from the number of axes.
    #[error("expected {expected} per-axis arguments, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The storage cannot perform the named operation.
    #[error("{0} is not supported by this storage")]
    UnsupportedOperation(&'static str),

    /// Histograms with different axes cannot be combined.
    #[error("axes of histograms differ")]
    IncompatibleAxes,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Reasons a byte payload was rejected by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown representation tag {0}")]
    UnknownTag(u8),

    /// The payload ended before a complete value could be read.
    #[error("payload truncated: needed {needed} more bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// The payload length disagrees with the declared number of bins.
    #[error("payload holds {actual} bytes beyond the declared {expected} bins")]
    LengthMismatch { expected: usize, actual: usize },

    /// A varint ran past the width of a `u64`.
    #[error("varint exceeds 64 bits")]
    VarintOverflow,
}
