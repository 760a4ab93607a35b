use thiserror::Error;

/// A payload that claims to be ours (correct magic, known op type) but
/// cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload header truncated: {0} bytes")]
    TruncatedHeader(usize),

    #[error("wrong payload length for op {op:#06x}: expected {expected}, got {actual}")]
    LengthMismatch {
        op: u16,
        expected: usize,
        actual: usize,
    },

    #[error("memo too long: {len} > {max}")]
    MemoTooLong { len: usize, max: usize },

    #[error("non-zero padding after memo")]
    NonZeroPadding,

    #[error("value {value} outside [{min}, {max}]")]
    ValueOutOfRange { value: i16, min: i16, max: i16 },
}
