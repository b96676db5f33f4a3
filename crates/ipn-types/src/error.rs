use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid base58 string: {0}")]
    InvalidBase58(String),

    #[error("malformed multihash: {0}")]
    InvalidMultihash(String),

    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unsupported multihash code: 0x{0:02x}")]
    UnknownHashCode(u64),

    #[error("unknown hash algorithm: {0}")]
    UnknownHashAlgorithm(String),
}
