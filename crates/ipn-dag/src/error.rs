//! Error types for the DAG object layer.

use ipn_store::StoreError;
use ipn_types::Multihash;

/// Errors that can occur while building, reading, or patching objects.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// An object, or a block it links to, is not in the store.
    #[error("object not found: {0}")]
    NotFound(Multihash),

    /// Bytes are not a valid object encoding.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// A node already has a link with this name.
    #[error("duplicate link name: {0:?}")]
    DuplicateLinkName(String),

    /// An object could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// Any other block store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for DagError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(hash) => Self::NotFound(hash),
            other => Self::Store(other),
        }
    }
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
