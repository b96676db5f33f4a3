use ipn_types::Multihash;

/// Errors from block store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested block was not found.
    #[error("block not found: {0}")]
    NotFound(Multihash),

    /// Stored bytes no longer hash to their key (data corruption).
    #[error("hash mismatch for {hash}: content hashes to {computed}")]
    HashMismatch { hash: Multihash, computed: Multihash },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
