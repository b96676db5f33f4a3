use std::path::PathBuf;

use ipn_crypto::KeyError;
use ipn_dag::DagError;
use ipn_store::StoreError;
use ipn_types::Multihash;

use crate::repo::RepoState;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("repository already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("repository not initialized")]
    NotInitialized,

    /// The operation needs a started repository.
    #[error("repository not started (state: {0:?})")]
    NotStarted(RepoState),

    #[error("repository already started")]
    AlreadyStarted,

    /// The on-disk repository was written by an incompatible version.
    #[error("repository version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("not pinned: {0}")]
    NotPinned(Multihash),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid version file: {0:?}")]
    InvalidVersionFile(String),

    #[error("identity key error: {0}")]
    Key(#[from] KeyError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pin set error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("repository lock poisoned")]
    LockPoisoned,
}

pub type RepoResult<T> = Result<T, RepoError>;
