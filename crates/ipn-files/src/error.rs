use ipn_dag::DagError;
use ipn_types::Multihash;

/// Errors from file import and export.
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// `cat` was pointed at a directory.
    #[error("{0} is a directory")]
    IsDirectory(Multihash),

    /// The object's data segment is not unixfs.
    #[error("{0} is not a unixfs object")]
    NotUnixfs(Multihash),

    /// An entry path is empty or has an empty, `.`, or `..` component.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Two entries claim the same path, or a file is used as a directory.
    #[error("conflicting entries at {0:?}")]
    PathConflict(String),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    /// A background import or export task failed to complete.
    #[error("file task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type FilesResult<T> = Result<T, FilesError>;
