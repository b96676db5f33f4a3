use ipn_dag::DagError;
use ipn_files::FilesError;
use ipn_repo::RepoError;
use ipn_store::StoreError;
use ipn_swarm::SwarmError;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The operation needs a started node.
    #[error("node is not online; call start first")]
    NotInitialized,

    #[error("node already started")]
    AlreadyStarted,

    #[error("repo error: {0}")]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error(transparent)]
    Files(#[from] FilesError),

    #[error("swarm error: {0}")]
    Swarm(#[from] SwarmError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("node state lock poisoned")]
    LockPoisoned,

    #[error("background task failed: {0}")]
    Task(String),
}

pub type NodeResult<T> = Result<T, NodeError>;
