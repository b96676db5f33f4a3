use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ipn_repo::{GcReport, InitOptions};

use crate::error::NodeResult;
use crate::node::Node;

/// Answer to [`RepoGroup::stat`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStat {
    pub num_objects: usize,
    /// Total size of all stored blocks in bytes.
    pub repo_size: u64,
    pub path: PathBuf,
    pub version: u32,
}

/// `repo.*`: the repository behind the node.
#[derive(Clone, Debug)]
pub struct RepoGroup {
    pub(crate) node: Node,
}

impl RepoGroup {
    /// Same as [`Node::init`].
    pub async fn init(&self, options: &InitOptions) -> NodeResult<()> {
        self.node.init(options).await
    }

    pub async fn version(&self) -> NodeResult<u32> {
        self.node
            .blocking(|node| Ok(node.repository().version()?))
            .await
    }

    pub fn path(&self) -> PathBuf {
        self.node.repository().path().to_path_buf()
    }

    /// Delete every block not reachable from a pin. Stores and reads wait
    /// until the sweep is done.
    pub async fn gc(&self) -> NodeResult<GcReport> {
        self.node.online()?;
        self.node
            .blocking(|node| Ok(node.repository().gc()?))
            .await
    }

    pub async fn stat(&self) -> NodeResult<RepoStat> {
        self.node.online()?;
        self.node
            .blocking(|node| {
                let repo = node.repository();
                let usage = repo.usage()?;
                Ok(RepoStat {
                    num_objects: usage.num_objects,
                    repo_size: usage.repo_size,
                    path: repo.path().to_path_buf(),
                    version: repo.version()?,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use ipn_dag::DagNode;
    use ipn_repo::REPO_VERSION;
    use ipn_swarm::MemoryNetwork;

    use crate::{NodeError, NodeOptions};

    use super::*;

    #[tokio::test]
    async fn gc_keeps_pinned_files() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::create(NodeOptions::new(dir.path()), MemoryNetwork::new())
            .await
            .unwrap();

        let loose = node.block().put(&b"unpinned"[..]).await.unwrap();
        let file = node.files().add("keep me").await.unwrap();
        node.pin().add(&file.hash).await.unwrap();

        let report = node.repo().gc().await.unwrap();
        assert_eq!(report.removed, vec![loose]);
        assert!(report.failed.is_empty());
        assert_eq!(node.files().cat(&file.hash).await.unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn gc_needs_a_started_node() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::new(NodeOptions::new(dir.path()), MemoryNetwork::new());
        assert!(matches!(node.repo().gc().await, Err(NodeError::NotInitialized)));
    }

    #[tokio::test]
    async fn path_version_and_stat() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::create(NodeOptions::new(dir.path()), MemoryNetwork::new())
            .await
            .unwrap();
        let repo = node.repo();
        assert_eq!(repo.path(), dir.path());
        assert_eq!(repo.version().await.unwrap(), REPO_VERSION);

        let before = repo.stat().await.unwrap();
        assert_eq!(before.num_objects, 2);

        node.object()
            .put(DagNode::with_data(b"one more".to_vec()))
            .await
            .unwrap();
        let after = repo.stat().await.unwrap();
        assert_eq!(after.num_objects, 3);
        assert!(after.repo_size > before.repo_size);
        assert_eq!(after.version, REPO_VERSION);
    }

    #[tokio::test]
    async fn reinit_of_a_started_node_fails() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::create(NodeOptions::new(dir.path()), MemoryNetwork::new())
            .await
            .unwrap();
        let err = node
            .repo()
            .init(&InitOptions {
                force: true,
                ..InitOptions::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::Repo(ipn_repo::RepoError::AlreadyInitialized(_))
        ));
    }
}
