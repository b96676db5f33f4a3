use ipn_types::Multihash;

use crate::error::NodeResult;
use crate::node::Node;

/// `pin.*`: roots that survive gc together with everything they link to.
#[derive(Clone, Debug)]
pub struct PinGroup {
    pub(crate) node: Node,
}

impl PinGroup {
    /// Pin `hash`. Fails with `NotFound` if any block below it is missing.
    pub async fn add(&self, hash: &Multihash) -> NodeResult<()> {
        self.node.online()?;
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.repository().pin_add(&hash)?))
            .await
    }

    /// Unpin `hash`. Fails with `NotPinned` if it was not pinned.
    pub async fn rm(&self, hash: &Multihash) -> NodeResult<()> {
        self.node.online()?;
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.repository().pin_rm(&hash)?))
            .await
    }

    pub async fn ls(&self) -> NodeResult<Vec<Multihash>> {
        self.node.online()?;
        Ok(self.node.repository().pin_ls()?)
    }
}

#[cfg(test)]
mod tests {
    use ipn_dag::{DagError, DagLink, DagNode};
    use ipn_repo::RepoError;
    use ipn_swarm::MemoryNetwork;

    use crate::{NodeError, NodeOptions};

    use super::*;

    #[tokio::test]
    async fn pin_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::create(NodeOptions::new(dir.path()), MemoryNetwork::new())
            .await
            .unwrap();
        let genesis = node.pin().ls().await.unwrap();
        assert_eq!(genesis.len(), 2);

        let hash = node.object().put(DagNode::with_data(b"keep".to_vec())).await.unwrap();
        node.pin().add(&hash).await.unwrap();
        assert!(node.pin().ls().await.unwrap().contains(&hash));

        node.pin().rm(&hash).await.unwrap();
        assert!(matches!(
            node.pin().rm(&hash).await,
            Err(NodeError::Repo(RepoError::NotPinned(_)))
        ));
    }

    #[tokio::test]
    async fn pinning_a_dangling_tree_fails() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::create(NodeOptions::new(dir.path()), MemoryNetwork::new())
            .await
            .unwrap();
        let missing = node.block().put(&b"soon gone"[..]).await.unwrap();
        let mut parent = DagNode::new();
        parent.add_link(DagLink::new("x", missing, 9)).unwrap();
        let parent = node.object().put(parent).await.unwrap();
        node.block().rm(&missing).await.unwrap();

        assert!(matches!(
            node.pin().add(&parent).await,
            Err(NodeError::Repo(RepoError::Dag(DagError::NotFound(h)))) if h == missing
        ));
    }
}
