use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ipn_store::{Block, StoreError};
use ipn_types::Multihash;

use crate::error::NodeResult;
use crate::node::Node;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStat {
    pub hash: Multihash,
    pub size: u64,
}

/// `block.*`: raw blocks, bypassing the DAG encoding.
#[derive(Clone, Debug)]
pub struct BlockGroup {
    pub(crate) node: Node,
}

impl BlockGroup {
    pub async fn put(&self, data: impl Into<Bytes>) -> NodeResult<Multihash> {
        let data: Bytes = data.into();
        self.node
            .blocking(move |node| {
                let online = node.online()?;
                let block = Block::new(&online.objects.hasher(), data);
                let hash = online.objects.store().put(&block)?;
                debug!(hash = %hash, size = block.len(), "block put");
                Ok(hash)
            })
            .await
    }

    pub async fn get(&self, hash: &Multihash) -> NodeResult<Bytes> {
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.online()?.objects.store().get(&hash)?.into_data()))
            .await
    }

    pub async fn stat(&self, hash: &Multihash) -> NodeResult<BlockStat> {
        let hash = *hash;
        self.node
            .blocking(move |node| {
                let size = node.online()?.objects.store().size(&hash)?;
                Ok(BlockStat { hash, size })
            })
            .await
    }

    /// Delete a block, pinned or not. Fails with `NotFound` if absent.
    pub async fn rm(&self, hash: &Multihash) -> NodeResult<()> {
        let hash = *hash;
        self.node
            .blocking(move |node| {
                if !node.online()?.objects.store().delete(&hash)? {
                    return Err(StoreError::NotFound(hash).into());
                }
                debug!(hash = %hash, "block removed");
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use ipn_swarm::MemoryNetwork;

    use crate::{NodeError, NodeOptions};

    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn put_get_stat_rm() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::create(NodeOptions::new(dir.path()), MemoryNetwork::new())
            .await
            .unwrap();
        let blocks = node.block();

        let hash = blocks.put(&b"raw bytes"[..]).await.unwrap();
        assert_eq!(blocks.put(&b"raw bytes"[..]).await.unwrap(), hash);
        assert_eq!(&blocks.get(&hash).await.unwrap()[..], b"raw bytes");
        assert_eq!(
            blocks.stat(&hash).await.unwrap(),
            BlockStat { hash, size: 9 }
        );

        blocks.rm(&hash).await.unwrap();
        assert!(matches!(
            blocks.get(&hash).await,
            Err(NodeError::Store(StoreError::NotFound(_)))
        ));
        assert!(matches!(
            blocks.rm(&hash).await,
            Err(NodeError::Store(StoreError::NotFound(h))) if h == hash
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn puts_during_a_sweep_leave_the_runtime_free() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::create(NodeOptions::new(dir.path()), MemoryNetwork::new())
            .await
            .unwrap();
        let store = node.repository().store().unwrap();

        let sweep = store.exclusive().unwrap();
        let mut put = tokio::spawn({
            let blocks = node.block();
            async move { blocks.put(&b"queued"[..]).await }
        });
        assert!(tokio::time::timeout(Duration::from_millis(50), &mut put)
            .await
            .is_err());

        drop(sweep);
        let hash = put.await.unwrap().unwrap();
        assert_eq!(&node.block().get(&hash).await.unwrap()[..], b"queued");
    }
}
