use ipn_dag::{DagLink, DagNode, LinkRef, ObjectInput, ObjectStat, ObjectTemplate};
use ipn_types::Multihash;
use tracing::debug;

use crate::error::NodeResult;
use crate::node::Node;

/// `object.*`: DAG nodes by hash.
#[derive(Clone, Debug)]
pub struct ObjectGroup {
    pub(crate) node: Node,
}

impl ObjectGroup {
    /// Store an empty node, or the node for `template`, and return its hash.
    pub async fn new(&self, template: Option<ObjectTemplate>) -> NodeResult<Multihash> {
        self.node
            .blocking(move |node| Ok(node.online()?.objects.create(template)?))
            .await
    }

    pub async fn put(&self, input: impl Into<ObjectInput>) -> NodeResult<Multihash> {
        let input = input.into();
        let hash = self
            .node
            .blocking(move |node| Ok(node.online()?.objects.put(input)?))
            .await?;
        debug!(hash = %hash, "object put");
        Ok(hash)
    }

    pub async fn get(&self, hash: &Multihash) -> NodeResult<DagNode> {
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.online()?.objects.get(&hash)?))
            .await
    }

    pub async fn data(&self, hash: &Multihash) -> NodeResult<Vec<u8>> {
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.online()?.objects.data(&hash)?))
            .await
    }

    pub async fn links(&self, hash: &Multihash) -> NodeResult<Vec<DagLink>> {
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.online()?.objects.links(&hash)?))
            .await
    }

    pub async fn stat(&self, hash: &Multihash) -> NodeResult<ObjectStat> {
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.online()?.objects.stat(&hash)?))
            .await
    }

    /// A link named `name` to the stored object `hash`, sized from its stat.
    pub async fn link_to(&self, name: impl Into<String>, hash: &Multihash) -> NodeResult<DagLink> {
        let (name, hash) = (name.into(), *hash);
        self.node
            .blocking(move |node| Ok(node.online()?.objects.link_to(name, &hash)?))
            .await
    }

    pub fn patch(&self) -> PatchGroup {
        PatchGroup {
            node: self.node.clone(),
        }
    }
}

/// `object.patch.*`: derive new nodes from stored ones. The source node is
/// never modified; each call returns the hash of a new node.
#[derive(Clone, Debug)]
pub struct PatchGroup {
    node: Node,
}

impl PatchGroup {
    pub async fn add_link(&self, hash: &Multihash, link: DagLink) -> NodeResult<Multihash> {
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.online()?.patch.add_link(&hash, link)?))
            .await
    }

    /// Removing a link that is not there returns `hash` unchanged.
    pub async fn rm_link(
        &self,
        hash: &Multihash,
        link: impl Into<LinkRef>,
    ) -> NodeResult<Multihash> {
        let (hash, link) = (*hash, link.into());
        self.node
            .blocking(move |node| Ok(node.online()?.patch.rm_link(&hash, link)?))
            .await
    }

    pub async fn append_data(&self, hash: &Multihash, data: &[u8]) -> NodeResult<Multihash> {
        let (hash, data) = (*hash, data.to_vec());
        self.node
            .blocking(move |node| Ok(node.online()?.patch.append_data(&hash, &data)?))
            .await
    }

    pub async fn set_data(
        &self,
        hash: &Multihash,
        data: impl Into<Vec<u8>>,
    ) -> NodeResult<Multihash> {
        let (hash, data) = (*hash, data.into());
        self.node
            .blocking(move |node| Ok(node.online()?.patch.set_data(&hash, data)?))
            .await
    }
}

#[cfg(test)]
mod tests {
    use ipn_crypto::ContentHasher;
    use ipn_dag::{unixfs, ObjectEncoding};
    use ipn_swarm::MemoryNetwork;
    use tempfile::TempDir;

    use crate::{with_callback, NodeError, NodeOptions};

    use super::*;

    async fn node() -> (TempDir, Node) {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::create(NodeOptions::new(dir.path()), MemoryNetwork::new())
            .await
            .unwrap();
        (dir, node)
    }

    #[tokio::test]
    async fn unixfs_dir_template() {
        let (_dir, node) = node().await;
        let hash = node.object().new(Some(ObjectTemplate::UnixfsDir)).await.unwrap();
        assert_eq!(node.object().get(&hash).await.unwrap(), unixfs::directory_node().unwrap());
    }

    #[tokio::test]
    async fn put_json_then_stat() {
        let (_dir, node) = node().await;
        let objects = node.object();
        let child = objects.put(DagNode::with_data(b"leaf".to_vec())).await.unwrap();

        let json = format!(
            r#"{{"Data":"root","Links":[{{"Name":"c","Hash":"{}","Size":4}}]}}"#,
            child.to_base58()
        );
        let root = objects
            .put(ObjectInput::Encoded {
                bytes: json.into_bytes(),
                encoding: ObjectEncoding::Json,
            })
            .await
            .unwrap();

        let links = objects.links(&root).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, child);

        let stat = objects.stat(&root).await.unwrap();
        assert_eq!(stat.num_links, 1);
        assert_eq!(stat.data_size, 4);
        let child_size = objects.stat(&child).await.unwrap().block_size;
        assert_eq!(stat.cumulative_size, stat.block_size + child_size);
    }

    #[tokio::test]
    async fn add_then_rm_link_restores_the_node() {
        let (_dir, node) = node().await;
        let objects = node.object();
        let patch = objects.patch();

        let base = objects.put(DagNode::with_data(b"base".to_vec())).await.unwrap();
        let target = objects.new(None).await.unwrap();
        let link = objects.link_to("child", &target).await.unwrap();

        let linked = patch.add_link(&base, link.clone()).await.unwrap();
        assert!(matches!(
            patch.add_link(&linked, link).await,
            Err(NodeError::Dag(ipn_dag::DagError::DuplicateLinkName(_)))
        ));

        assert_eq!(patch.rm_link(&linked, "child").await.unwrap(), base);
        assert_eq!(patch.rm_link(&base, "missing").await.unwrap(), base);
    }

    #[tokio::test]
    async fn append_data_extends() {
        let (_dir, node) = node().await;
        let objects = node.object();
        let h = objects.put(DagNode::with_data(b"ab".to_vec())).await.unwrap();
        let h2 = objects.patch().append_data(&h, b"cd").await.unwrap();
        assert_eq!(objects.data(&h2).await.unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let (_dir, node) = node().await;
        let ghost = ContentHasher::SHA2_256.hash(b"ghost");
        assert!(matches!(
            node.object().get(&ghost).await,
            Err(NodeError::Dag(ipn_dag::DagError::NotFound(h))) if h == ghost
        ));
    }

    #[tokio::test]
    async fn callback_style_get() {
        let (_dir, node) = node().await;
        let objects = node.object();
        let hash = objects.new(None).await.unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel();
        with_callback(async move { objects.get(&hash).await }, move |res| {
            let _ = tx.send(res.map(|n| n.is_empty()));
        });
        assert!(rx.await.unwrap().unwrap());
    }
}
