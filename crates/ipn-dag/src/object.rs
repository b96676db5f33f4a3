//! The object layer: store, fetch, and summarize [`DagNode`]s.
//!
//! [`ObjectApi`] is a thin, stateless handle over a block store. It keeps
//! no node cache; every call goes to the store, so a handle can be cloned
//! freely and shared across tasks.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ipn_crypto::ContentHasher;
use ipn_store::{Block, BlockStore};
use ipn_types::Multihash;

use crate::codec;
use crate::error::{DagError, DagResult};
use crate::node::{DagLink, DagNode};
use crate::unixfs;
use crate::walk;

/// Pre-built node shapes accepted by [`ObjectApi::new_node`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectTemplate {
    /// An empty unixfs directory.
    UnixfsDir,
}

impl FromStr for ObjectTemplate {
    type Err = DagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unixfs-dir" => Ok(Self::UnixfsDir),
            other => Err(DagError::DecodeError(format!("unknown template {other:?}"))),
        }
    }
}

/// How encoded object bytes are to be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectEncoding {
    /// `{"Data": "...", "Links": [{"Name", "Hash", "Size"}]}`
    Json,
    /// The block encoding, as returned by `block.get`.
    Binary,
}

/// Input accepted by [`ObjectApi::put`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectInput {
    Node(DagNode),
    Encoded {
        bytes: Vec<u8>,
        encoding: ObjectEncoding,
    },
}

impl From<DagNode> for ObjectInput {
    fn from(node: DagNode) -> Self {
        Self::Node(node)
    }
}

impl ObjectInput {
    fn into_node(self) -> DagResult<DagNode> {
        match self {
            Self::Node(node) => Ok(node),
            Self::Encoded {
                bytes,
                encoding: ObjectEncoding::Json,
            } => codec::decode_json(&bytes),
            Self::Encoded {
                bytes,
                encoding: ObjectEncoding::Binary,
            } => codec::decode(&bytes),
        }
    }
}

/// Derived summary of a stored object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStat {
    pub hash: Multihash,
    pub num_links: usize,
    /// Size of the encoded block.
    pub block_size: u64,
    /// Encoded bytes not taken up by the data segment.
    pub links_size: u64,
    pub data_size: u64,
    /// Sum of block sizes over every distinct block reachable from `hash`,
    /// `hash` included.
    pub cumulative_size: u64,
}

/// Object operations over a block store.
#[derive(Clone)]
pub struct ObjectApi {
    store: Arc<dyn BlockStore>,
    hasher: ContentHasher,
}

impl ObjectApi {
    pub fn new(store: Arc<dyn BlockStore>, hasher: ContentHasher) -> Self {
        Self { store, hasher }
    }

    pub fn store(&self) -> &Arc<dyn BlockStore> {
        &self.store
    }

    pub fn hasher(&self) -> ContentHasher {
        self.hasher
    }

    /// Build (without storing) an empty node or a template node.
    pub fn new_node(&self, template: Option<ObjectTemplate>) -> DagResult<DagNode> {
        match template {
            None => Ok(DagNode::new()),
            Some(ObjectTemplate::UnixfsDir) => unixfs::directory_node(),
        }
    }

    /// Build and store an empty or template node.
    pub fn create(&self, template: Option<ObjectTemplate>) -> DagResult<Multihash> {
        let node = self.new_node(template)?;
        self.put_node(&node)
    }

    /// Store an object and return its hash. Storing the same object twice
    /// returns the same hash.
    pub fn put(&self, input: impl Into<ObjectInput>) -> DagResult<Multihash> {
        let node = input.into().into_node()?;
        self.put_node(&node)
    }

    pub fn put_node(&self, node: &DagNode) -> DagResult<Multihash> {
        let block = Block::new(&self.hasher, codec::encode(node)?);
        let hash = self.store.put(&block)?;
        debug!(hash = %hash, links = node.links().len(), data = node.data().len(), "put object");
        Ok(hash)
    }

    /// Fetch and decode an object.
    pub fn get(&self, hash: &Multihash) -> DagResult<DagNode> {
        let block = self.store.get(hash)?;
        codec::decode(block.data())
    }

    pub fn data(&self, hash: &Multihash) -> DagResult<Vec<u8>> {
        Ok(self.get(hash)?.into_parts().0)
    }

    pub fn links(&self, hash: &Multihash) -> DagResult<Vec<DagLink>> {
        Ok(self.get(hash)?.into_parts().1)
    }

    pub fn stat(&self, hash: &Multihash) -> DagResult<ObjectStat> {
        let block = self.store.get(hash)?;
        let node = codec::decode(block.data())?;
        let block_size = block.len() as u64;
        let data_size = node.data().len() as u64;

        let reachable = walk::reachable(self.store.as_ref(), [*hash])?;
        let cumulative_size: u64 = reachable.values().sum();
        debug!(hash = %hash, blocks = reachable.len(), cumulative_size, "stat object");

        Ok(ObjectStat {
            hash: *hash,
            num_links: node.links().len(),
            block_size,
            links_size: block_size - data_size,
            data_size,
            cumulative_size,
        })
    }

    /// A link to a stored object, sized by its cumulative size.
    pub fn link_to(&self, name: impl Into<String>, hash: &Multihash) -> DagResult<DagLink> {
        let stat = self.stat(hash)?;
        Ok(DagLink::new(name, *hash, stat.cumulative_size))
    }
}

impl fmt::Debug for ObjectApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectApi")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}
