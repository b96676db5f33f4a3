//! The unixfs data format: what a node's data segment means when the node
//! is part of a file tree.
//!
//! Directories are nodes whose data is [`UnixfsData::Directory`] and whose
//! named links are the entries. Files are nodes whose data is
//! [`UnixfsData::File`]; a small file keeps its bytes inline, a large one
//! links (unnamed, in order) to leaf file nodes and records each leaf's
//! file size in `block_sizes`.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::{DagError, DagResult};
use crate::node::DagNode;

/// Current unixfs data format version.
pub const UNIXFS_VERSION: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnixfsData {
    Directory,
    File {
        /// Inline bytes held by this node.
        data: Vec<u8>,
        /// Total file bytes below this node, inline data included.
        file_size: u64,
        /// File size of each linked child, in link order.
        block_sizes: Vec<u64>,
    },
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

impl UnixfsData {
    /// A single-node file holding `data` inline.
    pub fn leaf(data: Vec<u8>) -> Self {
        let file_size = data.len() as u64;
        Self::File {
            data,
            file_size,
            block_sizes: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Total file bytes, zero for directories.
    pub fn file_size(&self) -> u64 {
        match self {
            Self::Directory => 0,
            Self::File { file_size, .. } => *file_size,
        }
    }

    pub fn encode(&self) -> DagResult<Vec<u8>> {
        let body = options()
            .serialize(self)
            .map_err(|e| DagError::Encode(e.to_string()))?;
        let mut out = Vec::with_capacity(1 + body.len());
        out.push(UNIXFS_VERSION);
        out.extend_from_slice(&body);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> DagResult<Self> {
        match bytes.split_first() {
            Some((&UNIXFS_VERSION, body)) => options()
                .with_limit(body.len() as u64)
                .deserialize(body)
                .map_err(|e| DagError::DecodeError(format!("unixfs: {e}"))),
            Some((v, _)) => Err(DagError::DecodeError(format!(
                "unsupported unixfs version {v}"
            ))),
            None => Err(DagError::DecodeError("unixfs: empty data".into())),
        }
    }

    /// Interpret a node's data segment.
    pub fn from_node(node: &DagNode) -> DagResult<Self> {
        Self::decode(node.data())
    }
}

/// The canonical empty directory node (the `unixfs-dir` template).
pub fn directory_node() -> DagResult<DagNode> {
    Ok(DagNode::with_data(UnixfsData::Directory.encode()?))
}
