//! Linked objects for the IPN storage node.
//!
//! A [`DagNode`] is a data segment plus an ordered list of named, sized
//! links to other nodes by multihash. Nodes are encoded into blocks
//! ([`codec`]) and kept in an `ipn-store` block store, so identical subtrees
//! collapse to one block.
//!
//! - [`ObjectApi`] stores, fetches, and summarizes objects.
//! - [`PatchApi`] derives new objects from stored ones (copy-on-write).
//! - [`unixfs`] defines how file and directory nodes use the data segment.
//! - [`walk::reachable`] computes link closures for `stat`, pinning, and gc.

pub mod codec;
pub mod error;
pub mod node;
pub mod object;
pub mod patch;
pub mod unixfs;
pub mod walk;

pub use error::{DagError, DagResult};
pub use node::{DagLink, DagNode, LinkRef};
pub use object::{ObjectApi, ObjectEncoding, ObjectInput, ObjectStat, ObjectTemplate};
pub use patch::PatchApi;
pub use unixfs::UnixfsData;
