//! The IPN storage node.
//!
//! A [`Node`] ties a repository (block store, config, pins) to a swarm and
//! exposes the public API in groups: [`Node::object`] (with
//! [`ObjectGroup::patch`]), [`Node::block`], [`Node::pin`], [`Node::repo`],
//! [`Node::swarm`] and [`Node::files`]. Every group operation except
//! `repo().init`, `repo().version` and `repo().path` needs a started node and
//! fails with [`NodeError::NotInitialized`] otherwise.
//!
//! ```no_run
//! # async fn demo() -> ipn_node::NodeResult<()> {
//! use ipn_node::{Node, NodeOptions};
//! use ipn_swarm::MemoryNetwork;
//!
//! let node = Node::create(NodeOptions::new("/tmp/ipn"), MemoryNetwork::new()).await?;
//! let empty = node.object().new(None).await?;
//! let hello = node.object().patch().set_data(&empty, "hello").await?;
//! assert_eq!(node.object().data(&hello).await?, b"hello");
//! node.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod callback;
pub mod error;
pub mod events;
pub mod node;
pub mod options;
pub mod telemetry;

pub use api::{
    BlockGroup, BlockStat, FilesGroup, ObjectGroup, PatchGroup, PinGroup, RepoGroup, RepoStat,
    SwarmGroup,
};
pub use callback::with_callback;
pub use error::{NodeError, NodeResult};
pub use events::NodeEvent;
pub use node::{IdInfo, Node, VersionInfo, AGENT_VERSION, PROTOCOL_VERSION};
pub use options::NodeOptions;
pub use telemetry::init_tracing;

// Re-export the value types callers need.
pub use ipn_dag::{DagLink, DagNode, LinkRef, ObjectEncoding, ObjectInput, ObjectStat, ObjectTemplate};
pub use ipn_files::{AddEntry, FileContent, IpfsFile};
pub use ipn_repo::{GcReport, InitOptions, RepoConfig};
pub use ipn_types::{Multiaddr, Multihash, PeerId};
