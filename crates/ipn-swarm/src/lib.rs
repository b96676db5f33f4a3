//! Swarm bookkeeping for the IPN storage node.
//!
//! The swarm does not speak any wire protocol itself. It tracks which peers
//! are connected and at which address, and delegates dialing, listening,
//! and hanging up to a [`Transport`]. [`MemoryTransport`] connects peers
//! living in the same process.

pub mod error;
pub mod memory;
pub mod swarm;
pub mod transport;

pub use error::{SwarmError, SwarmResult};
pub use memory::{MemoryNetwork, MemoryTransport};
pub use swarm::{PeerAddrs, PeerInfo, Swarm};
pub use transport::{Connection, Transport, TransportFactory};
