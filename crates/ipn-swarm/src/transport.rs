use std::sync::Arc;

use async_trait::async_trait;

use ipn_types::{Multiaddr, PeerId};

use crate::error::SwarmResult;

/// An established connection to a remote peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub remote_peer: PeerId,
    /// The dialed address, without any `/p2p` component.
    pub remote_addr: Multiaddr,
}

/// Network transport used by the swarm.
///
/// Addresses handed to `dial` and `hang_up` never carry a `/p2p`
/// component; the swarm strips and checks it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dial(&self, addr: &Multiaddr) -> SwarmResult<Connection>;

    /// Start listening. Returns the bound address (port 0 picks one).
    async fn listen(&self, addr: &Multiaddr) -> SwarmResult<Multiaddr>;

    /// Close the connection to `addr`, including one still being dialed.
    async fn hang_up(&self, addr: &Multiaddr) -> SwarmResult<()>;

    /// Addresses currently listened on.
    fn local_addresses(&self) -> Vec<Multiaddr>;

    /// Stop listening on every address.
    async fn close_listeners(&self) -> SwarmResult<()> {
        Ok(())
    }
}

/// Builds a node's transport once its identity is known.
pub trait TransportFactory: Send + Sync {
    fn build(&self, local_peer: PeerId) -> Arc<dyn Transport>;
}
