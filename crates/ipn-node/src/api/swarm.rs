use std::time::Duration;

use ipn_swarm::{PeerAddrs, PeerInfo};
use ipn_types::{Multiaddr, PeerId};

use crate::error::NodeResult;
use crate::node::Node;

/// `swarm.*`: connections to other peers.
#[derive(Clone, Debug)]
pub struct SwarmGroup {
    pub(crate) node: Node,
}

impl SwarmGroup {
    /// Connected peers. `verbose` adds the dial latency.
    pub async fn peers(&self, verbose: bool) -> NodeResult<Vec<PeerInfo>> {
        Ok(self.node.online()?.swarm.peers(verbose).await)
    }

    pub async fn addrs(&self) -> NodeResult<Vec<PeerAddrs>> {
        Ok(self.node.online()?.swarm.addrs().await)
    }

    pub async fn local_addrs(&self) -> NodeResult<Vec<Multiaddr>> {
        Ok(self.node.online()?.swarm.local_addrs())
    }

    /// Dial `addr` within the configured dial timeout.
    pub async fn connect(&self, addr: &Multiaddr) -> NodeResult<PeerId> {
        Ok(self.node.online()?.swarm.connect(addr).await?)
    }

    pub async fn connect_with_timeout(
        &self,
        addr: &Multiaddr,
        timeout: Duration,
    ) -> NodeResult<PeerId> {
        let online = self.node.online()?;
        Ok(online.swarm.connect_with_timeout(addr, timeout).await?)
    }

    pub async fn disconnect(&self, addr: &Multiaddr) -> NodeResult<()> {
        Ok(self.node.online()?.swarm.disconnect(addr).await?)
    }
}
