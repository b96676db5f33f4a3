//! Peer book over a [`Transport`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use ipn_types::{Multiaddr, MultiaddrExt, PeerId};

use crate::error::{SwarmError, SwarmResult};
use crate::transport::Transport;

/// A connected peer as reported by [`Swarm::peers`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub peer: PeerId,
    /// Address dialed, with the peer's `/p2p` component.
    pub addr: Multiaddr,
    /// Dial round-trip time; only filled in verbose listings.
    pub latency: Option<Duration>,
}

/// Known addresses of one connected peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAddrs {
    pub peer: PeerId,
    pub addrs: Vec<Multiaddr>,
}

#[derive(Clone, Debug)]
struct PeerEntry {
    addr: Multiaddr,
    latency: Duration,
}

pub struct Swarm {
    local_peer: PeerId,
    transport: Arc<dyn Transport>,
    dial_timeout: Duration,
    peers: RwLock<HashMap<PeerId, PeerEntry>>,
}

impl Swarm {
    pub fn new(local_peer: PeerId, transport: Arc<dyn Transport>, dial_timeout: Duration) -> Self {
        Self {
            local_peer,
            transport,
            dial_timeout,
            peers: RwLock::new(HashMap::new()),
        }
    }

    pub fn local_peer(&self) -> PeerId {
        self.local_peer
    }

    /// Listen on every address in `addrs`, returning the bound addresses.
    pub async fn listen(&self, addrs: &[Multiaddr]) -> SwarmResult<Vec<Multiaddr>> {
        let mut bound = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let local = self.transport.listen(addr).await?;
            info!(addr = %local, "listening");
            bound.push(local);
        }
        Ok(bound)
    }

    /// Addresses this node listens on.
    pub fn local_addrs(&self) -> Vec<Multiaddr> {
        self.transport.local_addresses()
    }

    pub async fn connect(&self, addr: &Multiaddr) -> SwarmResult<PeerId> {
        self.connect_with_timeout(addr, self.dial_timeout).await
    }

    /// Dial `addr`. If it ends in `/p2p/<id>`, the remote must be that peer.
    ///
    /// On timeout the half-open dial is hung up before `Timeout` is returned.
    pub async fn connect_with_timeout(
        &self,
        addr: &Multiaddr,
        timeout: Duration,
    ) -> SwarmResult<PeerId> {
        let dial_addr = addr.without_peer();
        let started = Instant::now();

        let conn = match tokio::time::timeout(timeout, self.transport.dial(&dial_addr)).await {
            Ok(result) => result?,
            Err(_) => {
                self.hang_up_quietly(&dial_addr).await;
                return Err(SwarmError::Timeout {
                    addr: addr.clone(),
                    after: timeout,
                });
            }
        };

        if let Some(expected) = addr.peer() {
            if expected != conn.remote_peer {
                self.hang_up_quietly(&dial_addr).await;
                return Err(SwarmError::PeerIdMismatch {
                    expected,
                    actual: conn.remote_peer,
                });
            }
        }

        let latency = started.elapsed();
        let previous = self.peers.write().await.insert(
            conn.remote_peer,
            PeerEntry {
                addr: dial_addr.clone(),
                latency,
            },
        );
        // One connection per peer: a redial over another address replaces it.
        if let Some(previous) = previous.filter(|p| p.addr != dial_addr) {
            debug!(peer = %conn.remote_peer, old = %previous.addr, "replacing connection");
            self.hang_up_quietly(&previous.addr).await;
        }
        info!(peer = %conn.remote_peer, addr = %addr, ?latency, "connected");
        Ok(conn.remote_peer)
    }

    pub async fn disconnect(&self, addr: &Multiaddr) -> SwarmResult<()> {
        self.disconnect_with_timeout(addr, self.dial_timeout).await
    }

    /// Hang up on the peer at `addr`, matched by `/p2p` id or by address.
    pub async fn disconnect_with_timeout(
        &self,
        addr: &Multiaddr,
        timeout: Duration,
    ) -> SwarmResult<()> {
        let dial_addr = addr.without_peer();
        let peer = {
            let peers = self.peers.read().await;
            match addr.peer() {
                Some(id) => peers.contains_key(&id).then_some(id),
                None => peers
                    .iter()
                    .find(|(_, entry)| entry.addr == dial_addr)
                    .map(|(id, _)| *id),
            }
        };
        let peer = peer.ok_or_else(|| SwarmError::NotConnected(addr.clone()))?;
        let entry_addr = match self.peers.read().await.get(&peer) {
            Some(entry) => entry.addr.clone(),
            None => return Err(SwarmError::NotConnected(addr.clone())),
        };

        match tokio::time::timeout(timeout, self.transport.hang_up(&entry_addr)).await {
            Ok(result) => result?,
            Err(_) => {
                // The peer is forgotten either way; finish the hang-up in the
                // background.
                self.peers.write().await.remove(&peer);
                let transport = self.transport.clone();
                let stray = entry_addr.clone();
                tokio::spawn(async move {
                    if let Err(e) = transport.hang_up(&stray).await {
                        warn!(addr = %stray, error = %e, "hang-up failed");
                    }
                });
                return Err(SwarmError::Timeout {
                    addr: addr.clone(),
                    after: timeout,
                });
            }
        }
        self.peers.write().await.remove(&peer);
        info!(peer = %peer, "disconnected");
        Ok(())
    }

    /// Connected peers, sorted by peer id.
    pub async fn peers(&self, verbose: bool) -> Vec<PeerInfo> {
        let peers = self.peers.read().await;
        let mut out: Vec<PeerInfo> = peers
            .iter()
            .map(|(id, entry)| PeerInfo {
                peer: *id,
                addr: entry.addr.with_peer(*id),
                latency: verbose.then_some(entry.latency),
            })
            .collect();
        out.sort_by(|a, b| a.peer.cmp(&b.peer));
        out
    }

    /// Addresses of every connected peer, sorted by peer id.
    pub async fn addrs(&self) -> Vec<PeerAddrs> {
        let peers = self.peers.read().await;
        let mut out: Vec<PeerAddrs> = peers
            .iter()
            .map(|(id, entry)| PeerAddrs {
                peer: *id,
                addrs: vec![entry.addr.clone()],
            })
            .collect();
        out.sort_by(|a, b| a.peer.cmp(&b.peer));
        out
    }

    /// Dial each bootstrap address, logging failures. Returns how many
    /// connections succeeded.
    pub async fn bootstrap(&self, addrs: &[Multiaddr]) -> usize {
        let mut connected = 0;
        for addr in addrs {
            match self.connect(addr).await {
                Ok(_) => connected += 1,
                Err(e) => warn!(addr = %addr, error = %e, "bootstrap dial failed"),
            }
        }
        connected
    }

    /// Hang up on every connected peer.
    pub async fn hang_up_all(&self) {
        let drained: Vec<(PeerId, PeerEntry)> = self.peers.write().await.drain().collect();
        for (peer, entry) in drained {
            debug!(peer = %peer, "hanging up");
            self.hang_up_quietly(&entry.addr).await;
        }
    }

    /// Hang up on every peer and stop listening.
    pub async fn shutdown(&self) -> SwarmResult<()> {
        self.hang_up_all().await;
        self.transport.close_listeners().await
    }

    async fn hang_up_quietly(&self, addr: &Multiaddr) {
        if let Err(e) = self.transport.hang_up(addr).await {
            warn!(addr = %addr, error = %e, "hang-up failed");
        }
    }
}

impl std::fmt::Debug for Swarm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Swarm")
            .field("local_peer", &self.local_peer)
            .field("dial_timeout", &self.dial_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryNetwork, MemoryTransport};
    use crate::transport::Connection;
    use async_trait::async_trait;
    use ipn_crypto::Keypair;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Peer {
        id: PeerId,
        transport: Arc<MemoryTransport>,
        swarm: Swarm,
    }

    fn peer_on(network: &Arc<MemoryNetwork>, latency: Duration) -> Peer {
        let id = Keypair::generate().peer_id();
        let transport = Arc::new(MemoryTransport::new(id, network.clone()).with_latency(latency));
        let swarm = Swarm::new(id, transport.clone(), Duration::from_secs(5));
        Peer {
            id,
            transport,
            swarm,
        }
    }

    async fn listening_peer(network: &Arc<MemoryNetwork>) -> (Peer, Multiaddr) {
        let peer = peer_on(network, Duration::ZERO);
        let bound = peer
            .swarm
            .listen(&["/memory/0".parse().unwrap()])
            .await
            .unwrap();
        let addr = bound[0].clone();
        (peer, addr)
    }

    #[tokio::test]
    async fn connect_and_list_peers() {
        let network = MemoryNetwork::new();
        let (server, addr) = listening_peer(&network).await;
        let client = peer_on(&network, Duration::ZERO);

        assert_eq!(client.swarm.connect(&addr).await.unwrap(), server.id);

        let peers = client.swarm.peers(false).await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].peer, server.id);
        assert_eq!(peers[0].addr, addr.with_peer(server.id));
        assert!(peers[0].latency.is_none());
        assert!(client.swarm.peers(true).await[0].latency.is_some());

        let addrs = client.swarm.addrs().await;
        assert_eq!(addrs, vec![PeerAddrs { peer: server.id, addrs: vec![addr.clone()] }]);
        assert_eq!(server.swarm.local_addrs(), vec![addr]);
    }

    #[tokio::test]
    async fn p2p_component_is_checked() {
        let network = MemoryNetwork::new();
        let (server, addr) = listening_peer(&network).await;
        let client = peer_on(&network, Duration::ZERO);

        let right = addr.with_peer(server.id);
        assert_eq!(client.swarm.connect(&right).await.unwrap(), server.id);

        let stranger = Keypair::generate().peer_id();
        let wrong = addr.with_peer(stranger);
        let other_client = peer_on(&network, Duration::ZERO);
        assert!(matches!(
            other_client.swarm.connect(&wrong).await,
            Err(SwarmError::PeerIdMismatch { expected, .. }) if expected == stranger
        ));
        assert!(other_client.swarm.peers(false).await.is_empty());
        assert!(other_client.transport.open_connections().unwrap().is_empty());
    }

    #[tokio::test]
    async fn connect_timeout_hangs_up() {
        let network = MemoryNetwork::new();
        let (_server, addr) = listening_peer(&network).await;
        let slow = peer_on(&network, Duration::from_secs(5));

        let err = slow
            .swarm
            .connect_with_timeout(&addr, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, SwarmError::Timeout { .. }));
        assert!(slow.transport.open_connections().unwrap().is_empty());
        assert!(slow.swarm.peers(false).await.is_empty());
    }

    #[tokio::test]
    async fn transport_errors_pass_through() {
        let network = MemoryNetwork::new();
        let client = peer_on(&network, Duration::ZERO);
        assert!(matches!(
            client.swarm.connect(&"/memory/4242".parse().unwrap()).await,
            Err(SwarmError::TransportError(_))
        ));
    }

    #[tokio::test]
    async fn disconnect_by_addr_or_id() {
        let network = MemoryNetwork::new();
        let (a, addr_a) = listening_peer(&network).await;
        let (b, addr_b) = listening_peer(&network).await;
        let client = peer_on(&network, Duration::ZERO);
        client.swarm.connect(&addr_a).await.unwrap();
        client.swarm.connect(&addr_b).await.unwrap();

        client.swarm.disconnect(&addr_a).await.unwrap();
        client
            .swarm
            .disconnect(&Multiaddr::empty().with_peer(b.id))
            .await
            .unwrap();
        assert!(client.swarm.peers(false).await.is_empty());
        assert!(client.transport.open_connections().unwrap().is_empty());

        assert!(matches!(
            client.swarm.disconnect(&addr_a.with_peer(a.id)).await,
            Err(SwarmError::NotConnected(_))
        ));
    }

    #[tokio::test]
    async fn redial_over_new_address_hangs_up_the_old_one() {
        let network = MemoryNetwork::new();
        let (server, first) = listening_peer(&network).await;
        let second = server
            .swarm
            .listen(&["/memory/0".parse().unwrap()])
            .await
            .unwrap()
            .remove(0);
        let client = peer_on(&network, Duration::ZERO);

        client.swarm.connect(&first).await.unwrap();
        client.swarm.connect(&second).await.unwrap();

        let peers = client.swarm.peers(false).await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].addr, second.with_peer(server.id));
        assert_eq!(client.transport.open_connections().unwrap(), vec![second.clone()]);

        // Redialing the same address keeps the connection.
        client.swarm.connect(&second).await.unwrap();
        assert_eq!(client.transport.open_connections().unwrap(), vec![second]);
    }

    /// Delegates to a memory transport, but the first hang-up never returns.
    struct StuckHangUp {
        inner: Arc<MemoryTransport>,
        stuck: AtomicBool,
    }

    #[async_trait]
    impl Transport for StuckHangUp {
        async fn dial(&self, addr: &Multiaddr) -> SwarmResult<Connection> {
            self.inner.dial(addr).await
        }

        async fn listen(&self, addr: &Multiaddr) -> SwarmResult<Multiaddr> {
            self.inner.listen(addr).await
        }

        async fn hang_up(&self, addr: &Multiaddr) -> SwarmResult<()> {
            if !self.stuck.swap(true, Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            self.inner.hang_up(addr).await
        }

        fn local_addresses(&self) -> Vec<Multiaddr> {
            self.inner.local_addresses()
        }
    }

    #[tokio::test]
    async fn disconnect_timeout_forgets_peer_and_hangs_up() {
        let network = MemoryNetwork::new();
        let (_server, addr) = listening_peer(&network).await;
        let id = Keypair::generate().peer_id();
        let memory = Arc::new(MemoryTransport::new(id, network.clone()));
        let transport = Arc::new(StuckHangUp {
            inner: memory.clone(),
            stuck: AtomicBool::new(false),
        });
        let swarm = Swarm::new(id, transport, Duration::from_secs(5));
        swarm.connect(&addr).await.unwrap();

        let err = swarm
            .disconnect_with_timeout(&addr, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, SwarmError::Timeout { .. }));
        assert!(swarm.peers(false).await.is_empty());

        for _ in 0..100 {
            if memory.open_connections().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(memory.open_connections().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_is_best_effort() {
        let network = MemoryNetwork::new();
        let (_server, addr) = listening_peer(&network).await;
        let client = peer_on(&network, Duration::ZERO);
        let connected = client
            .swarm
            .bootstrap(&[addr, "/memory/5555".parse().unwrap()])
            .await;
        assert_eq!(connected, 1);

        client.swarm.hang_up_all().await;
        assert!(client.swarm.peers(false).await.is_empty());
        assert!(client.transport.open_connections().unwrap().is_empty());
    }

    #[tokio::test]
    async fn shutdown_releases_listen_addresses() {
        let network = MemoryNetwork::new();
        let (server, addr) = listening_peer(&network).await;
        server.swarm.shutdown().await.unwrap();
        assert!(server.swarm.local_addrs().is_empty());

        let other = peer_on(&network, Duration::ZERO);
        assert_eq!(other.swarm.listen(&[addr.clone()]).await.unwrap(), vec![addr]);
    }
}
