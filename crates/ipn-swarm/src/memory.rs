//! In-process transport: peers in one process reach each other through a
//! shared [`MemoryNetwork`] using `/memory/<port>` addresses.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use ipn_types::{Multiaddr, PeerId, Protocol};

use crate::error::{SwarmError, SwarmResult};
use crate::transport::{Connection, Transport, TransportFactory};

fn lock<T>(mutex: &Mutex<T>) -> SwarmResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| SwarmError::TransportError("memory transport lock poisoned".into()))
}

fn memory_port(addr: &Multiaddr) -> SwarmResult<u64> {
    match addr.iter().collect::<Vec<_>>().as_slice() {
        [Protocol::Memory(port)] => Ok(*port),
        _ => Err(SwarmError::UnsupportedAddress(addr.clone())),
    }
}

/// Registry of listening ports shared by every [`MemoryTransport`] on it.
#[derive(Debug)]
pub struct MemoryNetwork {
    listeners: Mutex<HashMap<u64, PeerId>>,
    next_port: AtomicU64,
}

impl MemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: Mutex::new(HashMap::new()),
            next_port: AtomicU64::new(1),
        })
    }

    fn bind(&self, port: u64, peer: PeerId) -> SwarmResult<u64> {
        let mut listeners = lock(&self.listeners)?;
        let port = if port == 0 {
            loop {
                let candidate = self.next_port.fetch_add(1, Ordering::Relaxed);
                if !listeners.contains_key(&candidate) {
                    break candidate;
                }
            }
        } else {
            port
        };
        if listeners.contains_key(&port) {
            return Err(SwarmError::TransportError(format!(
                "/memory/{port} already in use"
            )));
        }
        listeners.insert(port, peer);
        Ok(port)
    }

    fn lookup(&self, port: u64) -> SwarmResult<Option<PeerId>> {
        Ok(lock(&self.listeners)?.get(&port).copied())
    }

    fn unbind_all(&self, peer: &PeerId) -> SwarmResult<()> {
        lock(&self.listeners)?.retain(|_, p| *p != *peer);
        Ok(())
    }
}

impl TransportFactory for Arc<MemoryNetwork> {
    fn build(&self, local_peer: PeerId) -> Arc<dyn Transport> {
        Arc::new(MemoryTransport::new(local_peer, self.clone()))
    }
}

/// One peer's endpoint on a [`MemoryNetwork`].
#[derive(Debug)]
pub struct MemoryTransport {
    local_peer: PeerId,
    network: Arc<MemoryNetwork>,
    listening: Mutex<Vec<Multiaddr>>,
    open: Mutex<HashSet<Multiaddr>>,
    latency: Duration,
}

impl MemoryTransport {
    pub fn new(local_peer: PeerId, network: Arc<MemoryNetwork>) -> Self {
        Self {
            local_peer,
            network,
            listening: Mutex::new(Vec::new()),
            open: Mutex::new(HashSet::new()),
            latency: Duration::ZERO,
        }
    }

    /// Delay every dial by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Addresses with a connection open or being dialed.
    pub fn open_connections(&self) -> SwarmResult<Vec<Multiaddr>> {
        Ok(lock(&self.open)?.iter().cloned().collect())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn dial(&self, addr: &Multiaddr) -> SwarmResult<Connection> {
        let port = memory_port(addr)?;
        lock(&self.open)?.insert(addr.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let Some(remote_peer) = self.network.lookup(port)? else {
            lock(&self.open)?.remove(addr);
            return Err(SwarmError::TransportError(format!(
                "connection refused: {addr}"
            )));
        };
        debug!(addr = %addr, peer = %remote_peer, "memory dial");
        Ok(Connection {
            remote_peer,
            remote_addr: addr.clone(),
        })
    }

    async fn listen(&self, addr: &Multiaddr) -> SwarmResult<Multiaddr> {
        let port = self.network.bind(memory_port(addr)?, self.local_peer)?;
        let bound = Multiaddr::from(Protocol::Memory(port));
        lock(&self.listening)?.push(bound.clone());
        Ok(bound)
    }

    async fn hang_up(&self, addr: &Multiaddr) -> SwarmResult<()> {
        lock(&self.open)?.remove(addr);
        Ok(())
    }

    fn local_addresses(&self) -> Vec<Multiaddr> {
        lock(&self.listening)
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    async fn close_listeners(&self) -> SwarmResult<()> {
        self.network.unbind_all(&self.local_peer)?;
        lock(&self.listening)?.clear();
        Ok(())
    }
}
