use std::time::Duration;

use thiserror::Error;

use ipn_types::{Multiaddr, PeerId};

#[derive(Debug, Error)]
pub enum SwarmError {
    /// A dial or hang-up did not finish in time.
    #[error("timed out after {after:?} on {addr}")]
    Timeout { addr: Multiaddr, after: Duration },

    /// Failure reported by the transport, passed through as-is.
    #[error("transport error: {0}")]
    TransportError(String),

    #[error("unsupported address: {0}")]
    UnsupportedAddress(Multiaddr),

    /// The peer reached at an address is not the one named in its `/p2p` part.
    #[error("peer id mismatch: expected {expected}, connected to {actual}")]
    PeerIdMismatch { expected: PeerId, actual: PeerId },

    #[error("not connected: {0}")]
    NotConnected(Multiaddr),
}

pub type SwarmResult<T> = Result<T, SwarmError>;
