//! Multiaddresses (`/ip4/127.0.0.1/tcp/4001/p2p/Qm...`), backed by the
//! `multiaddr` crate. `/ipfs/<id>` parses as a legacy alias of `/p2p/<id>`.

pub use ::multiaddr::{Multiaddr, Protocol};

use crate::peer::PeerId;

/// Peer-component helpers the swarm layer routes on.
pub trait MultiaddrExt {
    /// The trailing `/p2p/<id>` component, if any.
    fn peer(&self) -> Option<PeerId>;

    /// This address with every `/p2p/` component removed: the transport
    /// part only.
    fn without_peer(&self) -> Multiaddr;

    /// This address with its peer component set to `peer`.
    fn with_peer(&self, peer: PeerId) -> Multiaddr;
}

impl MultiaddrExt for Multiaddr {
    fn peer(&self) -> Option<PeerId> {
        self.iter()
            .filter_map(|p| match p {
                Protocol::P2p(peer) => Some(peer),
                _ => None,
            })
            .last()
    }

    fn without_peer(&self) -> Multiaddr {
        self.iter()
            .filter(|p| !matches!(p, Protocol::P2p(_)))
            .collect()
    }

    fn with_peer(&self, peer: PeerId) -> Multiaddr {
        self.without_peer().with(Protocol::P2p(peer))
    }
}
