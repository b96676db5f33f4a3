//! Swarm peer identity.
//!
//! [`PeerId`] is libp2p's identifier: the multihash of the peer's encoded
//! public key, printed in base58. Key handling lives in `ipn-crypto`.

pub use libp2p_identity::PeerId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base58_string_roundtrips() {
        let peer = PeerId::random();
        assert_eq!(peer.to_string(), peer.to_base58());
        assert_eq!(peer.to_string().parse::<PeerId>().unwrap(), peer);
    }

    #[test]
    fn content_hashes_are_not_peers() {
        assert!("not-a-peer".parse::<PeerId>().is_err());
    }
}
