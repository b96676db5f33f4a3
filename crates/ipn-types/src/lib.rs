//! Foundation types for the IPN storage node.
//!
//! Every other IPN crate depends on `ipn-types`.
//!
//! # Key Types
//!
//! - [`Multihash`] -- self-describing content identifier (hash tag + digest)
//! - [`HashAlgorithm`] -- the hash functions a multihash may carry
//! - [`PeerId`] -- identity of a swarm peer
//! - [`Multiaddr`] -- network address with protocol components, plus
//!   [`MultiaddrExt`] for its `/p2p/` part

pub mod error;
pub mod multiaddr;
pub mod multihash;
pub mod peer;

pub use error::TypeError;
pub use crate::multiaddr::{Multiaddr, MultiaddrExt, Protocol};
pub use crate::multihash::{HashAlgorithm, Multihash, RawMultihash, DIGEST_LEN};
pub use peer::PeerId;
