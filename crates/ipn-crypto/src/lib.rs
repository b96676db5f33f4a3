//! Cryptographic primitives for the IPN storage node.
//!
//! Provides multihashing over sha2-256 and BLAKE3, and the ed25519 identity
//! key a node derives its [`PeerId`](ipn_types::PeerId) from.
//!
//! All crypto operations wrap established libraries -- no custom cryptography.

pub mod hasher;
pub mod keypair;

pub use hasher::ContentHasher;
pub use keypair::{KeyError, Keypair};
