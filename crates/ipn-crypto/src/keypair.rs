use libp2p_identity::ed25519;
use libp2p_identity::PublicKey;

use ipn_types::PeerId;

/// Ed25519 identity key of a node.
///
/// The node's [`PeerId`] is derived from the public key the libp2p way, so
/// ed25519 peers print as `12D3KooW...`.
#[derive(Clone)]
pub struct Keypair(ed25519::Keypair);

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self(ed25519::Keypair::generate())
    }

    /// Create from a raw 32-byte secret.
    pub fn from_secret(bytes: [u8; 32]) -> Result<Self, KeyError> {
        let secret = ed25519::SecretKey::try_from_bytes(bytes)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        Ok(Self(ed25519::Keypair::from(secret)))
    }

    /// Parse a hex-encoded 32-byte secret, as stored in the repo config.
    pub fn from_secret_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| KeyError::InvalidLength(b.len()))?;
        Self::from_secret(arr)
    }

    /// Hex-encoded secret, for persisting in the repo config.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.0.secret())
    }

    /// Raw public key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.0.public().to_bytes()
    }

    /// Hex-encoded public key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }

    /// The peer identity derived from the public key.
    pub fn peer_id(&self) -> PeerId {
        PublicKey::from(self.0.public()).to_peer_id()
    }

    /// Sign `msg` with the identity key.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.0.sign(msg)
    }

    /// Check a signature made by this key.
    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> bool {
        self.0.public().verify(msg, signature)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keypair({}, <redacted>)", self.peer_id())
    }
}

/// Errors from key handling.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid hex secret: {0}")]
    InvalidHex(String),
    #[error("secret must be 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid ed25519 secret: {0}")]
    InvalidKey(String),
}
