//! The repository config file (`<repo>/config`, TOML).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ipn_crypto::{ContentHasher, Keypair};
use ipn_files::DEFAULT_CHUNK_SIZE;
use ipn_types::{HashAlgorithm, Multiaddr, PeerId};

use crate::error::{RepoError, RepoResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Peers dialed on start. Failures are logged, not fatal.
    pub bootstrap: Vec<Multiaddr>,
    /// Written by `init`; absent in templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityConfig>,
    pub addresses: AddressesConfig,
    pub datastore: DatastoreConfig,
    pub swarm: SwarmConfig,
    pub files: FilesConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub peer_id: PeerId,
    /// Hex-encoded ed25519 secret key.
    pub secret_key: String,
}

impl IdentityConfig {
    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self {
            peer_id: keypair.peer_id(),
            secret_key: keypair.secret_hex(),
        }
    }

    /// Rebuild the keypair, checking it still matches `peer_id`.
    pub fn keypair(&self) -> RepoResult<Keypair> {
        let keypair = Keypair::from_secret_hex(&self.secret_key)?;
        if keypair.peer_id() != self.peer_id {
            return Err(RepoError::Config(format!(
                "identity secret does not match peer id {}",
                self.peer_id
            )));
        }
        Ok(keypair)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressesConfig {
    /// Addresses the swarm listens on at start.
    pub swarm: Vec<Multiaddr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatastoreConfig {
    pub hash_algorithm: HashAlgorithm,
    /// `fsync` each block as it is written.
    pub sync: bool,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default(),
            sync: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub dial_timeout_ms: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            dial_timeout_ms: 10_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub chunk_size: usize,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            bootstrap: Vec::new(),
            identity: None,
            addresses: AddressesConfig::default(),
            datastore: DatastoreConfig::default(),
            swarm: SwarmConfig::default(),
            files: FilesConfig::default(),
        }
    }
}

impl RepoConfig {
    pub fn load(path: &Path) -> RepoResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| RepoError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> RepoResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| RepoError::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn hasher(&self) -> ContentHasher {
        ContentHasher::new(self.datastore.hash_algorithm)
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.swarm.dial_timeout_ms)
    }

    pub fn keypair(&self) -> RepoResult<Keypair> {
        self.identity
            .as_ref()
            .ok_or_else(|| RepoError::Config("missing identity".into()))?
            .keypair()
    }
}
