//! The IPN repository: everything a node persists.
//!
//! A [`Repo`] owns one directory holding the block store, the TOML
//! [`RepoConfig`] (including the node identity), and the [`PinSet`]. It
//! walks the lifecycle `Uninitialized -> Initialized -> Started -> Stopped`
//! and runs garbage collection, which deletes every block not reachable
//! from a pinned root.

pub mod config;
pub mod error;
pub mod pins;
pub mod repo;

pub use config::{
    AddressesConfig, DatastoreConfig, FilesConfig, IdentityConfig, RepoConfig, SwarmConfig,
};
pub use error::{RepoError, RepoResult};
pub use pins::PinSet;
pub use repo::{GcReport, InitOptions, Repo, RepoState, RepoUsage, REPO_VERSION};
