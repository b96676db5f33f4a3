//! Content-addressed block storage for the IPN storage node.
//!
//! A block is an opaque byte payload keyed by the multihash of its bytes.
//! Higher layers (DAG objects, unixfs files) are encoded into blocks before
//! they reach this crate.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlockStore`] trait:
//!
//! - [`InMemoryBlockStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlockStore`] -- one file per block under a sharded directory tree
//! - [`GatedStore`] -- wraps any backend so garbage collection can take it
//!   exclusively
//!
//! # Design Rules
//!
//! 1. Blocks are immutable once written (content-addressing guarantees this).
//! 2. `put` of bytes already present is a no-op.
//! 3. Reads from disk re-verify the digest; corruption surfaces as
//!    [`StoreError::HashMismatch`].
//! 4. The store never interprets block contents.

pub mod block;
pub mod error;
pub mod fs;
pub mod gate;
pub mod memory;
pub mod traits;

pub use block::Block;
pub use error::{StoreError, StoreResult};
pub use fs::FsBlockStore;
pub use gate::{ExclusiveAccess, GatedStore, SharedAccess};
pub use memory::InMemoryBlockStore;
pub use traits::BlockStore;
