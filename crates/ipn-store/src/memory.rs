use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use ipn_types::Multihash;

use crate::block::Block;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

/// In-memory, HashMap-based block store.
///
/// Intended for tests and embedding. Block payloads are reference-counted
/// [`Bytes`], so reads never copy.
pub struct InMemoryBlockStore {
    blocks: RwLock<HashMap<Multihash, Bytes>>,
}

impl InMemoryBlockStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blocks currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.blocks.read().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Total bytes across all stored blocks.
    pub fn total_bytes(&self) -> StoreResult<u64> {
        let map = self.blocks.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.values().map(|data| data.len() as u64).sum())
    }
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore for InMemoryBlockStore {
    fn get(&self, hash: &Multihash) -> StoreResult<Block> {
        let map = self.blocks.read().map_err(|_| StoreError::LockPoisoned)?;
        let data = map.get(hash).ok_or(StoreError::NotFound(*hash))?;
        Ok(Block::from_trusted_parts(*hash, data.clone()))
    }

    fn put(&self, block: &Block) -> StoreResult<Multihash> {
        let mut map = self.blocks.write().map_err(|_| StoreError::LockPoisoned)?;
        map.entry(*block.hash())
            .or_insert_with(|| block.data().clone());
        Ok(*block.hash())
    }

    fn has(&self, hash: &Multihash) -> StoreResult<bool> {
        let map = self.blocks.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.contains_key(hash))
    }

    fn delete(&self, hash: &Multihash) -> StoreResult<bool> {
        let mut map = self.blocks.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.remove(hash).is_some())
    }

    fn keys(&self) -> StoreResult<Vec<Multihash>> {
        let map = self.blocks.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.keys().copied().collect())
    }

    fn size(&self, hash: &Multihash) -> StoreResult<u64> {
        let map = self.blocks.read().map_err(|_| StoreError::LockPoisoned)?;
        map.get(hash)
            .map(|data| data.len() as u64)
            .ok_or(StoreError::NotFound(*hash))
    }
}

impl std::fmt::Debug for InMemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryBlockStore")
            .field("block_count", &count)
            .finish()
    }
}
