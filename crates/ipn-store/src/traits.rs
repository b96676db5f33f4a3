use ipn_types::Multihash;

use crate::block::Block;
use crate::error::StoreResult;

/// Content-addressed block store.
///
/// All implementations must satisfy these invariants:
/// - Blocks are immutable once written; the same bytes always map to the
///   same key.
/// - `put` is idempotent and never duplicates storage.
/// - The store never interprets block contents.
/// - `delete` removes any block it is asked to. Keeping reachable blocks
///   alive is the repository's job, not the store's.
pub trait BlockStore: Send + Sync {
    /// Read a block. Fails with `NotFound` if absent.
    fn get(&self, hash: &Multihash) -> StoreResult<Block>;

    /// Store a block and return its key. A no-op if already present.
    fn put(&self, block: &Block) -> StoreResult<Multihash>;

    /// Check whether a block is present.
    fn has(&self, hash: &Multihash) -> StoreResult<bool>;

    /// Remove a block. Returns `true` if it existed.
    fn delete(&self, hash: &Multihash) -> StoreResult<bool>;

    /// Every key currently stored, in no particular order.
    fn keys(&self) -> StoreResult<Vec<Multihash>>;

    /// Size in bytes of a stored block.
    fn size(&self, hash: &Multihash) -> StoreResult<u64> {
        Ok(self.get(hash)?.len() as u64)
    }

    /// Store several blocks. Backends may override for fewer syncs.
    fn put_many(&self, blocks: &[Block]) -> StoreResult<Vec<Multihash>> {
        blocks.iter().map(|b| self.put(b)).collect()
    }
}
