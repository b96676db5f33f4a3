use std::ops::Deref;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ipn_types::Multihash;

use crate::block::Block;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

/// A block store wrapper that lets one caller shut out all others.
///
/// Every ordinary operation holds a shared gate for its duration. A caller
/// that needs a stable view of the whole store (garbage collection) takes
/// [`GatedStore::exclusive`], which waits for in-flight operations to drain
/// and blocks new ones until the returned guard is dropped.
pub struct GatedStore {
    inner: Arc<dyn BlockStore>,
    gate: RwLock<()>,
}

impl GatedStore {
    pub fn new(inner: Arc<dyn BlockStore>) -> Self {
        Self {
            inner,
            gate: RwLock::new(()),
        }
    }

    /// Take the store exclusively.
    ///
    /// Operations on the guard bypass the gate. Calling back into this
    /// `GatedStore` while holding the guard deadlocks.
    pub fn exclusive(&self) -> StoreResult<ExclusiveAccess<'_>> {
        let guard = self.gate.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(ExclusiveAccess {
            store: self.inner.as_ref(),
            _guard: guard,
        })
    }

    /// Hold the shared gate across several operations.
    ///
    /// An exclusive caller waits until the guard is dropped, so everything
    /// done through it lands either wholly before or wholly after a sweep.
    /// Operations on the guard bypass the gate.
    pub fn shared(&self) -> StoreResult<SharedAccess<'_>> {
        Ok(SharedAccess {
            store: self.inner.as_ref(),
            _guard: self.read_gate()?,
        })
    }

    fn read_gate(&self) -> StoreResult<RwLockReadGuard<'_, ()>> {
        self.gate.read().map_err(|_| StoreError::LockPoisoned)
    }
}

impl BlockStore for GatedStore {
    fn get(&self, hash: &Multihash) -> StoreResult<Block> {
        let _g = self.read_gate()?;
        self.inner.get(hash)
    }

    fn put(&self, block: &Block) -> StoreResult<Multihash> {
        let _g = self.read_gate()?;
        self.inner.put(block)
    }

    fn has(&self, hash: &Multihash) -> StoreResult<bool> {
        let _g = self.read_gate()?;
        self.inner.has(hash)
    }

    fn delete(&self, hash: &Multihash) -> StoreResult<bool> {
        let _g = self.read_gate()?;
        self.inner.delete(hash)
    }

    fn keys(&self) -> StoreResult<Vec<Multihash>> {
        let _g = self.read_gate()?;
        self.inner.keys()
    }

    fn size(&self, hash: &Multihash) -> StoreResult<u64> {
        let _g = self.read_gate()?;
        self.inner.size(hash)
    }

    fn put_many(&self, blocks: &[Block]) -> StoreResult<Vec<Multihash>> {
        let _g = self.read_gate()?;
        self.inner.put_many(blocks)
    }
}

impl std::fmt::Debug for GatedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatedStore").finish_non_exhaustive()
    }
}

/// Exclusive handle on a [`GatedStore`]. Derefs to the wrapped store.
pub struct ExclusiveAccess<'a> {
    store: &'a dyn BlockStore,
    _guard: RwLockWriteGuard<'a, ()>,
}

impl<'a> Deref for ExclusiveAccess<'a> {
    type Target = dyn BlockStore + 'a;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

/// Shared handle on a [`GatedStore`]. Derefs to the wrapped store.
pub struct SharedAccess<'a> {
    store: &'a dyn BlockStore,
    _guard: RwLockReadGuard<'a, ()>,
}

impl<'a> Deref for SharedAccess<'a> {
    type Target = dyn BlockStore + 'a;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}
