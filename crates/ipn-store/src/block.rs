use bytes::Bytes;
use ipn_crypto::ContentHasher;
use ipn_types::Multihash;

use crate::error::{StoreError, StoreResult};

/// An immutable byte payload paired with the multihash of its bytes.
///
/// A `Block` can only be built by hashing its data or by verifying a
/// claimed hash, so `hash` always matches `data`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    hash: Multihash,
    data: Bytes,
}

impl Block {
    /// Hash `data` and wrap it.
    pub fn new(hasher: &ContentHasher, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let hash = hasher.hash(&data);
        Self { hash, data }
    }

    /// Pair data with a claimed hash, verifying the claim.
    pub fn from_parts(hash: Multihash, data: impl Into<Bytes>) -> StoreResult<Self> {
        let data = data.into();
        if !ContentHasher::verify(&data, &hash) {
            let computed = ContentHasher::new(hash.algorithm()).hash(&data);
            return Err(StoreError::HashMismatch { hash, computed });
        }
        Ok(Self { hash, data })
    }

    /// Pair data with a hash the caller already knows to be correct.
    pub(crate) fn from_trusted_parts(hash: Multihash, data: Bytes) -> Self {
        Self { hash, data }
    }

    pub fn hash(&self) -> &Multihash {
        &self.hash
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_hashes_data() {
        let block = Block::new(&ContentHasher::SHA2_256, &b"abc"[..]);
        assert_eq!(*block.hash(), ContentHasher::SHA2_256.hash(b"abc"));
        assert_eq!(block.len(), 3);
    }

    #[test]
    fn from_parts_rejects_wrong_hash() {
        let hash = ContentHasher::SHA2_256.hash(b"original");
        let err = Block::from_parts(hash, &b"tampered"[..]).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }

    #[test]
    fn from_parts_accepts_blake3() {
        let hash = ContentHasher::BLAKE3.hash(b"data");
        let block = Block::from_parts(hash, &b"data"[..]).unwrap();
        assert_eq!(block.data().as_ref(), b"data");
    }
}
