//! The pin set: roots kept alive across gc, persisted as `<repo>/pins.json`.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use ipn_types::Multihash;

use crate::error::RepoResult;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinSet {
    roots: BTreeSet<Multihash>,
}

impl PinSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from disk. A missing file is an empty set.
    pub fn load(path: &Path) -> RepoResult<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write atomically through a temp file in the same directory.
    pub fn save(&self, path: &Path) -> RepoResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Returns `false` if already pinned.
    pub fn insert(&mut self, hash: Multihash) -> bool {
        self.roots.insert(hash)
    }

    /// Returns `false` if not pinned.
    pub fn remove(&mut self, hash: &Multihash) -> bool {
        self.roots.remove(hash)
    }

    pub fn contains(&self, hash: &Multihash) -> bool {
        self.roots.contains(hash)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Multihash> {
        self.roots.iter()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipn_crypto::ContentHasher;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PinSet::load(&dir.path().join("pins.json")).unwrap().is_empty());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pins.json");
        let a = ContentHasher::SHA2_256.hash(b"a");
        let b = ContentHasher::SHA2_256.hash(b"b");

        let mut pins = PinSet::new();
        assert!(pins.insert(a));
        assert!(pins.insert(b));
        assert!(!pins.insert(a));
        pins.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(&a.to_base58()));

        let mut loaded = PinSet::load(&path).unwrap();
        assert_eq!(loaded, pins);
        assert!(loaded.remove(&a));
        assert!(!loaded.remove(&a));
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pins.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(PinSet::load(&path).is_err());
    }
}
