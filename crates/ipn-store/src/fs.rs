use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ipn_types::Multihash;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::block::Block;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

/// Filesystem block store: one file per block.
///
/// Layout:
/// ```text
/// <root>/<shard>/<multihash base58>
/// ```
/// where `<shard>` is the two characters before the last character of the
/// key (the "next-to-last/2" scheme), which spreads keys evenly because the
/// key prefix is shared by every hash of the same algorithm.
///
/// Writes go to a temp file in the shard directory and are renamed into
/// place, so a crash never leaves a partially written block under a valid
/// key. Every read re-verifies the digest.
#[derive(Debug)]
pub struct FsBlockStore {
    root: PathBuf,
    sync: bool,
}

impl FsBlockStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root, sync: false })
    }

    /// `fsync` every block before it becomes visible.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, hash: &Multihash) -> PathBuf {
        let key = hash.to_base58();
        self.root.join(shard_of(&key)).join(key)
    }
}

fn shard_of(key: &str) -> &str {
    let n = key.len();
    &key[n - 3..n - 1]
}

impl BlockStore for FsBlockStore {
    fn get(&self, hash: &Multihash) -> StoreResult<Block> {
        match fs::read(self.path_for(hash)) {
            Ok(bytes) => Block::from_parts(*hash, bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(*hash)),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, block: &Block) -> StoreResult<Multihash> {
        let path = self.path_for(block.hash());
        if path.is_file() {
            return Ok(*block.hash());
        }
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(block.data())?;
        if self.sync {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(hash = %block.hash(), len = block.len(), "stored block");
        Ok(*block.hash())
    }

    fn has(&self, hash: &Multihash) -> StoreResult<bool> {
        Ok(self.path_for(hash).is_file())
    }

    fn delete(&self, hash: &Multihash) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(hash)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StoreResult<Vec<Multihash>> {
        let mut keys = Vec::new();
        for shard in fs::read_dir(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    warn!(path = ?entry.path(), "skipping non-utf8 block file");
                    continue;
                };
                // In-flight temp files.
                if name.starts_with('.') {
                    continue;
                }
                match Multihash::from_base58(name) {
                    Ok(hash) => keys.push(hash),
                    Err(e) => warn!(path = ?entry.path(), error = %e, "skipping unrecognised block file"),
                }
            }
        }
        Ok(keys)
    }

    fn size(&self, hash: &Multihash) -> StoreResult<u64> {
        match fs::metadata(self.path_for(hash)) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(*hash)),
            Err(e) => Err(e.into()),
        }
    }
}
