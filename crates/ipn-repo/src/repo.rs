//! Repository lifecycle.
//!
//! On-disk layout:
//! ```text
//! <root>/version      repository format version (decimal)
//! <root>/config       RepoConfig, TOML
//! <root>/pins.json    pinned roots
//! <root>/blocks/      FsBlockStore
//! ```
//!
//! State machine: `Uninitialized -> Initialized -> Started -> Stopped`,
//! with `Stopped -> Started` allowed for restarts.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ipn_crypto::Keypair;
use ipn_dag::{walk, ObjectApi, ObjectTemplate};
use ipn_store::{BlockStore, FsBlockStore, GatedStore, StoreError};
use ipn_types::Multihash;

use crate::config::{IdentityConfig, RepoConfig};
use crate::error::{RepoError, RepoResult};
use crate::pins::PinSet;

/// Format version this build reads and writes.
pub const REPO_VERSION: u32 = 1;

const VERSION_FILE: &str = "version";
const CONFIG_FILE: &str = "config";
const PINS_FILE: &str = "pins.json";
const BLOCKS_DIR: &str = "blocks";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepoState {
    Uninitialized,
    Initialized,
    Started,
    Stopped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitOptions {
    /// Skip the genesis objects (empty object and empty directory).
    pub empty_repo: bool,
    /// Requested key size. Ed25519 keys have a fixed size, so this is
    /// recorded in the log only.
    pub bits: u32,
    /// Re-initialize an existing, stopped repository, discarding its blocks,
    /// pins, and identity.
    pub force: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            empty_repo: false,
            bits: 2048,
            force: false,
        }
    }
}

/// Outcome of a gc sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcReport {
    pub removed: Vec<Multihash>,
    /// Blocks whose deletion failed; they are still in the store.
    pub failed: Vec<Multihash>,
    /// Blocks kept because they are reachable from a pin.
    pub retained: usize,
}

/// Block count and total size of the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoUsage {
    pub num_objects: usize,
    pub repo_size: u64,
}

struct Started {
    store: Arc<GatedStore>,
    objects: ObjectApi,
    config: RepoConfig,
    pins: PinSet,
}

struct Inner {
    state: RepoState,
    running: Option<Started>,
}

/// A repository rooted at one directory.
pub struct Repo {
    root: PathBuf,
    /// Replaces `<root>/blocks` when set.
    backend: Option<Arc<dyn BlockStore>>,
    inner: RwLock<Inner>,
}

impl Repo {
    /// Attach to `root`. A directory holding a version file is taken as
    /// initialized; nothing is read until `start`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state = if root.join(VERSION_FILE).is_file() {
            RepoState::Initialized
        } else {
            RepoState::Uninitialized
        };
        Self {
            root,
            backend: None,
            inner: RwLock::new(Inner {
                state,
                running: None,
            }),
        }
    }

    /// Keep blocks in `store` instead of `<root>/blocks`.
    pub fn with_block_store(mut self, store: Arc<dyn BlockStore>) -> Self {
        self.backend = Some(store);
        self
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> RepoResult<RepoState> {
        Ok(self.read()?.state)
    }

    pub fn is_started(&self) -> bool {
        matches!(self.state(), Ok(RepoState::Started))
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| RepoError::LockPoisoned)
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| RepoError::LockPoisoned)
    }

    /// Create the repository on disk.
    ///
    /// `template` seeds the config file; a fresh identity is always
    /// generated. Unless `empty_repo` is set, the empty object and the empty
    /// unixfs directory are stored and pinned.
    pub fn init(&self, options: &InitOptions, template: Option<RepoConfig>) -> RepoResult<()> {
        let mut inner = self.write()?;
        match inner.state {
            RepoState::Uninitialized => {}
            RepoState::Started => return Err(RepoError::AlreadyInitialized(self.root.clone())),
            _ if options.force => self.wipe()?,
            _ => return Err(RepoError::AlreadyInitialized(self.root.clone())),
        }

        fs::create_dir_all(self.root.join(BLOCKS_DIR))?;

        let keypair = Keypair::generate();
        if options.bits != 0 {
            debug!(bits = options.bits, "ignoring key size, ed25519 keys are fixed size");
        }
        let mut config = template.unwrap_or_default();
        config.identity = Some(IdentityConfig::from_keypair(&keypair));
        config.save(&self.root.join(CONFIG_FILE))?;

        let mut pins = PinSet::new();
        if !options.empty_repo {
            let store = self.open_store(&config)?;
            let objects = ObjectApi::new(store, config.hasher());
            pins.insert(objects.create(None)?);
            pins.insert(objects.create(Some(ObjectTemplate::UnixfsDir))?);
        }
        pins.save(&self.root.join(PINS_FILE))?;

        // Written last: its presence marks a complete repository.
        fs::write(self.root.join(VERSION_FILE), REPO_VERSION.to_string())?;

        inner.state = RepoState::Initialized;
        info!(path = %self.root.display(), peer = %keypair.peer_id(), empty = options.empty_repo, "repository initialized");
        Ok(())
    }

    fn wipe(&self) -> RepoResult<()> {
        warn!(path = %self.root.display(), "re-initializing repository");
        for file in [VERSION_FILE, CONFIG_FILE, PINS_FILE] {
            match fs::remove_file(self.root.join(file)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(store) = &self.backend {
            for hash in store.keys()? {
                store.delete(&hash)?;
            }
        }
        let blocks = self.root.join(BLOCKS_DIR);
        if blocks.exists() {
            fs::remove_dir_all(blocks)?;
        }
        Ok(())
    }

    fn open_store(&self, config: &RepoConfig) -> RepoResult<Arc<dyn BlockStore>> {
        if let Some(store) = &self.backend {
            return Ok(Arc::clone(store));
        }
        let store = FsBlockStore::open(self.root.join(BLOCKS_DIR))?.with_sync(config.datastore.sync);
        Ok(Arc::new(store))
    }

    /// The on-disk format version.
    pub fn version(&self) -> RepoResult<u32> {
        let path = self.root.join(VERSION_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepoError::NotInitialized)
            }
            Err(e) => return Err(e.into()),
        };
        text.trim()
            .parse()
            .map_err(|_| RepoError::InvalidVersionFile(text.trim().to_string()))
    }

    /// Open the block store and load config and pins.
    pub fn start(&self) -> RepoResult<()> {
        let mut inner = self.write()?;
        match inner.state {
            RepoState::Initialized | RepoState::Stopped => {}
            RepoState::Started => return Err(RepoError::AlreadyStarted),
            RepoState::Uninitialized => return Err(RepoError::NotInitialized),
        }

        let found = self.version()?;
        if found != REPO_VERSION {
            return Err(RepoError::VersionMismatch {
                expected: REPO_VERSION,
                found,
            });
        }

        let config = RepoConfig::load(&self.root.join(CONFIG_FILE))?;
        let pins = PinSet::load(&self.root.join(PINS_FILE))?;
        let store = Arc::new(GatedStore::new(self.open_store(&config)?));
        let objects = ObjectApi::new(store.clone(), config.hasher());

        inner.running = Some(Started {
            store,
            objects,
            config,
            pins,
        });
        inner.state = RepoState::Started;
        info!(path = %self.root.display(), "repository started");
        Ok(())
    }

    /// Release the block store. A no-op when already stopped.
    pub fn stop(&self) -> RepoResult<()> {
        let mut inner = self.write()?;
        match inner.state {
            RepoState::Started => {}
            RepoState::Stopped => return Ok(()),
            state => return Err(RepoError::NotStarted(state)),
        }
        inner.running = None;
        inner.state = RepoState::Stopped;
        info!(path = %self.root.display(), "repository stopped");
        Ok(())
    }

    fn with_running<T>(&self, f: impl FnOnce(&Started) -> T) -> RepoResult<T> {
        let inner = self.read()?;
        match &inner.running {
            Some(running) => Ok(f(running)),
            None => Err(RepoError::NotStarted(inner.state)),
        }
    }

    /// The gated block store. Requires `Started`.
    pub fn store(&self) -> RepoResult<Arc<GatedStore>> {
        self.with_running(|r| r.store.clone())
    }

    /// An object API over the block store. Requires `Started`.
    pub fn objects(&self) -> RepoResult<ObjectApi> {
        self.with_running(|r| r.objects.clone())
    }

    /// The loaded config. Requires `Started`.
    pub fn config(&self) -> RepoResult<RepoConfig> {
        self.with_running(|r| r.config.clone())
    }

    /// Pin `hash`. Every block reachable from it must be present.
    ///
    /// The closure check and the insert happen under one shared hold on the
    /// store, so a gc either sees the new pin or runs before the check.
    pub fn pin_add(&self, hash: &Multihash) -> RepoResult<()> {
        let store = self.store()?;
        let store = store.shared()?;
        walk::reachable(&*store, [*hash])?;

        let mut inner = self.write()?;
        let state = inner.state;
        let running = inner.running.as_mut().ok_or(RepoError::NotStarted(state))?;
        if running.pins.insert(*hash) {
            running.pins.save(&self.root.join(PINS_FILE))?;
            debug!(hash = %hash, "pinned");
        }
        Ok(())
    }

    pub fn pin_rm(&self, hash: &Multihash) -> RepoResult<()> {
        let mut inner = self.write()?;
        let state = inner.state;
        let running = inner.running.as_mut().ok_or(RepoError::NotStarted(state))?;
        if !running.pins.remove(hash) {
            return Err(RepoError::NotPinned(*hash));
        }
        running.pins.save(&self.root.join(PINS_FILE))?;
        debug!(hash = %hash, "unpinned");
        Ok(())
    }

    pub fn pin_ls(&self) -> RepoResult<Vec<Multihash>> {
        self.with_running(|r| r.pins.iter().copied().collect())
    }

    /// Count the stored blocks and their bytes. Blocks deleted between
    /// listing and sizing are left out.
    pub fn usage(&self) -> RepoResult<RepoUsage> {
        let store = self.store()?;
        let mut usage = RepoUsage::default();
        for hash in store.keys()? {
            match store.size(&hash) {
                Ok(size) => {
                    usage.num_objects += 1;
                    usage.repo_size += size;
                }
                Err(StoreError::NotFound(_)) => debug!(hash = %hash, "block vanished during stat"),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(usage)
    }

    /// Delete every block not reachable from a pin.
    ///
    /// Holds the store exclusively for the whole sweep and reads the pins
    /// only once it has it. If the reachable set cannot be computed nothing
    /// is deleted. A failed delete is logged and reported, and the sweep
    /// moves on.
    pub fn gc(&self) -> RepoResult<GcReport> {
        let store = self.store()?;
        let store = store.exclusive()?;
        let roots = self.pin_ls()?;

        let live: HashSet<Multihash> = walk::reachable(&*store, roots)?.into_keys().collect();

        let mut report = GcReport::default();
        for hash in store.keys()? {
            if live.contains(&hash) {
                report.retained += 1;
                continue;
            }
            match store.delete(&hash) {
                Ok(true) => report.removed.push(hash),
                Ok(false) => debug!(hash = %hash, "block already gone"),
                Err(e) => {
                    warn!(hash = %hash, error = %e, "gc failed to delete block");
                    report.failed.push(hash);
                }
            }
        }
        info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            retained = report.retained,
            "gc complete"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("root", &self.root)
            .field("state", &self.state().ok())
            .finish()
    }
}
