use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use ipn_dag::{ObjectApi, PatchApi};
use ipn_files::{Chunker, FilesApi};
use ipn_repo::{InitOptions, Repo, RepoConfig, RepoError, RepoState, REPO_VERSION};
use ipn_swarm::{Swarm, TransportFactory};
use ipn_types::{Multiaddr, MultiaddrExt, PeerId};

use crate::api::{BlockGroup, FilesGroup, ObjectGroup, PinGroup, RepoGroup, SwarmGroup};
use crate::error::{NodeError, NodeResult};
use crate::events::{EventBus, NodeEvent};
use crate::options::NodeOptions;

pub const AGENT_VERSION: &str = concat!("ipn/", env!("CARGO_PKG_VERSION"));
pub const PROTOCOL_VERSION: &str = "ipfs/0.1.0";

/// Answer to [`Node::id`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdInfo {
    pub id: PeerId,
    /// Hex-encoded ed25519 public key.
    pub public_key: String,
    /// Listen addresses, each ending in `/p2p/<id>`.
    pub addresses: Vec<Multiaddr>,
    pub agent_version: String,
    pub protocol_version: String,
}

/// Answer to [`Node::version`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub repo: String,
    /// Build commit, from `IPN_COMMIT` at compile time; empty if unset.
    pub commit: String,
}

/// Services available while the node is started.
pub(crate) struct Online {
    pub(crate) objects: ObjectApi,
    pub(crate) patch: PatchApi,
    pub(crate) files: FilesApi,
    pub(crate) swarm: Arc<Swarm>,
    pub(crate) peer_id: PeerId,
    pub(crate) public_key: String,
}

struct NodeInner {
    options: NodeOptions,
    repo: Repo,
    transports: Box<dyn TransportFactory>,
    online: RwLock<Option<Arc<Online>>>,
    // Serializes init/start/stop.
    lifecycle: Mutex<()>,
    events: EventBus,
}

/// An IPN storage node.
///
/// Cloning is cheap; clones share the repository and the swarm.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    /// Attach to the repository in `options.repo` without touching disk.
    pub fn new(options: NodeOptions, transports: impl TransportFactory + 'static) -> Self {
        let repo = Repo::new(options.repo.clone());
        Self {
            inner: Arc::new(NodeInner {
                options,
                repo,
                transports: Box::new(transports),
                online: RwLock::new(None),
                lifecycle: Mutex::new(()),
                events: EventBus::new(),
            }),
        }
    }

    /// Build a node and bring it as far as `options` asks: `init` runs only
    /// when the repository is uninitialized (or `force` is set), `start`
    /// follows.
    pub async fn create(
        options: NodeOptions,
        transports: impl TransportFactory + 'static,
    ) -> NodeResult<Self> {
        let node = Self::new(options, transports);
        let opts = &node.inner.options;
        if opts.init
            && (opts.init_options.force || node.inner.repo.state()? == RepoState::Uninitialized)
        {
            let init_options = opts.init_options.clone();
            node.init(&init_options).await?;
        }
        if node.inner.options.start {
            node.start().await?;
        }
        Ok(node)
    }

    // ---- Lifecycle ----

    /// Initialize the repository, generating the node identity.
    pub async fn init(&self, options: &InitOptions) -> NodeResult<()> {
        let _guard = self.inner.lifecycle.lock().await;
        let options = options.clone();
        let result = self
            .blocking(move |node| {
                let template = node.inner.options.config.clone();
                Ok(node.inner.repo.init(&options, template)?)
            })
            .await;
        self.report(result, NodeEvent::Init)
    }

    /// Open the repository, listen on the configured swarm addresses and
    /// dial the bootstrap peers. Bootstrap failures are logged only.
    pub async fn start(&self) -> NodeResult<()> {
        let _guard = self.inner.lifecycle.lock().await;
        let result = self.start_inner().await;
        self.report(result, NodeEvent::Start)
    }

    async fn start_inner(&self) -> NodeResult<()> {
        if self.read_online()?.is_some() {
            return Err(NodeError::AlreadyStarted);
        }
        self.blocking(|node| Ok(node.inner.repo.start()?)).await?;

        match self.go_online().await {
            Ok(online) => {
                info!(peer = %online.peer_id, "node online");
                *self.write_online()? = Some(Arc::new(online));
                Ok(())
            }
            Err(e) => {
                if let Err(stop_err) = self.inner.repo.stop() {
                    warn!(error = %stop_err, "failed to stop repository after failed start");
                }
                Err(e)
            }
        }
    }

    async fn go_online(&self) -> NodeResult<Online> {
        let repo = &self.inner.repo;
        let config = repo.config()?;
        let keypair = config.keypair()?;
        let objects = repo.objects()?;
        let chunker = Chunker::new(config.files.chunk_size)?;

        let peer_id = keypair.peer_id();
        let transport = self.inner.transports.build(peer_id);
        let swarm = Arc::new(Swarm::new(peer_id, transport, config.dial_timeout()));
        if let Err(e) = swarm.listen(&config.addresses.swarm).await {
            if let Err(close_err) = swarm.shutdown().await {
                warn!(error = %close_err, "failed to release listeners");
            }
            return Err(e.into());
        }
        let connected = swarm.bootstrap(&config.bootstrap).await;
        if !config.bootstrap.is_empty() {
            info!(connected, total = config.bootstrap.len(), "bootstrap finished");
        }

        Ok(Online {
            patch: PatchApi::new(objects.clone()),
            files: FilesApi::new(objects.clone(), chunker),
            objects,
            swarm,
            peer_id,
            public_key: keypair.public_key_hex(),
        })
    }

    /// Hang up every connection, stop listening and release the
    /// repository. A no-op on a node already stopped.
    pub async fn stop(&self) -> NodeResult<()> {
        let _guard = self.inner.lifecycle.lock().await;
        let result = self.stop_inner().await;
        self.report(result, NodeEvent::Stop)
    }

    async fn stop_inner(&self) -> NodeResult<()> {
        let online = self.write_online()?.take();
        if let Some(online) = online {
            if let Err(e) = online.swarm.shutdown().await {
                warn!(error = %e, "swarm shutdown failed");
            }
        }
        self.inner.repo.stop()?;
        info!("node offline");
        Ok(())
    }

    pub fn is_online(&self) -> bool {
        matches!(self.read_online().as_deref(), Ok(Some(_)))
    }

    // ---- Info ----

    pub fn id(&self) -> NodeResult<IdInfo> {
        let online = self.online()?;
        Ok(IdInfo {
            id: online.peer_id,
            public_key: online.public_key.clone(),
            addresses: online
                .swarm
                .local_addrs()
                .iter()
                .map(|addr| addr.with_peer(online.peer_id))
                .collect(),
            agent_version: AGENT_VERSION.to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
        })
    }

    /// Software and repository versions. An uninitialized repository
    /// reports the version `init` would write.
    pub fn version(&self) -> NodeResult<VersionInfo> {
        let repo = match self.inner.repo.version() {
            Ok(v) => v,
            Err(RepoError::NotInitialized) => REPO_VERSION,
            Err(e) => return Err(e.into()),
        };
        Ok(VersionInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            repo: repo.to_string(),
            commit: option_env!("IPN_COMMIT").unwrap_or_default().to_string(),
        })
    }

    /// The loaded repository config.
    pub fn config(&self) -> NodeResult<RepoConfig> {
        self.online()?;
        Ok(self.inner.repo.config()?)
    }

    /// Lifecycle events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.inner.events.subscribe()
    }

    // ---- API groups ----

    pub fn object(&self) -> ObjectGroup {
        ObjectGroup { node: self.clone() }
    }

    pub fn block(&self) -> BlockGroup {
        BlockGroup { node: self.clone() }
    }

    pub fn pin(&self) -> PinGroup {
        PinGroup { node: self.clone() }
    }

    pub fn repo(&self) -> RepoGroup {
        RepoGroup { node: self.clone() }
    }

    pub fn swarm(&self) -> SwarmGroup {
        SwarmGroup { node: self.clone() }
    }

    pub fn files(&self) -> FilesGroup {
        FilesGroup { node: self.clone() }
    }

    // ---- Internals ----

    /// The started services, or `NotInitialized`.
    pub(crate) fn online(&self) -> NodeResult<Arc<Online>> {
        self.read_online()?.clone().ok_or(NodeError::NotInitialized)
    }

    pub(crate) fn repository(&self) -> &Repo {
        &self.inner.repo
    }

    /// Run blocking repository work off the async workers.
    pub(crate) async fn blocking<T, F>(&self, f: F) -> NodeResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Node) -> NodeResult<T> + Send + 'static,
    {
        let node = self.clone();
        tokio::task::spawn_blocking(move || f(&node))
            .await
            .map_err(|e| NodeError::Task(e.to_string()))?
    }

    fn report(&self, result: NodeResult<()>, event: NodeEvent) -> NodeResult<()> {
        match &result {
            Ok(()) => self.inner.events.emit(event),
            Err(e) => {
                warn!(event = ?event, error = %e, "lifecycle step failed");
                self.inner.events.emit(NodeEvent::Error(e.to_string()));
            }
        }
        result
    }

    fn read_online(&self) -> NodeResult<RwLockReadGuard<'_, Option<Arc<Online>>>> {
        self.inner.online.read().map_err(|_| NodeError::LockPoisoned)
    }

    fn write_online(&self) -> NodeResult<RwLockWriteGuard<'_, Option<Arc<Online>>>> {
        self.inner.online.write().map_err(|_| NodeError::LockPoisoned)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("repo", &self.inner.repo.path())
            .field("online", &self.is_online())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipn_dag::DagNode;
    use ipn_swarm::MemoryNetwork;
    use tempfile::TempDir;

    fn listening_config() -> RepoConfig {
        let mut config = RepoConfig::default();
        config.addresses.swarm = vec!["/memory/0".parse().unwrap()];
        config.datastore.sync = false;
        config
    }

    async fn online_node(network: &Arc<MemoryNetwork>) -> (TempDir, Node) {
        let dir = tempfile::tempdir().unwrap();
        let options = NodeOptions::new(dir.path()).with_config(listening_config());
        let node = Node::create(options, network.clone()).await.unwrap();
        (dir, node)
    }

    #[tokio::test]
    async fn set_data_leaves_the_source_untouched() {
        let (_dir, node) = online_node(&MemoryNetwork::new()).await;
        assert!(node.is_online());

        let objects = node.object();
        let h0 = objects.new(None).await.unwrap();
        let h1 = objects.patch().set_data(&h0, "hello").await.unwrap();
        assert_ne!(h0, h1);
        assert_eq!(objects.data(&h1).await.unwrap(), b"hello");
        assert_eq!(objects.get(&h0).await.unwrap(), DagNode::new());
    }

    #[tokio::test]
    async fn operations_need_a_started_node() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::new(NodeOptions::new(dir.path()), MemoryNetwork::new());
        assert!(!node.is_online());
        assert!(matches!(
            node.object().new(None).await,
            Err(NodeError::NotInitialized)
        ));
        assert!(matches!(node.id(), Err(NodeError::NotInitialized)));
        assert!(matches!(
            node.pin().ls().await,
            Err(NodeError::NotInitialized)
        ));
        assert!(matches!(
            node.files().add("x").await,
            Err(NodeError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn lifecycle_events_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::new(NodeOptions::new(dir.path()), MemoryNetwork::new());
        let mut events = node.subscribe();

        node.init(&InitOptions::default()).await.unwrap();
        node.start().await.unwrap();
        node.stop().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), NodeEvent::Init);
        assert_eq!(events.recv().await.unwrap(), NodeEvent::Start);
        assert_eq!(events.recv().await.unwrap(), NodeEvent::Stop);
    }

    #[tokio::test]
    async fn second_start_fails_and_reports() {
        let (_dir, node) = online_node(&MemoryNetwork::new()).await;
        let mut events = node.subscribe();
        assert!(matches!(node.start().await, Err(NodeError::AlreadyStarted)));
        assert!(matches!(events.recv().await.unwrap(), NodeEvent::Error(_)));
        assert!(node.is_online());
    }

    #[tokio::test]
    async fn stop_before_start_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::create(
            NodeOptions {
                start: false,
                ..NodeOptions::new(dir.path())
            },
            MemoryNetwork::new(),
        )
        .await
        .unwrap();
        assert!(matches!(
            node.stop().await,
            Err(NodeError::Repo(RepoError::NotStarted(RepoState::Initialized)))
        ));
    }

    #[tokio::test]
    async fn start_without_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        let options = NodeOptions {
            init: false,
            ..NodeOptions::new(dir.path())
        };
        let err = Node::create(options, MemoryNetwork::new()).await.unwrap_err();
        assert!(matches!(err, NodeError::Repo(RepoError::NotInitialized)));
    }

    #[tokio::test]
    async fn restart_keeps_blocks_and_identity() {
        let (_dir, node) = online_node(&MemoryNetwork::new()).await;
        let id = node.id().unwrap().id;
        let hash = node.block().put(&b"persisted"[..]).await.unwrap();

        node.stop().await.unwrap();
        assert!(!node.is_online());
        node.stop().await.unwrap();

        node.start().await.unwrap();
        assert_eq!(node.id().unwrap().id, id);
        assert_eq!(&node.block().get(&hash).await.unwrap()[..], b"persisted");
    }

    #[tokio::test]
    async fn existing_repo_is_not_reinitialized() {
        let network = MemoryNetwork::new();
        let (dir, node) = online_node(&network).await;
        let id = node.id().unwrap().id;
        node.stop().await.unwrap();

        let again = Node::create(NodeOptions::new(dir.path()), network).await.unwrap();
        assert_eq!(again.id().unwrap().id, id);
    }

    #[tokio::test]
    async fn id_reports_identity_and_addresses() {
        let (_dir, node) = online_node(&MemoryNetwork::new()).await;
        let info = node.id().unwrap();
        assert_eq!(
            Some(info.id),
            node.config().unwrap().identity.map(|i| i.peer_id)
        );
        assert_eq!(info.public_key.len(), 64);
        assert_eq!(info.addresses.len(), 1);
        assert_eq!(info.addresses[0].peer(), Some(info.id));
        assert_eq!(info.agent_version, AGENT_VERSION);
        assert_eq!(info.protocol_version, PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn version_works_offline() {
        let dir = tempfile::tempdir().unwrap();
        let node = Node::new(NodeOptions::new(dir.path()), MemoryNetwork::new());
        let v = node.version().unwrap();
        assert_eq!(v.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(v.repo, REPO_VERSION.to_string());
    }

    #[tokio::test]
    async fn bootstrap_dials_configured_peers() {
        let network = MemoryNetwork::new();
        let (_a_dir, a) = online_node(&network).await;
        let a_addr = a.id().unwrap().addresses[0].clone();

        let dir = tempfile::tempdir().unwrap();
        let mut config = listening_config();
        config.bootstrap = vec![a_addr, "/memory/65000".parse().unwrap()];
        let b = Node::create(NodeOptions::new(dir.path()).with_config(config), network)
            .await
            .unwrap();

        let peers = b.swarm().peers(false).await.unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].peer, a.id().unwrap().id);
    }

    #[tokio::test]
    async fn stop_hangs_up_peers() {
        let network = MemoryNetwork::new();
        let (_a_dir, a) = online_node(&network).await;
        let (_b_dir, b) = online_node(&network).await;
        let a_addr = a.id().unwrap().addresses[0].clone();

        b.swarm().connect(&a_addr).await.unwrap();
        assert_eq!(b.swarm().peers(false).await.unwrap().len(), 1);

        b.stop().await.unwrap();
        b.start().await.unwrap();
        assert!(b.swarm().peers(false).await.unwrap().is_empty());
    }
}
