use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ipn_files::{AddEntry, FileContent, FilesResult, IpfsFile};
use ipn_types::Multihash;

use crate::error::NodeResult;
use crate::node::Node;

/// `files.*`: unixfs files and directories.
#[derive(Clone, Debug)]
pub struct FilesGroup {
    pub(crate) node: Node,
}

impl FilesGroup {
    pub async fn add(&self, content: impl Into<FileContent>) -> NodeResult<IpfsFile> {
        let content = content.into();
        self.node
            .blocking(move |node| Ok(node.online()?.files.add(content)?))
            .await
    }

    /// Add a set of files and directories. Returns one entry per path,
    /// parents after their children.
    pub async fn add_entries(&self, entries: Vec<AddEntry>) -> NodeResult<Vec<IpfsFile>> {
        self.node
            .blocking(move |node| Ok(node.online()?.files.add_entries(entries)?))
            .await
    }

    /// Add a file or directory tree from the local filesystem.
    pub async fn add_path(&self, path: impl Into<PathBuf>) -> NodeResult<Vec<IpfsFile>> {
        let path = path.into();
        self.node
            .blocking(move |node| Ok(node.online()?.files.add_path(path)?))
            .await
    }

    /// The content of a unixfs file.
    pub async fn cat(&self, hash: &Multihash) -> NodeResult<Vec<u8>> {
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.online()?.files.cat(&hash)?))
            .await
    }

    /// Every entry under `hash`, parents before children.
    pub async fn get(&self, hash: &Multihash) -> NodeResult<Vec<IpfsFile>> {
        let hash = *hash;
        self.node
            .blocking(move |node| Ok(node.online()?.files.get(&hash)?))
            .await
    }

    /// See [`ipn_files::stream::add_stream`].
    pub fn create_add_stream(
        &self,
    ) -> NodeResult<(
        mpsc::Sender<AddEntry>,
        JoinHandle<FilesResult<Vec<IpfsFile>>>,
    )> {
        Ok(self.node.online()?.files.create_add_stream())
    }

    /// See [`ipn_files::stream::get_pull`].
    pub fn get_pull(&self, hash: Multihash) -> NodeResult<mpsc::Receiver<FilesResult<IpfsFile>>> {
        Ok(self.node.online()?.files.get_pull(hash))
    }
}
