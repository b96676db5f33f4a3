//! Unixfs files for the IPN storage node.
//!
//! [`FilesApi`] adds byte content and directory trees as unixfs objects
//! (see `ipn_dag::unixfs`) and reads them back. Content larger than one
//! chunk is split by the [`Chunker`] into leaf nodes under a root file
//! node; directories are nodes with one named link per entry, sorted by
//! name.

pub mod chunker;
pub mod entry;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod stream;

use std::path::Path;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ipn_dag::ObjectApi;
use ipn_types::Multihash;

pub use chunker::{Chunker, DEFAULT_CHUNK_SIZE};
pub use entry::{AddEntry, FileContent, IpfsFile};
pub use error::{FilesError, FilesResult};
pub use exporter::Exporter;
pub use importer::Importer;

/// Import and export over one object store.
#[derive(Clone, Debug)]
pub struct FilesApi {
    importer: Importer,
    exporter: Exporter,
}

impl FilesApi {
    pub fn new(objects: ObjectApi, chunker: Chunker) -> Self {
        Self {
            importer: Importer::new(objects.clone(), chunker),
            exporter: Exporter::new(objects),
        }
    }

    pub fn add(&self, content: impl Into<FileContent>) -> FilesResult<IpfsFile> {
        self.importer.add(content.into())
    }

    pub fn add_entries(&self, entries: Vec<AddEntry>) -> FilesResult<Vec<IpfsFile>> {
        self.importer.add_entries(entries)
    }

    pub fn add_path(&self, path: impl AsRef<Path>) -> FilesResult<Vec<IpfsFile>> {
        self.importer.add_path(path)
    }

    pub fn cat(&self, hash: &Multihash) -> FilesResult<Vec<u8>> {
        self.exporter.cat(hash)
    }

    pub fn get(&self, hash: &Multihash) -> FilesResult<Vec<IpfsFile>> {
        self.exporter.get(hash)
    }

    pub fn create_add_stream(
        &self,
    ) -> (
        mpsc::Sender<AddEntry>,
        JoinHandle<FilesResult<Vec<IpfsFile>>>,
    ) {
        stream::add_stream(self.importer.clone())
    }

    pub fn get_pull(&self, hash: Multihash) -> mpsc::Receiver<FilesResult<IpfsFile>> {
        stream::get_pull(self.exporter.clone(), hash)
    }
}
