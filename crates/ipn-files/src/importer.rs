//! Turns bytes and directory trees into unixfs objects.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use tracing::debug;
use walkdir::WalkDir;

use ipn_dag::{unixfs, DagLink, DagNode, ObjectApi, UnixfsData};
use ipn_types::Multihash;

use crate::chunker::Chunker;
use crate::entry::{AddEntry, FileContent, IpfsFile};
use crate::error::{FilesError, FilesResult};

enum Tree {
    File(Vec<u8>),
    Dir(BTreeMap<String, Tree>),
}

#[derive(Clone, Debug)]
pub struct Importer {
    objects: ObjectApi,
    chunker: Chunker,
}

impl Importer {
    pub fn new(objects: ObjectApi, chunker: Chunker) -> Self {
        Self { objects, chunker }
    }

    /// Add a single file. Its path is its hash.
    pub fn add(&self, content: FileContent) -> FilesResult<IpfsFile> {
        let hash = self.import_file(content.as_bytes())?;
        let size = self.objects.stat(&hash)?.cumulative_size;
        Ok(IpfsFile {
            path: hash.to_string(),
            hash,
            size,
            content: None,
        })
    }

    /// Add a set of files and directories.
    ///
    /// Parent directories are implied by file paths. Directory links are
    /// sorted by name. One result is returned per entry and per implied
    /// directory, children before their parent, so top-level entries come
    /// last.
    pub fn add_entries(&self, entries: Vec<AddEntry>) -> FilesResult<Vec<IpfsFile>> {
        let mut root: BTreeMap<String, Tree> = BTreeMap::new();
        for entry in entries {
            insert(&mut root, &entry.path, entry.content.map(FileContent::into_bytes))?;
        }

        let mut added = Vec::new();
        for (name, tree) in &root {
            self.build(name, tree, &mut added)?;
        }
        Ok(added)
    }

    /// Add a file or directory from the local filesystem. Paths in the
    /// result start at the final component of `path`.
    pub fn add_path(&self, path: impl AsRef<Path>) -> FilesResult<Vec<IpfsFile>> {
        let path = path.as_ref();
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let mut entries = Vec::new();
        for entry in WalkDir::new(path).follow_links(false).sort_by_file_name() {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(base)
                .map_err(|_| FilesError::InvalidPath(entry.path().display().to_string()))?;
            let rel = to_entry_path(rel)?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                entries.push(AddEntry::dir(rel));
            } else if file_type.is_file() {
                let bytes = std::fs::read(entry.path())?;
                entries.push(AddEntry::file(rel, bytes));
            } else {
                debug!(path = %entry.path().display(), "skipping special file");
            }
        }
        self.add_entries(entries)
    }

    /// Store file content and return the root object's hash.
    fn import_file(&self, data: &[u8]) -> FilesResult<Multihash> {
        if self.chunker.fits(data) {
            return self.put_unixfs(UnixfsData::leaf(data.to_vec()), Vec::new());
        }

        let mut links = Vec::new();
        let mut block_sizes = Vec::new();
        for chunk in self.chunker.split(data) {
            let leaf = self.put_unixfs(UnixfsData::leaf(chunk.to_vec()), Vec::new())?;
            links.push(self.objects.link_to("", &leaf)?);
            block_sizes.push(chunk.len() as u64);
        }
        let root = UnixfsData::File {
            data: Vec::new(),
            file_size: data.len() as u64,
            block_sizes,
        };
        let hash = self.put_unixfs(root, links)?;
        debug!(hash = %hash, len = data.len(), chunks = self.chunker.split(data).len(), "imported chunked file");
        Ok(hash)
    }

    fn put_unixfs(&self, data: UnixfsData, links: Vec<DagLink>) -> FilesResult<Multihash> {
        let node = DagNode::from_parts(data.encode()?, links)?;
        Ok(self.objects.put_node(&node)?)
    }

    fn build(&self, path: &str, tree: &Tree, added: &mut Vec<IpfsFile>) -> FilesResult<Multihash> {
        let hash = match tree {
            Tree::File(bytes) => self.import_file(bytes)?,
            Tree::Dir(children) => {
                let mut node = unixfs::directory_node()?;
                for (name, child) in children {
                    let child_hash = self.build(&format!("{path}/{name}"), child, added)?;
                    node.add_link(self.objects.link_to(name.as_str(), &child_hash)?)?;
                }
                self.objects.put_node(&node)?
            }
        };
        let size = self.objects.stat(&hash)?.cumulative_size;
        added.push(IpfsFile {
            path: path.to_string(),
            hash,
            size,
            content: None,
        });
        Ok(hash)
    }
}

fn split_path(path: &str) -> FilesResult<Vec<&str>> {
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    if parts.iter().any(|p| p.is_empty() || *p == "." || *p == "..") {
        return Err(FilesError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

fn insert(
    root: &mut BTreeMap<String, Tree>,
    path: &str,
    content: Option<Vec<u8>>,
) -> FilesResult<()> {
    let parts = split_path(path)?;
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| FilesError::InvalidPath(path.to_string()))?;

    let mut dir = root;
    for part in parents {
        let slot = dir
            .entry(part.to_string())
            .or_insert_with(|| Tree::Dir(BTreeMap::new()));
        dir = match slot {
            Tree::Dir(children) => children,
            Tree::File(_) => return Err(FilesError::PathConflict(path.to_string())),
        };
    }

    let existing_is_dir = dir.get(*last).map(|t| matches!(t, Tree::Dir(_)));
    match (existing_is_dir, content) {
        (None, Some(bytes)) => {
            dir.insert(last.to_string(), Tree::File(bytes));
        }
        (None, None) => {
            dir.insert(last.to_string(), Tree::Dir(BTreeMap::new()));
        }
        // An explicit directory entry after files inside it.
        (Some(true), None) => {}
        (Some(_), _) => return Err(FilesError::PathConflict(path.to_string())),
    }
    Ok(())
}

fn to_entry_path(rel: &Path) -> FilesResult<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| FilesError::InvalidPath(rel.display().to_string()))?,
            ),
            _ => return Err(FilesError::InvalidPath(rel.display().to_string())),
        }
    }
    Ok(parts.join("/"))
}
