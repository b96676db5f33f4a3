//! Reads unixfs objects back out as bytes and file trees.

use ipn_dag::{DagError, DagNode, ObjectApi, UnixfsData};
use ipn_types::Multihash;

use crate::entry::IpfsFile;
use crate::error::{FilesError, FilesResult};

#[derive(Clone, Debug)]
pub struct Exporter {
    objects: ObjectApi,
}

impl Exporter {
    pub fn new(objects: ObjectApi) -> Self {
        Self { objects }
    }

    /// The full content of the file at `hash`.
    pub fn cat(&self, hash: &Multihash) -> FilesResult<Vec<u8>> {
        let node = self.objects.get(hash)?;
        let mut out = Vec::new();
        match unixfs_of(hash, &node)? {
            UnixfsData::Directory => Err(FilesError::IsDirectory(*hash)),
            file => {
                self.read_file(&node, file, &mut out)?;
                Ok(out)
            }
        }
    }

    /// Every entry at and below `hash`, parents before children. Paths are
    /// rooted at the hash string; directories carry no content.
    pub fn get(&self, hash: &Multihash) -> FilesResult<Vec<IpfsFile>> {
        let mut files = Vec::new();
        self.for_each(hash, |file| {
            files.push(file);
            true
        })?;
        Ok(files)
    }

    /// Visit entries as [`Exporter::get`] would return them. Stops early
    /// when `visit` returns `false`.
    pub fn for_each(
        &self,
        hash: &Multihash,
        mut visit: impl FnMut(IpfsFile) -> bool,
    ) -> FilesResult<()> {
        let size = self.objects.stat(hash)?.cumulative_size;
        let mut stack = vec![(hash.to_string(), *hash, size)];

        while let Some((path, hash, size)) = stack.pop() {
            let node = self.objects.get(&hash)?;
            let content = match unixfs_of(&hash, &node)? {
                UnixfsData::Directory => {
                    // Reversed so the stack pops children in link order.
                    for link in node.links().iter().rev() {
                        stack.push((format!("{path}/{}", link.name), link.target, link.size));
                    }
                    None
                }
                file => {
                    let mut out = Vec::new();
                    self.read_file(&node, file, &mut out)?;
                    Some(out)
                }
            };
            if !visit(IpfsFile {
                path,
                hash,
                size,
                content,
            }) {
                break;
            }
        }
        Ok(())
    }

    fn read_file(&self, node: &DagNode, data: UnixfsData, out: &mut Vec<u8>) -> FilesResult<()> {
        if let UnixfsData::File { data, .. } = data {
            out.extend_from_slice(&data);
        }
        for link in node.links() {
            let child = self.objects.get(&link.target)?;
            match unixfs_of(&link.target, &child)? {
                UnixfsData::Directory => return Err(FilesError::NotUnixfs(link.target)),
                file => self.read_file(&child, file, out)?,
            }
        }
        Ok(())
    }
}

fn unixfs_of(hash: &Multihash, node: &DagNode) -> FilesResult<UnixfsData> {
    UnixfsData::from_node(node).map_err(|e| match e {
        DagError::DecodeError(_) => FilesError::NotUnixfs(*hash),
        other => other.into(),
    })
}
