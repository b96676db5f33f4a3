//! Copy-on-write object mutation.
//!
//! Each operation reads the source object, applies one change to a copy,
//! stores the copy, and returns its hash. The source object is left
//! untouched in the store. A read and the following write are not atomic:
//! two patches of the same source race, but each yields a valid object.

use tracing::debug;

use ipn_types::Multihash;

use crate::error::DagResult;
use crate::node::{DagLink, DagNode, LinkRef};
use crate::object::ObjectApi;

/// Patch operations over an [`ObjectApi`].
#[derive(Clone, Debug)]
pub struct PatchApi {
    objects: ObjectApi,
}

impl PatchApi {
    pub fn new(objects: ObjectApi) -> Self {
        Self { objects }
    }

    fn apply(
        &self,
        hash: &Multihash,
        op: &'static str,
        change: impl FnOnce(&mut DagNode) -> DagResult<()>,
    ) -> DagResult<Multihash> {
        let mut node = self.objects.get(hash)?;
        change(&mut node)?;
        let patched = self.objects.put_node(&node)?;
        debug!(op, from = %hash, to = %patched, "patched object");
        Ok(patched)
    }

    /// Append `link`. Fails with `DuplicateLinkName` if its non-empty name
    /// is already taken.
    pub fn add_link(&self, hash: &Multihash, link: DagLink) -> DagResult<Multihash> {
        self.apply(hash, "add-link", |node| node.add_link(link))
    }

    /// Drop the first link matching `link_ref`. No match returns `hash`.
    pub fn rm_link(&self, hash: &Multihash, link_ref: impl Into<LinkRef>) -> DagResult<Multihash> {
        let link_ref = link_ref.into();
        let mut node = self.objects.get(hash)?;
        if !node.remove_link(&link_ref) {
            debug!(hash = %hash, link = ?link_ref, "rm-link matched nothing");
            return Ok(*hash);
        }
        let patched = self.objects.put_node(&node)?;
        debug!(op = "rm-link", from = %hash, to = %patched, "patched object");
        Ok(patched)
    }

    pub fn append_data(&self, hash: &Multihash, data: &[u8]) -> DagResult<Multihash> {
        self.apply(hash, "append-data", |node| {
            node.append_data(data);
            Ok(())
        })
    }

    pub fn set_data(&self, hash: &Multihash, data: impl Into<Vec<u8>>) -> DagResult<Multihash> {
        self.apply(hash, "set-data", |node| {
            node.set_data(data);
            Ok(())
        })
    }
}
