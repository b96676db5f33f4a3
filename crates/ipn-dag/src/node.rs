//! DAG node types: a data segment plus named, sized links to other nodes.
//!
//! A [`DagNode`] is a value. Nothing about it changes once it is stored;
//! "mutating" an object means building a new node and storing that (see
//! [`crate::patch`]).

use std::fmt;

use serde::{Deserialize, Serialize};

use ipn_types::Multihash;

use crate::error::{DagError, DagResult};

/// A named, sized reference from one node to another.
///
/// `size` is the cumulative size of the target subtree, as reported by
/// `stat`. File chunk links carry an empty name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagLink {
    pub name: String,
    pub target: Multihash,
    pub size: u64,
}

impl DagLink {
    pub fn new(name: impl Into<String>, target: Multihash, size: u64) -> Self {
        Self {
            name: name.into(),
            target,
            size,
        }
    }

    /// A link without a name, as used between file chunks.
    pub fn unnamed(target: Multihash, size: u64) -> Self {
        Self::new(String::new(), target, size)
    }
}

impl fmt::Display for DagLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({} bytes)", self.target, self.name, self.size)
    }
}

/// Selects a link to remove.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkRef {
    /// The link with this name.
    Name(String),
    /// The first link pointing at this hash.
    Hash(Multihash),
    /// The first link with the same name and target. Size is ignored.
    Link(DagLink),
}

impl LinkRef {
    pub fn matches(&self, link: &DagLink) -> bool {
        match self {
            Self::Name(name) => link.name == *name,
            Self::Hash(hash) => link.target == *hash,
            Self::Link(other) => link.name == other.name && link.target == other.target,
        }
    }
}

impl From<&str> for LinkRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for LinkRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Multihash> for LinkRef {
    fn from(hash: Multihash) -> Self {
        Self::Hash(hash)
    }
}

impl From<DagLink> for LinkRef {
    fn from(link: DagLink) -> Self {
        Self::Link(link)
    }
}

/// A node in the object graph.
///
/// Links keep their insertion order. Non-empty link names are unique within
/// one node; empty names may repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DagNode {
    data: Vec<u8>,
    links: Vec<DagLink>,
}

impl DagNode {
    /// An empty node: no data, no links.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            links: Vec::new(),
        }
    }

    /// Build a node, rejecting duplicate non-empty link names.
    pub fn from_parts(data: impl Into<Vec<u8>>, links: Vec<DagLink>) -> DagResult<Self> {
        let mut node = Self::with_data(data);
        for link in links {
            node.add_link(link)?;
        }
        Ok(node)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn links(&self) -> &[DagLink] {
        &self.links
    }

    pub fn into_parts(self) -> (Vec<u8>, Vec<DagLink>) {
        (self.data, self.links)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.links.is_empty()
    }

    /// Look up a link by name.
    pub fn link(&self, name: &str) -> Option<&DagLink> {
        if name.is_empty() {
            return None;
        }
        self.links.iter().find(|l| l.name == name)
    }

    /// Append a link.
    pub fn add_link(&mut self, link: DagLink) -> DagResult<()> {
        if self.link(&link.name).is_some() {
            return Err(DagError::DuplicateLinkName(link.name));
        }
        self.links.push(link);
        Ok(())
    }

    /// Remove the first link matching `link_ref`. Returns whether one was removed.
    pub fn remove_link(&mut self, link_ref: &LinkRef) -> bool {
        match self.links.iter().position(|l| link_ref.matches(l)) {
            Some(idx) => {
                self.links.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn set_data(&mut self, data: impl Into<Vec<u8>>) {
        self.data = data.into();
    }

    pub fn append_data(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipn_crypto::ContentHasher;

    fn hash(content: &[u8]) -> Multihash {
        ContentHasher::SHA2_256.hash(content)
    }

    #[test]
    fn new_node_is_empty() {
        let node = DagNode::new();
        assert!(node.is_empty());
        assert!(node.links().is_empty());
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut node = DagNode::new();
        node.add_link(DagLink::new("a", hash(b"1"), 1)).unwrap();
        let err = node.add_link(DagLink::new("a", hash(b"2"), 2)).unwrap_err();
        assert!(matches!(err, DagError::DuplicateLinkName(n) if n == "a"));
        assert_eq!(node.links().len(), 1);
    }

    #[test]
    fn empty_names_may_repeat() {
        let node = DagNode::from_parts(
            b"".to_vec(),
            vec![DagLink::unnamed(hash(b"1"), 1), DagLink::unnamed(hash(b"2"), 1)],
        )
        .unwrap();
        assert_eq!(node.links().len(), 2);
        assert!(node.link("").is_none());
    }

    #[test]
    fn links_keep_insertion_order() {
        let mut node = DagNode::new();
        for name in ["zeta", "alpha", "mid"] {
            node.add_link(DagLink::new(name, hash(name.as_bytes()), 0)).unwrap();
        }
        let names: Vec<_> = node.links().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn remove_by_each_ref_kind() {
        let a = DagLink::new("a", hash(b"a"), 1);
        let b = DagLink::new("b", hash(b"b"), 2);
        let c = DagLink::new("c", hash(b"c"), 3);
        let mut node = DagNode::from_parts(vec![], vec![a.clone(), b.clone(), c.clone()]).unwrap();

        assert!(node.remove_link(&LinkRef::from("b")));
        assert!(node.remove_link(&LinkRef::from(c.target)));
        // Size differences do not matter when matching a full link.
        assert!(node.remove_link(&LinkRef::from(DagLink::new("a", a.target, 99))));
        assert!(node.links().is_empty());
        assert!(!node.remove_link(&LinkRef::from("a")));
    }

    #[test]
    fn data_mutation() {
        let mut node = DagNode::with_data(b"hel".to_vec());
        node.append_data(b"lo");
        assert_eq!(node.data(), b"hello");
        node.set_data(b"bye".to_vec());
        assert_eq!(node.data(), b"bye");
    }
}
