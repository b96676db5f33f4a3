//! Reachability over the link graph.

use std::collections::HashMap;

use tracing::trace;

use ipn_store::BlockStore;
use ipn_types::Multihash;

use crate::codec;
use crate::error::DagResult;

/// Every block reachable from `roots` (roots included), with its encoded size.
///
/// Each distinct hash is fetched once no matter how many links point at it.
/// Blocks that do not decode as nodes are treated as leaves, so raw blocks
/// can be pinned. Fails with `NotFound` naming the first missing block.
pub fn reachable(
    store: &dyn BlockStore,
    roots: impl IntoIterator<Item = Multihash>,
) -> DagResult<HashMap<Multihash, u64>> {
    let mut seen: HashMap<Multihash, u64> = HashMap::new();
    let mut stack: Vec<Multihash> = roots.into_iter().collect();

    while let Some(hash) = stack.pop() {
        if seen.contains_key(&hash) {
            continue;
        }
        let block = store.get(&hash)?;
        seen.insert(hash, block.len() as u64);
        match codec::decode(block.data()) {
            Ok(node) => stack.extend(
                node.links()
                    .iter()
                    .map(|l| l.target)
                    .filter(|t| !seen.contains_key(t)),
            ),
            Err(_) => trace!(hash = %hash, "raw block, no links to follow"),
        }
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DagError;
    use crate::node::{DagLink, DagNode};
    use ipn_crypto::ContentHasher;
    use ipn_store::{Block, InMemoryBlockStore};

    fn put(store: &InMemoryBlockStore, node: &DagNode) -> Multihash {
        let block = Block::new(&ContentHasher::SHA2_256, codec::encode(node).unwrap());
        store.put(&block).unwrap()
    }

    #[test]
    fn shared_subtrees_counted_once() {
        let store = InMemoryBlockStore::new();
        let leaf = put(&store, &DagNode::with_data(b"leaf".to_vec()));
        let root = put(
            &store,
            &DagNode::from_parts(
                vec![],
                vec![DagLink::new("a", leaf, 0), DagLink::new("b", leaf, 0)],
            )
            .unwrap(),
        );
        let seen = reachable(&store, [root]).unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains_key(&leaf));
    }

    #[test]
    fn raw_blocks_are_leaves() {
        let store = InMemoryBlockStore::new();
        let raw = store
            .put(&Block::new(&ContentHasher::SHA2_256, b"raw".to_vec()))
            .unwrap();
        let seen = reachable(&store, [raw]).unwrap();
        assert_eq!(seen.get(&raw), Some(&3));
    }

    #[test]
    fn missing_target_is_named() {
        let store = InMemoryBlockStore::new();
        let missing = ContentHasher::SHA2_256.hash(b"nowhere");
        let root = put(
            &store,
            &DagNode::from_parts(vec![], vec![DagLink::new("gone", missing, 1)]).unwrap(),
        );
        let err = reachable(&store, [root]).unwrap_err();
        assert!(matches!(err, DagError::NotFound(h) if h == missing));
    }
}
