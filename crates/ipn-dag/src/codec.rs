//! Block encoding for [`DagNode`].
//!
//! Wire format: one version byte, then the bincode (fixed-width integers,
//! little-endian) encoding of `(data, [(name, multihash bytes, size)])`.
//! Encoding is deterministic, and decoding re-encodes the result and
//! rejects any input that does not match byte for byte, so every node has
//! exactly one valid encoding and therefore exactly one hash.

use bincode::Options;
use serde::Deserialize;

use ipn_types::Multihash;

use crate::error::{DagError, DagResult};
use crate::node::{DagLink, DagNode};

/// Current block encoding version.
pub const CODEC_VERSION: u8 = 1;

type WireLink<'a> = (&'a str, Vec<u8>, u64);
type OwnedWireLink = (String, Vec<u8>, u64);

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Encode a node into its block bytes.
pub fn encode(node: &DagNode) -> DagResult<Vec<u8>> {
    let links: Vec<WireLink<'_>> = node
        .links()
        .iter()
        .map(|l| (l.name.as_str(), l.target.to_bytes(), l.size))
        .collect();
    let body = wire_options()
        .serialize(&(node.data(), links))
        .map_err(|e| DagError::Encode(e.to_string()))?;

    let mut out = Vec::with_capacity(1 + body.len());
    out.push(CODEC_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode block bytes into a node.
pub fn decode(bytes: &[u8]) -> DagResult<DagNode> {
    let (&version, body) = bytes
        .split_first()
        .ok_or_else(|| DagError::DecodeError("empty block".into()))?;
    if version != CODEC_VERSION {
        return Err(DagError::DecodeError(format!(
            "unsupported encoding version {version}"
        )));
    }

    let (data, wire_links): (Vec<u8>, Vec<OwnedWireLink>) = wire_options()
        .with_limit(body.len() as u64)
        .deserialize(body)
        .map_err(|e| DagError::DecodeError(e.to_string()))?;

    let mut links = Vec::with_capacity(wire_links.len());
    for (name, target, size) in wire_links {
        let target =
            Multihash::from_bytes(&target).map_err(|e| DagError::DecodeError(e.to_string()))?;
        links.push(DagLink { name, target, size });
    }
    let node = DagNode::from_parts(data, links).map_err(|e| match e {
        DagError::DuplicateLinkName(name) => {
            DagError::DecodeError(format!("duplicate link name {name:?}"))
        }
        other => other,
    })?;

    if encode(&node)? != bytes {
        return Err(DagError::DecodeError("non-canonical encoding".into()));
    }
    Ok(node)
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JsonNode {
    #[serde(default)]
    data: String,
    #[serde(default)]
    links: Vec<JsonLink>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JsonLink {
    #[serde(default)]
    name: String,
    hash: Multihash,
    #[serde(default)]
    size: u64,
}

/// Decode the JSON object form:
/// `{"Data": "...", "Links": [{"Name": "...", "Hash": "Qm...", "Size": 0}]}`.
///
/// `Data` is taken as UTF-8 text.
pub fn decode_json(bytes: &[u8]) -> DagResult<DagNode> {
    let json: JsonNode =
        serde_json::from_slice(bytes).map_err(|e| DagError::DecodeError(e.to_string()))?;
    let links = json
        .links
        .into_iter()
        .map(|l| DagLink::new(l.name, l.hash, l.size))
        .collect();
    DagNode::from_parts(json.data.into_bytes(), links)
}
