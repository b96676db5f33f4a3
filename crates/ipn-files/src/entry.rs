//! Values passed into and out of the files layer.

use ipn_types::Multihash;

/// File content accepted by `add`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileContent {
    Bytes(Vec<u8>),
    Text(String),
}

impl FileContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(b) => b,
            Self::Text(s) => s.as_bytes(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(b) => b,
            Self::Text(s) => s.into_bytes(),
        }
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for FileContent {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One entry of a multi-file add. No content means a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddEntry {
    /// `/`-separated path relative to the import root.
    pub path: String,
    pub content: Option<FileContent>,
}

impl AddEntry {
    pub fn file(path: impl Into<String>, content: impl Into<FileContent>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
        }
    }
}

/// A file or directory that was added or exported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpfsFile {
    pub path: String,
    pub hash: Multihash,
    /// Cumulative size of the object.
    pub size: u64,
    /// File bytes on export; always `None` for directories and on add.
    pub content: Option<Vec<u8>>,
}
