use crate::error::{FilesError, FilesResult};

/// Default chunk size: 256 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 262_144;

/// Splits file content into fixed-size chunks. The last chunk may be short.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize) -> FilesResult<Self> {
        if chunk_size == 0 {
            return Err(FilesError::InvalidChunkSize);
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Content that fits in one chunk is stored as a single leaf.
    pub fn fits(&self, data: &[u8]) -> bool {
        data.len() <= self.chunk_size
    }

    pub fn split<'a>(&self, data: &'a [u8]) -> std::slice::Chunks<'a, u8> {
        data.chunks(self.chunk_size)
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_with_short_tail() {
        let chunker = Chunker::new(5).unwrap();
        let chunks: Vec<_> = chunker.split(b"hello world").collect();
        assert_eq!(chunks, vec![&b"hello"[..], &b" worl"[..], &b"d"[..]]);
    }

    #[test]
    fn exact_boundaries() {
        let chunker = Chunker::new(5).unwrap();
        assert_eq!(chunker.split(b"0123456789").count(), 2);
        assert!(chunker.fits(b"01234"));
        assert!(!chunker.fits(b"012345"));
    }

    #[test]
    fn zero_size_rejected() {
        assert!(matches!(Chunker::new(0), Err(FilesError::InvalidChunkSize)));
        assert_eq!(Chunker::default().chunk_size(), DEFAULT_CHUNK_SIZE);
    }
}
