use ipn_types::{HashAlgorithm, Multihash};

/// Multihash producer bound to one hash function.
///
/// Content addressing only works if every writer of a store agrees on the
/// function, so the hasher is picked once (from the repository config) and
/// passed down to the layers that create blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
}

impl ContentHasher {
    /// SHA2-256, the IPFS default.
    pub const SHA2_256: Self = Self {
        algorithm: HashAlgorithm::Sha2_256,
    };
    /// BLAKE3 with a 32-byte output.
    pub const BLAKE3: Self = Self {
        algorithm: HashAlgorithm::Blake3,
    };

    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash raw bytes into a multihash.
    pub fn hash(&self, data: &[u8]) -> Multihash {
        self.algorithm.digest(data)
    }

    /// Verify that `data` hashes to `expected` under `expected`'s own
    /// algorithm (not necessarily this hasher's).
    pub fn verify(data: &[u8], expected: &Multihash) -> bool {
        expected.algorithm().digest(data) == *expected
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::SHA2_256
    }
}
