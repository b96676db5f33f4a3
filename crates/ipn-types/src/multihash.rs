use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use multihash_codetable::{Code, MultihashDigest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Length in bytes of every digest produced by a supported hash function.
pub const DIGEST_LEN: usize = 32;

/// The `multihash` crate's value type, sized for every supported digest.
pub type RawMultihash = ::multihash::Multihash<64>;

/// Hash functions a [`Multihash`] may be tagged with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA2-256 (multicodec `0x12`), the IPFS default.
    #[default]
    #[serde(rename = "sha2-256")]
    Sha2_256,
    /// BLAKE3 with a 32-byte output (multicodec `0x1e`).
    #[serde(rename = "blake3")]
    Blake3,
}

impl HashAlgorithm {
    /// The multicodec tag written in front of the digest.
    pub const fn code(self) -> u64 {
        match self {
            Self::Sha2_256 => 0x12,
            Self::Blake3 => 0x1e,
        }
    }

    /// Look up an algorithm by its multicodec tag.
    pub fn from_code(code: u64) -> Result<Self, TypeError> {
        match code {
            0x12 => Ok(Self::Sha2_256),
            0x1e => Ok(Self::Blake3),
            other => Err(TypeError::UnknownHashCode(other)),
        }
    }

    /// Hash `data` with this function.
    pub fn digest(self, data: &[u8]) -> Multihash {
        let code = match self {
            Self::Sha2_256 => Code::Sha2_256,
            Self::Blake3 => Code::Blake3_256,
        };
        Multihash {
            algorithm: self,
            inner: code.digest(data),
        }
    }

    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha2_256 => "sha2-256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha2-256" => Ok(Self::Sha2_256),
            "blake3" => Ok(Self::Blake3),
            other => Err(TypeError::UnknownHashAlgorithm(other.to_string())),
        }
    }
}

/// Self-describing content identifier.
///
/// Wraps a [`RawMultihash`] restricted to the supported algorithms and a
/// 32-byte digest. Binary form is the multihash `[code][len][digest]`;
/// string form is base58btc of the binary form, so sha2-256 hashes print as
/// the familiar `Qm...` strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multihash {
    algorithm: HashAlgorithm,
    inner: RawMultihash,
}

impl Multihash {
    /// Wrap a digest computed with `algorithm`.
    pub fn wrap(algorithm: HashAlgorithm, digest: &[u8]) -> Result<Self, TypeError> {
        if digest.len() != DIGEST_LEN {
            return Err(TypeError::InvalidLength {
                expected: DIGEST_LEN,
                actual: digest.len(),
            });
        }
        let inner = RawMultihash::wrap(algorithm.code(), digest)
            .map_err(|e| TypeError::InvalidMultihash(e.to_string()))?;
        Ok(Self { algorithm, inner })
    }

    /// The hash function that produced the digest.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        self.inner.digest()
    }

    pub fn as_raw(&self) -> &RawMultihash {
        &self.inner
    }

    /// Binary form: `[code][len][digest]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes()
    }

    /// Parse the binary form. Trailing bytes are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        let raw = RawMultihash::from_bytes(bytes)
            .map_err(|e| TypeError::InvalidMultihash(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Base58btc string form.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }

    /// Parse the base58btc string form.
    pub fn from_base58(s: &str) -> Result<Self, TypeError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TypeError::InvalidBase58(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Hex encoding of the digest only (no tag).
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }

    /// Short form for logs: the last 8 base58 characters.
    pub fn short(&self) -> String {
        let full = self.to_base58();
        full[full.len().saturating_sub(8)..].to_string()
    }
}

impl TryFrom<RawMultihash> for Multihash {
    type Error = TypeError;

    fn try_from(raw: RawMultihash) -> Result<Self, Self::Error> {
        let algorithm = HashAlgorithm::from_code(raw.code())?;
        if raw.digest().len() != DIGEST_LEN {
            return Err(TypeError::InvalidLength {
                expected: DIGEST_LEN,
                actual: raw.digest().len(),
            });
        }
        Ok(Self {
            algorithm,
            inner: raw,
        })
    }
}

impl From<Multihash> for RawMultihash {
    fn from(hash: Multihash) -> Self {
        hash.inner
    }
}

impl Ord for Multihash {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.inner.code(), self.inner.digest()).cmp(&(other.inner.code(), other.inner.digest()))
    }
}

impl PartialOrd for Multihash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multihash({}:{})", self.algorithm, self.short())
    }
}

impl fmt::Display for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for Multihash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s.trim())
    }
}

// Text formats carry the base58 string; binary formats defer to the
// multihash crate's byte encoding.
impl Serialize for Multihash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.inner.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Multihash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let raw = RawMultihash::deserialize(deserializer)?;
            Self::try_from(raw).map_err(serde::de::Error::custom)
        }
    }
}
