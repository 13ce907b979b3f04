pub mod endpoints;

use {
    anyhow::{Error, bail, ensure},
    derive_more::{Display, From, Into},
    serde::{Deserialize, Deserializer, Serialize, Serializer, de},
    std::{
        borrow::Cow,
        fmt::{self, Debug},
        str::FromStr,
    },
};

/// Size of a proof block in bytes. The last block of a file may be shorter.
pub const BLOCK_SIZE: usize = 4096;

/// Length of every digest used by the protocol.
pub const DIGEST_LEN: usize = 32;

/// Number of random bytes in a seed issued by the store.
const SEED_LEN: usize = 16;

/// A 256-bit SHA-256 digest.
///
/// Always rendered as lowercase hex without a prefix, both on the wire
/// and in logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Short prefix for status lines.
    #[must_use]
    #[inline]
    pub fn short(&self) -> String {
        hex::encode(self.0.get(..5).unwrap_or_default())
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    #[inline]
    fn from(value: [u8; DIGEST_LEN]) -> Self {
        Self(value)
    }
}

impl fmt::Display for Digest {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for Digest {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl FromStr for Digest {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(
            s.len() == DIGEST_LEN.saturating_mul(2),
            "invalid digest length; got {}, expected {}",
            s.len(),
            DIGEST_LEN.saturating_mul(2),
        );
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_digit() || ('a'..='f').contains(c)))
        {
            bail!("digest must be lowercase hex but contains `{c}`");
        }
        let mut bytes = [0_u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl<'de> Deserialize<'de> for Digest {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Cow::<'_, str>::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl Serialize for Digest {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex::encode(self.0).serialize(serializer)
    }
}

/// Whole-file fingerprint used by the store as the lookup key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct Tag(pub Digest);

impl FromStr for Tag {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Final chained digest proving possession of a file under a given seed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct Proof(pub Digest);

impl FromStr for Proof {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Per-challenge value issued by the store.
///
/// The client treats it as an opaque string; only its raw bytes are used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct Seed(String);

impl Seed {
    /// Random seed suitable for a single challenge.
    #[must_use]
    #[inline]
    pub fn generate() -> Self {
        Self(hex::encode(rand::random::<[u8; SEED_LEN]>()))
    }

    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Seed {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
