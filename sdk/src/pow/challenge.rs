use ownproof_protocol::{Digest, Seed};

/// Per-block value derived from a seed and a 1-based block number.
pub type ChallengeValue = Digest;

/// Derives the challenge value for block number `index` (1-based).
///
/// The seed bytes are followed by the decimal representation of `index`
/// without separator or padding.
#[must_use]
#[inline]
pub fn expand(seed: &Seed, index: u64) -> ChallengeValue {
    super::sha256(&[seed.as_bytes(), index.to_string().as_bytes()])
}
