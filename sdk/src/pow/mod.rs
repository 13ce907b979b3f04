//! Client side of the proof-of-ownership scheme. Every digest is SHA-256.
//!
//! The tag of a file is the digest of its whole content. The store uses it as
//! the lookup key, so the tag alone proves nothing: anyone who has seen it can
//! repeat it.
//!
//! To prove possession, the file is split into blocks of `BLOCK_SIZE` bytes
//! (the last block may be shorter). For a seed issued by the store, each block
//! is bound to a challenge value derived from the seed and the 1-based block
//! number:
//!
//! - `challenge(n) = H(seed || decimal(n))`
//! - `leaf(i) = H(block[i] || challenge(i + 1))`
//!
//! The first two leaves are combined into the initial accumulator, and every
//! following leaf is folded in one at a time, in block order:
//!
//! - `acc = H(leaf(0) || leaf(1))`
//! - `acc = H(acc || leaf(i))` for `i` in `2..n`
//!
//! The final accumulator is the proof. The store recomputes the same chain from
//! its own copy, so the block layout, the decimal encoding of block numbers and
//! the special case of the first two blocks must not change. Files with fewer
//! than two blocks cannot be proven.

mod blocks;
mod challenge;
mod proof;
mod tag;

pub use {
    blocks::{BlockSize, Blocks, split},
    challenge::{ChallengeValue, expand},
    proof::{InsufficientBlocks, prove, prove_file},
    tag::{tag, tag_reader},
};

use {
    ownproof_protocol::Digest,
    sha2::{Digest as _, Sha256},
};

fn sha256(parts: &[&[u8]]) -> Digest {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    Digest(hasher.finalize().into())
}
