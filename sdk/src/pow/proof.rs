use {
    super::{BlockSize, expand, sha256, split},
    ownproof_protocol::{Digest, Proof, Seed},
};

/// The file has fewer than two blocks, so no proof can be built for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("file is too small for a proof of ownership ({blocks} block(s), at least 2 required)")]
pub struct InsufficientBlocks {
    pub blocks: usize,
}

fn leaf(block: &[u8], seed: &Seed, index: u64) -> Digest {
    sha256(&[block, expand(seed, index).as_bytes().as_slice()])
}

fn chain(left: &Digest, right: &Digest) -> Digest {
    sha256(&[left.as_bytes().as_slice(), right.as_bytes().as_slice()])
}

/// Folds `blocks` into a proof for `seed`.
///
/// Blocks must be given in file order. The first two leaves are hashed
/// together to initialize the accumulator; every later leaf is chained onto
/// it one by one.
#[inline]
pub fn prove<'a>(
    blocks: impl IntoIterator<Item = &'a [u8]>,
    seed: &Seed,
) -> Result<Proof, InsufficientBlocks> {
    let mut leaves = (1_u64..)
        .zip(blocks)
        .map(|(index, block)| leaf(block, seed, index));
    let first = leaves.next().ok_or(InsufficientBlocks { blocks: 0 })?;
    let second = leaves.next().ok_or(InsufficientBlocks { blocks: 1 })?;
    let acc = leaves.fold(chain(&first, &second), |acc, leaf| chain(&acc, &leaf));
    Ok(Proof(acc))
}

/// Splits `file` and proves it in one step.
#[inline]
pub fn prove_file(
    file: &[u8],
    seed: &Seed,
    block_size: BlockSize,
) -> Result<Proof, InsufficientBlocks> {
    prove(split(file, block_size), seed)
}
