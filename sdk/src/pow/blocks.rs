use {
    ownproof_protocol::BLOCK_SIZE,
    serde::{Deserialize, Serialize},
    std::{num::NonZeroUsize, slice::Chunks},
};

/// Length of a proof block. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockSize(NonZeroUsize);

impl BlockSize {
    #[must_use]
    #[inline]
    pub fn new(len: usize) -> Option<Self> {
        NonZeroUsize::new(len).map(Self)
    }

    #[must_use]
    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for BlockSize {
    #[inline]
    fn default() -> Self {
        Self(NonZeroUsize::new(BLOCK_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Blocks of a file in ascending offset order.
///
/// Cloning restarts the sequence from the current position without copying
/// any file data.
#[derive(Debug, Clone)]
pub struct Blocks<'a>(Chunks<'a, u8>);

/// Splits `file` into blocks of `block_size` bytes; the last block may be
/// shorter. An empty file has no blocks.
#[must_use]
#[inline]
pub fn split(file: &[u8], block_size: BlockSize) -> Blocks<'_> {
    Blocks(file.chunks(block_size.get()))
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Blocks<'_> {}
