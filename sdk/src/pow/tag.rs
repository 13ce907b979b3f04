use {
    ownproof_protocol::{Digest, Tag},
    sha2::{Digest as _, Sha256},
    std::io::{self, Read},
};

/// Computes the tag of a file that is already in memory.
#[must_use]
#[inline]
pub fn tag(file: &[u8]) -> Tag {
    Tag(super::sha256(&[file]))
}

/// Computes the tag by reading `reader` to the end.
#[inline]
pub fn tag_reader(mut reader: impl Read) -> io::Result<Tag> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(Tag(Digest(hasher.finalize().into())))
}
