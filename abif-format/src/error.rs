use std::io;

use crate::directory::{ElementType, Tag};

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("bad signature, expected \"ABIF\" found {found:?}")]
    BadSignature { found: [u8; 4] },

    #[error("file truncated, {size} bytes is below the {min} byte header region")]
    Truncated { size: usize, min: usize },

    #[error("file of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[error("directory of {count} entries at offset {offset} runs past the end of a {size} byte file")]
    DirectoryOutOfBounds { offset: u32, count: u32, size: usize },

    #[error("entry {tag} {number}: data at {offset}..{end} runs past the end of a {size} byte file")]
    EntryOutOfBounds {
        tag: Tag,
        number: u32,
        offset: u32,
        end: u64,
        size: usize,
    },

    #[error("entry {tag} {number}: expected element type {expected:?}, found {found:?}")]
    TypeMismatch {
        tag: Tag,
        number: u32,
        expected: ElementType,
        found: ElementType,
    },

    #[error("{0}")]
    IOError(#[from] io::Error),
}
