//! Reading and writing the ABIF-style tagged binary container produced by
//! capillary electrophoresis instruments.
//!
//! A container is a fixed 128-byte header followed by payload bytes and a
//! directory of 28-byte records. The directory names every payload by a
//! `(tag, number)` key; payloads are not decoded until a reader asks for one
//! by key, so parsing a file touches only the header and directory.

mod builder;
mod directory;
mod error;
mod value;

use std::{collections::HashMap, fs, path::Path};

pub use builder::ContainerBuilder;
pub use directory::{DirectoryEntry, ElementType, Tag, ENTRY_LEN};
pub use error::FormatError;
pub use value::{Date, Time};

pub const FILE_SIGNATURE: [u8; 4] = *b"ABIF";

/// The fixed header region. Files below this size cannot carry a directory.
pub const HEADER_LEN: usize = 128;

/// Upper bound on accepted input. Real instrument runs are a few hundred
/// kilobytes; anything near this limit is hostile or corrupt.
pub const MAX_FILE_SIZE: usize = 64 * 1024 * 1024;

/// Byte offset of the directory entry count within the header.
const COUNT_OFFSET: usize = 18;
/// Byte offset of the directory offset within the header.
const DIR_OFFSET_OFFSET: usize = 26;

/// A parsed container: the directory plus the raw byte buffer it indexes.
pub struct Container {
    version: u16,
    entries: HashMap<(Tag, u32), DirectoryEntry>,
    bytes: Vec<u8>,
}

impl Container {
    /// Validate and parse a container from its raw bytes.
    ///
    /// Size bounds are checked before any directory work so hostile input is
    /// rejected without allocation or offset arithmetic.
    pub fn parse(bytes: Vec<u8>) -> Result<Self, FormatError> {
        if bytes.len() > MAX_FILE_SIZE {
            return Err(FormatError::TooLarge {
                size: bytes.len(),
                max: MAX_FILE_SIZE,
            });
        }
        if bytes.len() < HEADER_LEN {
            return Err(FormatError::Truncated {
                size: bytes.len(),
                min: HEADER_LEN,
            });
        }
        let signature: [u8; 4] = bytes[0..4].try_into().unwrap();
        if signature != FILE_SIGNATURE {
            return Err(FormatError::BadSignature { found: signature });
        }
        let version = u16::from_be_bytes(bytes[4..6].try_into().unwrap());
        let count = u32::from_be_bytes(bytes[COUNT_OFFSET..COUNT_OFFSET + 4].try_into().unwrap());
        let dir_offset =
            u32::from_be_bytes(bytes[DIR_OFFSET_OFFSET..DIR_OFFSET_OFFSET + 4].try_into().unwrap());

        let dir_end = dir_offset as u64 + count as u64 * ENTRY_LEN as u64;
        if dir_end > bytes.len() as u64 {
            return Err(FormatError::DirectoryOutOfBounds {
                offset: dir_offset,
                count,
                size: bytes.len(),
            });
        }

        let mut entries = HashMap::with_capacity(count as usize);
        for i in 0..count as usize {
            let start = dir_offset as usize + i * ENTRY_LEN;
            let record: &[u8; ENTRY_LEN] = bytes[start..start + ENTRY_LEN].try_into().unwrap();
            let entry = DirectoryEntry::parse(record);
            if !entry.is_inline() {
                let end = entry.data_offset() as u64 + entry.data_size as u64;
                if end > bytes.len() as u64 {
                    return Err(FormatError::EntryOutOfBounds {
                        tag: entry.tag,
                        number: entry.number,
                        offset: entry.data_offset(),
                        end,
                        size: bytes.len(),
                    });
                }
            }
            // duplicate keys overwrite, last record wins
            entries.insert((entry.tag, entry.number), entry);
        }
        log::debug!(
            "parsed container version {version:#06x}, {} directory entries",
            entries.len()
        );
        Ok(Self {
            version,
            entries,
            bytes,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        Self::parse(fs::read(path)?)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn entry(&self, tag: Tag, number: u32) -> Option<&DirectoryEntry> {
        self.entries.get(&(tag, number))
    }

    pub fn entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.values()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
