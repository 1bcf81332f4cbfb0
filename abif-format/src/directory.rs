//! The container directory: fixed-size records naming typed, offset-addressed
//! payloads.
//!
//! Each record is 28 bytes, big-endian throughout: a 4-character tag name, a
//! tag number, an element type code, the per-element size, the element count,
//! the total payload size, and the payload offset. When the total payload
//! size fits in 4 bytes the offset field holds the payload itself instead of
//! a file position.

use std::fmt;

/// Length of one directory record in bytes.
pub const ENTRY_LEN: usize = 28;

/// A 4-character ASCII tag name, e.g. `DATA` or `SMPL`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const fn new(name: &[u8; 4]) -> Self {
        Tag(*name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            let c = if b.is_ascii_graphic() { b as char } else { '.' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

/// Element type codes from the instrument format.
///
/// Unknown codes are preserved rather than rejected so a directory written by
/// a newer instrument still parses; only entries a reader actually decodes
/// need a recognized type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    UByte,
    Char,
    Word,
    Short,
    Long,
    Float,
    Double,
    Date,
    Time,
    PString,
    CString,
    Unknown(u16),
}

impl ElementType {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => ElementType::UByte,
            2 => ElementType::Char,
            3 => ElementType::Word,
            4 => ElementType::Short,
            5 => ElementType::Long,
            7 => ElementType::Float,
            8 => ElementType::Double,
            10 => ElementType::Date,
            11 => ElementType::Time,
            18 => ElementType::PString,
            19 => ElementType::CString,
            other => ElementType::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            ElementType::UByte => 1,
            ElementType::Char => 2,
            ElementType::Word => 3,
            ElementType::Short => 4,
            ElementType::Long => 5,
            ElementType::Float => 7,
            ElementType::Double => 8,
            ElementType::Date => 10,
            ElementType::Time => 11,
            ElementType::PString => 18,
            ElementType::CString => 19,
            ElementType::Unknown(code) => *code,
        }
    }
}

/// One parsed directory record. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub tag: Tag,
    pub number: u32,
    pub element_type: ElementType,
    pub element_size: u16,
    pub element_count: u32,
    pub data_size: u32,
    /// Raw bytes of the offset field. Holds a big-endian file position, or
    /// the payload itself when `data_size <= 4`.
    offset_field: [u8; 4],
}

impl DirectoryEntry {
    pub(crate) fn parse(record: &[u8; ENTRY_LEN]) -> Self {
        let tag = Tag([record[0], record[1], record[2], record[3]]);
        let number = u32::from_be_bytes(record[4..8].try_into().unwrap());
        let element_type = ElementType::from_code(u16::from_be_bytes(record[8..10].try_into().unwrap()));
        let element_size = u16::from_be_bytes(record[10..12].try_into().unwrap());
        let element_count = u32::from_be_bytes(record[12..16].try_into().unwrap());
        let data_size = u32::from_be_bytes(record[16..20].try_into().unwrap());
        let offset_field = [record[20], record[21], record[22], record[23]];
        // record[24..28] is a reserved handle field, ignored
        Self {
            tag,
            number,
            element_type,
            element_size,
            element_count,
            data_size,
            offset_field,
        }
    }

    /// Payloads of 4 bytes or fewer live inside the record itself.
    pub fn is_inline(&self) -> bool {
        self.data_size <= 4
    }

    /// File position of the payload. Meaningless for inline entries.
    pub fn data_offset(&self) -> u32 {
        u32::from_be_bytes(self.offset_field)
    }

    pub(crate) fn inline_bytes(&self) -> &[u8] {
        &self.offset_field[..self.data_size as usize]
    }
}
