//! Typed payload readers.
//!
//! The directory stores only byte extents; decoding happens here, on demand,
//! keyed by the entry a caller already looked up. All multi-byte values are
//! big-endian.

use crate::{
    directory::{DirectoryEntry, ElementType},
    error::FormatError,
    Container,
};

/// Calendar date payload: big-endian year, then month and day bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// Wall-clock time payload: hour, minute, second, hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl Container {
    /// Raw payload bytes for an entry, inline or offset-addressed.
    ///
    /// Offsets were bounds-checked at parse time, so slicing here cannot
    /// panic for entries that came out of this container's directory.
    pub fn data<'a>(&'a self, entry: &'a DirectoryEntry) -> &'a [u8] {
        if entry.is_inline() {
            entry.inline_bytes()
        } else {
            let start = entry.data_offset() as usize;
            &self.bytes()[start..start + entry.data_size as usize]
        }
    }

    fn expect_type(entry: &DirectoryEntry, expected: ElementType) -> Result<(), FormatError> {
        if entry.element_type != expected {
            return Err(FormatError::TypeMismatch {
                tag: entry.tag,
                number: entry.number,
                expected,
                found: entry.element_type,
            });
        }
        Ok(())
    }

    /// Signed 16-bit samples, `element_count` of them.
    pub fn read_i16s(&self, entry: &DirectoryEntry) -> Result<Vec<i16>, FormatError> {
        Self::expect_type(entry, ElementType::Short)?;
        let data = self.data(entry);
        Ok(data
            .chunks_exact(2)
            .take(entry.element_count as usize)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect())
    }

    pub fn read_u16s(&self, entry: &DirectoryEntry) -> Result<Vec<u16>, FormatError> {
        Self::expect_type(entry, ElementType::Word)?;
        let data = self.data(entry);
        Ok(data
            .chunks_exact(2)
            .take(entry.element_count as usize)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect())
    }

    pub fn read_u8s(&self, entry: &DirectoryEntry) -> Result<Vec<u8>, FormatError> {
        Self::expect_type(entry, ElementType::UByte)?;
        Ok(self.data(entry).to_vec())
    }

    pub fn read_i8s(&self, entry: &DirectoryEntry) -> Result<Vec<i8>, FormatError> {
        Self::expect_type(entry, ElementType::Char)?;
        Ok(self.data(entry).iter().map(|&b| b as i8).collect())
    }

    pub fn read_i32s(&self, entry: &DirectoryEntry) -> Result<Vec<i32>, FormatError> {
        Self::expect_type(entry, ElementType::Long)?;
        let data = self.data(entry);
        Ok(data
            .chunks_exact(4)
            .take(entry.element_count as usize)
            .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    pub fn read_f32s(&self, entry: &DirectoryEntry) -> Result<Vec<f32>, FormatError> {
        Self::expect_type(entry, ElementType::Float)?;
        let data = self.data(entry);
        Ok(data
            .chunks_exact(4)
            .take(entry.element_count as usize)
            .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    pub fn read_f64s(&self, entry: &DirectoryEntry) -> Result<Vec<f64>, FormatError> {
        Self::expect_type(entry, ElementType::Double)?;
        let data = self.data(entry);
        Ok(data
            .chunks_exact(8)
            .take(entry.element_count as usize)
            .map(|b| f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect())
    }

    /// Four-byte date records: big-endian year, month, day.
    pub fn read_dates(&self, entry: &DirectoryEntry) -> Result<Vec<Date>, FormatError> {
        Self::expect_type(entry, ElementType::Date)?;
        let data = self.data(entry);
        Ok(data
            .chunks_exact(4)
            .take(entry.element_count as usize)
            .map(|b| Date {
                year: u16::from_be_bytes([b[0], b[1]]),
                month: b[2],
                day: b[3],
            })
            .collect())
    }

    /// Four-byte time records: hour, minute, second, hundredths.
    pub fn read_times(&self, entry: &DirectoryEntry) -> Result<Vec<Time>, FormatError> {
        Self::expect_type(entry, ElementType::Time)?;
        let data = self.data(entry);
        Ok(data
            .chunks_exact(4)
            .take(entry.element_count as usize)
            .map(|b| Time {
                hour: b[0],
                minute: b[1],
                second: b[2],
                hundredths: b[3],
            })
            .collect())
    }

    /// Pascal-style string: leading length byte, then that many bytes.
    pub fn read_pascal_string(&self, entry: &DirectoryEntry) -> Result<String, FormatError> {
        Self::expect_type(entry, ElementType::PString)?;
        let data = self.data(entry);
        let text = match data.split_first() {
            Some((&len, rest)) => {
                let take = (len as usize).min(rest.len());
                String::from_utf8_lossy(&rest[..take]).into_owned()
            }
            None => String::new(),
        };
        Ok(text)
    }

    /// C-style string: bytes up to the first NUL.
    pub fn read_c_string(&self, entry: &DirectoryEntry) -> Result<String, FormatError> {
        Self::expect_type(entry, ElementType::CString)?;
        let data = self.data(entry);
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        Ok(String::from_utf8_lossy(&data[..end]).into_owned())
    }
}
