//! Writing well-formed containers.
//!
//! The write-side mirror of the parser: header, payload region, then the
//! directory, with the header's count and offset fields patched last. Tests
//! and tooling use this to synthesize instrument files; the analysis
//! pipeline never does.

use crate::{
    directory::{ElementType, Tag, ENTRY_LEN},
    value::{Date, Time},
    COUNT_OFFSET, DIR_OFFSET_OFFSET, FILE_SIGNATURE, HEADER_LEN,
};

struct PendingEntry {
    tag: Tag,
    number: u32,
    element_type: ElementType,
    element_size: u16,
    element_count: u32,
    data_size: u32,
    offset_field: [u8; 4],
}

pub struct ContainerBuilder {
    version: u16,
    /// Payload region bytes; the file positions they will land at start at
    /// `HEADER_LEN`.
    payload: Vec<u8>,
    entries: Vec<PendingEntry>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            version: 0x0101,
            payload: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    /// Add an entry with an explicit element type. Payloads of 4 bytes or
    /// fewer are stored inline in the record's offset field.
    pub fn add_entry(
        &mut self,
        tag: Tag,
        number: u32,
        element_type: ElementType,
        element_size: u16,
        element_count: u32,
        data: &[u8],
    ) -> &mut Self {
        let offset_field = if data.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..data.len()].copy_from_slice(data);
            inline
        } else {
            let offset = (HEADER_LEN + self.payload.len()) as u32;
            self.payload.extend_from_slice(data);
            offset.to_be_bytes()
        };
        self.entries.push(PendingEntry {
            tag,
            number,
            element_type,
            element_size,
            element_count,
            data_size: data.len() as u32,
            offset_field,
        });
        self
    }

    /// Signed 16-bit sample sequence, big-endian.
    pub fn add_i16s(&mut self, tag: Tag, number: u32, samples: &[i16]) -> &mut Self {
        let mut data = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            data.extend_from_slice(&s.to_be_bytes());
        }
        self.add_entry(tag, number, ElementType::Short, 2, samples.len() as u32, &data)
    }

    pub fn add_pascal_string(&mut self, tag: Tag, number: u32, text: &str) -> &mut Self {
        let bytes = text.as_bytes();
        let mut data = Vec::with_capacity(bytes.len() + 1);
        data.push(bytes.len().min(u8::MAX as usize) as u8);
        data.extend_from_slice(&bytes[..bytes.len().min(u8::MAX as usize)]);
        self.add_entry(tag, number, ElementType::PString, 1, data.len() as u32, &data)
    }

    pub fn add_date(&mut self, tag: Tag, number: u32, date: Date) -> &mut Self {
        let year = date.year.to_be_bytes();
        let data = [year[0], year[1], date.month, date.day];
        self.add_entry(tag, number, ElementType::Date, 4, 1, &data)
    }

    pub fn add_time(&mut self, tag: Tag, number: u32, time: Time) -> &mut Self {
        let data = [time.hour, time.minute, time.second, time.hundredths];
        self.add_entry(tag, number, ElementType::Time, 4, 1, &data)
    }

    pub fn add_c_string(&mut self, tag: Tag, number: u32, text: &str) -> &mut Self {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        self.add_entry(tag, number, ElementType::CString, 1, data.len() as u32, &data)
    }

    /// Assemble the final byte buffer: header, payload region, directory.
    pub fn finish(self) -> Vec<u8> {
        let dir_offset = (HEADER_LEN + self.payload.len()) as u32;
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.payload.len() + self.entries.len() * ENTRY_LEN);

        bytes.extend_from_slice(&FILE_SIGNATURE);
        bytes.extend_from_slice(&self.version.to_be_bytes());
        bytes.resize(HEADER_LEN, 0);
        bytes[COUNT_OFFSET..COUNT_OFFSET + 4]
            .copy_from_slice(&(self.entries.len() as u32).to_be_bytes());
        bytes[DIR_OFFSET_OFFSET..DIR_OFFSET_OFFSET + 4].copy_from_slice(&dir_offset.to_be_bytes());

        bytes.extend_from_slice(&self.payload);

        for entry in &self.entries {
            bytes.extend_from_slice(&entry.tag.0);
            bytes.extend_from_slice(&entry.number.to_be_bytes());
            bytes.extend_from_slice(&entry.element_type.code().to_be_bytes());
            bytes.extend_from_slice(&entry.element_size.to_be_bytes());
            bytes.extend_from_slice(&entry.element_count.to_be_bytes());
            bytes.extend_from_slice(&entry.data_size.to_be_bytes());
            bytes.extend_from_slice(&entry.offset_field);
            bytes.extend_from_slice(&[0u8; 4]);
        }
        bytes
    }
}
