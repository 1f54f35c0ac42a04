use crate::compression::{ls11, ByteReader};
use thiserror::Error;

pub const HEADER_SIZE: usize = 16;
pub const DICTIONARY_SIZE: usize = 256;
const RECORD_SIZE: usize = 12;

/// Largest uncompressed size accepted for a compressed entry.
pub const MAX_ENTRY_SIZE: u32 = 1 << 24;

/// One entry of the file allocation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatRecord {
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub offset: u32,
}

impl FatRecord {
    fn read(reader: &mut ByteReader) -> Option<Self> {
        Some(Self {
            compressed_size: reader.read_u32_be()?,
            uncompressed_size: reader.read_u32_be()?,
            offset: reader.read_u32_be()?,
        })
    }

    /// Stored entries are kept verbatim.
    pub fn is_stored(&self) -> bool {
        self.compressed_size == self.uncompressed_size
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("Archive is {len} bytes, too short for header and dictionary")]
    TruncatedHeader { len: usize },
    #[error("Entry {index} at {offset:#x} with {size} bytes reaches past the end of the {len} byte archive")]
    RecordOutOfBounds {
        index: usize,
        offset: u32,
        size: u32,
        len: usize,
    },
    #[error("Entry {index} expands {compressed} bytes to {uncompressed}, more than the {} byte limit", MAX_ENTRY_SIZE)]
    EntryTooLarge {
        index: usize,
        compressed: u32,
        uncompressed: u32,
    },
}

/// A parsed LS11 archive. Entries are decoded on demand.
#[derive(Debug, Clone)]
pub struct Archive<'a> {
    data: &'a [u8],
    header: &'a [u8],
    dictionary: &'a [u8; DICTIONARY_SIZE],
    records: Vec<FatRecord>,
}

impl<'a> Archive<'a> {
    /// Parse the header, dictionary and allocation table. Every record is checked against the
    /// archive length and [`MAX_ENTRY_SIZE`] before anything is decoded.
    pub fn parse(data: &'a [u8]) -> Result<Self, ArchiveError> {
        let mut reader = ByteReader::new(data);

        let truncated = || ArchiveError::TruncatedHeader { len: data.len() };
        let header = reader.take(HEADER_SIZE).ok_or_else(truncated)?;
        let dictionary: &[u8; DICTIONARY_SIZE] = reader
            .take(DICTIONARY_SIZE)
            .and_then(|dictionary| dictionary.try_into().ok())
            .ok_or_else(truncated)?;

        let mut records = Vec::new();
        while reader.remaining() >= RECORD_SIZE {
            let Some(record) = FatRecord::read(&mut reader) else {
                break;
            };

            if record.compressed_size == 0 {
                break;
            }

            let end = (record.offset as usize).checked_add(record.compressed_size as usize);
            if end.map_or(true, |end| end > data.len()) {
                return Err(ArchiveError::RecordOutOfBounds {
                    index: records.len(),
                    offset: record.offset,
                    size: record.compressed_size,
                    len: data.len(),
                });
            }

            if !record.is_stored() && record.uncompressed_size > MAX_ENTRY_SIZE {
                return Err(ArchiveError::EntryTooLarge {
                    index: records.len(),
                    compressed: record.compressed_size,
                    uncompressed: record.uncompressed_size,
                });
            }

            records.push(record);
        }

        log::debug!("Parsed LS11 archive with {} entries", records.len());

        Ok(Self {
            data,
            header,
            dictionary,
            records,
        })
    }

    pub fn header(&self) -> &'a [u8] {
        self.header
    }

    pub fn dictionary(&self) -> &'a [u8; DICTIONARY_SIZE] {
        self.dictionary
    }

    pub fn records(&self) -> &[FatRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decode entry `index`. The result is always `uncompressed_size` bytes long.
    pub fn entry(&self, index: usize) -> Option<Vec<u8>> {
        let record = self.records.get(index)?;

        let start = record.offset as usize;
        let compressed = &self.data[start..start + record.compressed_size as usize];

        let entry = if record.is_stored() {
            compressed.to_vec()
        } else {
            ls11::decode(
                self.dictionary,
                compressed,
                record.uncompressed_size as usize,
            )
        };

        log::debug!(
            "Decoded entry {} ({} -> {} bytes)",
            index,
            record.compressed_size,
            entry.len()
        );

        Some(entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        (0..self.len()).filter_map(|index| self.entry(index))
    }

    pub fn decode_all(&self) -> Vec<Vec<u8>> {
        self.entries().collect()
    }
}

/// Count the entries of an archive without decoding any of them.
pub fn count_entries(data: &[u8]) -> Result<usize, ArchiveError> {
    Archive::parse(data).map(|archive| archive.len())
}
