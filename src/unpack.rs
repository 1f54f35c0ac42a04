use crate::compression::ByteReader;
use thiserror::Error;

/// Bytes per table entry: little-endian `u32` address and `u16` size.
const ENTRY_SIZE: usize = 6;

/// One entry of a packed file's table. `address` is relative to the end of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedEntry {
    pub address: u32,
    pub size: u16,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UnpackError {
    #[error("Table entry {index} is cut off at the end of the {len} byte file")]
    TruncatedTable { index: usize, len: usize },
    #[error("Entry {index} at {address:#x} with {size} bytes reaches past the end of the {len} byte file")]
    EntryOutOfBounds {
        index: usize,
        address: u32,
        size: u16,
        len: usize,
    },
}

/// An uncompressed packed file: a table of `(address, size)` pairs followed by the entry data.
///
/// The table has no count or sentinel. It ends once the table read so far plus the sizes of all
/// entries seen reach the end of the file.
#[derive(Debug, Clone)]
pub struct PackedFile<'a> {
    data: &'a [u8],
    entries: Vec<PackedEntry>,
}

impl<'a> PackedFile<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, UnpackError> {
        let mut reader = ByteReader::new(data);
        let mut entries = Vec::new();
        let mut data_size = 0usize;

        while !reader.is_end() {
            let truncated = || UnpackError::TruncatedTable {
                index: entries.len(),
                len: data.len(),
            };
            let address = reader.read_u32_le().ok_or_else(truncated)?;
            let size = reader.read_u16_le().ok_or_else(truncated)?;

            entries.push(PackedEntry { address, size });
            data_size += size as usize;

            if reader.position() + data_size >= data.len() {
                break;
            }
        }

        let header_size = entries.len() * ENTRY_SIZE;
        for (index, entry) in entries.iter().enumerate() {
            let end = (entry.address as usize)
                .checked_add(header_size)
                .and_then(|start| start.checked_add(entry.size as usize));

            if end.map_or(true, |end| end > data.len()) {
                return Err(UnpackError::EntryOutOfBounds {
                    index,
                    address: entry.address,
                    size: entry.size,
                    len: data.len(),
                });
            }
        }

        log::debug!(
            "Parsed packed file with {} entries, {} byte table",
            entries.len(),
            header_size
        );

        Ok(Self { data, entries })
    }

    pub fn entries(&self) -> &[PackedEntry] {
        &self.entries
    }

    /// Size of the table in front of the entry data.
    pub fn header_size(&self) -> usize {
        self.entries.len() * ENTRY_SIZE
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&'a [u8]> {
        let entry = self.entries.get(index)?;
        let start = entry.address as usize + self.header_size();

        self.data.get(start..start + entry.size as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.len()).filter_map(|index| self.entry(index))
    }
}
