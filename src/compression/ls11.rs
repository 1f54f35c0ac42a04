use super::BitReader;

/// Shortest back-reference the encoder produces.
pub const MATCH_MINIMUM: usize = 3;

/// Codes below this value index the dictionary, codes at or above it are back-references.
const DICTIONARY_CODES: u32 = 256;

/// Read one variable-length code: a run of 1 bits closed by a 0 bit, followed by as many
/// plain bits as the run was long (closing bit included). Both halves are summed.
pub fn read_code(reader: &mut BitReader) -> u32 {
    let mut prefix = 0u32;
    let mut count = 0u32;

    loop {
        let bit = reader.read_bit();
        prefix = (prefix << 1) | u32::from(bit);
        count += 1;

        if bit == 0 {
            break;
        }
    }

    let suffix = reader.read_bits(count);
    prefix.wrapping_add(suffix)
}

/// Decode one compressed LS11 entry into exactly `uncompressed_size` bytes.
///
/// Truncated input leaves the tail of the output zero-filled. Back-references reaching before
/// the start of the output read as 0. The output is allocated up front, so callers bound
/// `uncompressed_size` (see [`crate::MAX_ENTRY_SIZE`]).
pub fn decode(dictionary: &[u8; 256], compressed: &[u8], uncompressed_size: usize) -> Vec<u8> {
    let mut dst = vec![0u8; uncompressed_size];
    let mut reader = BitReader::new(compressed);
    let mut write_index = 0;

    while !reader.is_end() && write_index < uncompressed_size {
        let code = read_code(&mut reader);

        if code < DICTIONARY_CODES {
            dst[write_index] = dictionary[code as usize];
            write_index += 1;
            continue;
        }

        let back = (code - DICTIONARY_CODES) as usize;
        let count = (read_code(&mut reader) as usize).saturating_add(MATCH_MINIMUM);
        log::trace!("backref: back {} count {} at {}", back, count, write_index);

        // byte by byte, so short distances repeat the bytes just written
        for _ in 0..count {
            if write_index >= uncompressed_size {
                break;
            }

            dst[write_index] = write_index
                .checked_sub(back)
                .map(|src_index| dst[src_index])
                .unwrap_or(0);
            write_index += 1;
        }
    }

    if write_index < uncompressed_size {
        log::debug!(
            "compressed data ended after {} of {} bytes",
            write_index,
            uncompressed_size
        );
    }

    dst
}
