pub mod ls11;
pub mod tfdce;

/// Positional reader over a borrowed byte slice. Reads past the end return `None`.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    src: &'a [u8],
    read_index: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self { src, read_index: 0 }
    }

    pub fn position(&self) -> usize {
        self.read_index
    }

    pub fn is_end(&self) -> bool {
        self.read_index >= self.src.len()
    }

    pub fn remaining(&self) -> usize {
        self.src.len().saturating_sub(self.read_index)
    }

    pub fn read(&mut self) -> Option<u8> {
        let value = *self.src.get(self.read_index)?;
        self.read_index += 1;
        Some(value)
    }

    pub fn take(&mut self, count: usize) -> Option<&'a [u8]> {
        let end = self.read_index.checked_add(count)?;
        let slice = self.src.get(self.read_index..end)?;
        self.read_index = end;
        Some(slice)
    }

    pub fn read_u32_be(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u32_le(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u16_le(&mut self) -> Option<u16> {
        let bytes = self.take(2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}

/// MSB-first bit reader. Bits past the end of the slice read as 0.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    src: &'a [u8],
    byte_pos: usize,
    // 7 = most significant bit of the current byte
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            byte_pos: 0,
            bit_pos: 7,
        }
    }

    pub fn byte_position(&self) -> usize {
        self.byte_pos
    }

    pub fn is_end(&self) -> bool {
        self.byte_pos >= self.src.len()
    }

    pub fn read_bit(&mut self) -> u8 {
        let byte = self.src.get(self.byte_pos).copied().unwrap_or(0);
        let bit = (byte >> self.bit_pos) & 1;

        if self.bit_pos == 0 {
            self.bit_pos = 7;
            self.byte_pos += 1;
        } else {
            self.bit_pos -= 1;
        }

        bit
    }

    /// Read `count` bits into the low end of a `u32`, dropping anything shifted past bit 31.
    pub fn read_bits(&mut self, count: u32) -> u32 {
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | u32::from(self.read_bit());
        }
        value
    }
}
