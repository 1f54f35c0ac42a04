use super::ByteReader;

/// Bytes per bitplane section of the output.
pub const SECTION_SIZE: usize = 640;
pub const SECTION_COUNT: usize = 3;
/// Decoded size of every face record.
pub const OUTPUT_SIZE: usize = SECTION_SIZE * SECTION_COUNT;

const PLANE_STRIDE: usize = 80;
/// Size of one emulated VGA plane.
pub const PLANE_MEMORY_SIZE: usize = PLANE_STRIDE * PLANE_STRIDE;
const PLANE_COUNT: usize = 4;

/// Plane selector meaning "the plane currently being written".
const DESTINATION_PLANE: u8 = 3;

/// Which emulated plane each output section is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneOrder([u8; SECTION_COUNT]);

impl PlaneOrder {
    pub const DEFAULT: Self = Self([0, 2, 1]);

    /// Look up the plane order from the selector byte of a face record header.
    pub const fn from_selector(selector: u8) -> Self {
        match selector {
            0xc6 => Self([0, 1, 2]),
            0xc9 => Self([1, 0, 2]),
            0xd2 => Self([0, 2, 1]),
            0xd8 => Self([2, 0, 1]),
            0xe1 => Self([1, 2, 0]),
            0xe4 => Self([2, 1, 0]),
            _ => Self::DEFAULT,
        }
    }

    pub const fn planes(&self) -> [u8; SECTION_COUNT] {
        self.0
    }

    pub fn plane_for_section(&self, section: usize) -> Option<usize> {
        self.0.get(section).map(|&plane| plane as usize)
    }
}

impl Default for PlaneOrder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Map an output position to its address in plane memory.
///
/// Sections are scanned column by column (8 byte-columns of 80 rows), with every odd column
/// walked bottom to top.
pub const fn zigzag_address(position: usize) -> usize {
    let offset = position % SECTION_SIZE;
    let column = offset / PLANE_STRIDE;
    let i = offset % PLANE_STRIDE;

    let row = if column % 2 == 0 {
        i
    } else {
        PLANE_STRIDE - 1 - i
    };

    row * PLANE_STRIDE + column
}

/// Four recently used bit-mask patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCache([u8; 4]);

impl PatternCache {
    pub const INITIAL: [u8; 4] = [0x00, 0xff, 0x55, 0xaa];

    pub fn get(&self, slot: u8) -> u8 {
        self.0[slot as usize & 3]
    }

    /// Move a just-used pattern one slot towards the front.
    pub fn age(&mut self, slot: u8) {
        let slot = slot as usize & 3;
        if slot > 0 {
            self.0.swap(slot - 1, slot);
        }
    }

    /// Insert a fresh pattern at slot 2, pushing the previous one into slot 3.
    pub fn promote(&mut self, pattern: u8) {
        self.0[3] = self.0[2];
        self.0[2] = pattern;
    }

    pub fn patterns(&self) -> [u8; 4] {
        self.0
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self(Self::INITIAL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    None,
    Complement,
    RotateRight,
    RotateLeft,
}

impl Transform {
    fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Self::None,
            1 => Self::Complement,
            2 => Self::RotateRight,
            _ => Self::RotateLeft,
        }
    }

    fn apply(self, value: u8) -> u8 {
        match self {
            Self::None => value,
            Self::Complement => !value,
            Self::RotateRight => value.rotate_right(1),
            Self::RotateLeft => value.rotate_left(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    /// Pattern from a cache slot, aged after use.
    Cached(u8),
    /// Pattern given inline, promoted into the cache.
    Immediate(u8),
    /// No masking, but the cache slot is still aged.
    Unmasked(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Fill { count: usize, value: u8 },
    Literal { count: usize },
    Single(u8),
    Pair { count: usize, values: [u8; 2] },

    /// Copy from the output at a fixed distance.
    Backref { count: usize, back: usize },
    /// Cycle over the `back` bytes preceding the instruction.
    RepeatBackref { count: usize, back: usize },
    /// Copy from the destination plane at `back` bytes before the current address.
    PlaneBackref { count: usize, back: usize },

    PlaneRead { count: usize, source: u8, transform: Transform },
    MaskedRead { count: usize, source: u8, mask: Mask },
    /// Masked read whose mask rotates after every byte.
    RotatingMaskedRead { count: usize, source: u8, mask: Mask },

    Skip,
}

/// Two bytes built from the nibbles of `value`: low nibble doubled, then high nibble doubled.
fn nibble_pair(value: u8) -> [u8; 2] {
    let word = u16::from_be_bytes([value, value.rotate_left(4)]);
    word.rotate_left(4).to_be_bytes()
}

impl Operation {
    /// Decode one opcode, reading its parameter bytes from the stream.
    ///
    /// Returns `None` if the stream ends before a parameter the operation cannot run without.
    /// Plane reads still run once when only their count byte is missing, and a missing immediate
    /// mask reads as `0xff`. A back-reference without its distance emits zeros.
    pub fn decode(op: u8, decompressor: &mut Decompressor) -> Option<Self> {
        let lo = (op & 0x0f) as usize;

        let operation = match op {
            n @ 0x00..=0x1f => Self::decode_table_word(decompressor.table_word(n)),

            0x20..=0x2f => match decompressor.read() {
                Some(back) => Self::Backref {
                    back: back as usize,
                    count: lo + 3,
                },
                None => Self::Fill {
                    count: lo + 3,
                    value: 0,
                },
            },
            n @ 0x30..=0x3f => Self::PlaneRead {
                count: decompressor.read_count(),
                source: (n >> 2) & 3,
                transform: Transform::from_bits(n),
            },
            0x40..=0x4f => Self::PlaneBackref {
                count: decompressor.read()? as usize + 2,
                back: lo + 1,
            },
            n @ 0x50..=0x5b => Self::MaskedRead {
                count: decompressor.read()? as usize + 2,
                source: (n >> 2) & 3,
                mask: Mask::Cached(n & 3),
            },
            n @ 0x5c..=0x5f => {
                let pattern = decompressor.read().unwrap_or(0xff);
                let count = decompressor.read_count();

                Self::MaskedRead {
                    count,
                    source: n & 3,
                    mask: Mask::Immediate(pattern),
                }
            }
            0x60..=0x6f => {
                let first = decompressor.read()?;
                let second = decompressor.read()?;

                Self::Pair {
                    count: lo + 1,
                    values: [first, second],
                }
            }
            0x70..=0x7f => Self::Literal { count: lo + 1 },
            0x80..=0x8f => Self::Pair {
                count: lo + 1,
                values: nibble_pair(decompressor.read()?),
            },
            n @ 0x90..=0x9b => Self::RotatingMaskedRead {
                count: decompressor.read_count(),
                source: (n >> 2) & 3,
                mask: Mask::Cached(n & 3),
            },
            n @ 0x9c..=0x9f => {
                let pattern = decompressor.read().unwrap_or(0xff);
                let count = decompressor.read_count();

                Self::RotatingMaskedRead {
                    count,
                    source: n & 3,
                    mask: Mask::Immediate(pattern),
                }
            }
            n @ 0xa0..=0xff => Self::Fill {
                count: (n - 0x9e) as usize,
                value: decompressor.read()?,
            },
        };

        Some(operation)
    }

    /// Decode a word from the per-image header table. The high nibble of the low byte picks
    /// the operation, the remaining bits are its parameters.
    pub fn decode_table_word(word: u16) -> Self {
        let [lo, hi] = word.to_le_bytes();
        let param = (lo & 0x0f) as usize;
        let count = hi as usize + 2;

        match lo >> 4 {
            0x0a..=0x0f => Self::Fill {
                count: (lo - 0x9e) as usize,
                value: hi,
            },
            0x02 => Self::RepeatBackref {
                count: param + 3,
                back: (hi as usize).max(1),
            },
            0x03 => Self::PlaneRead {
                count,
                source: (lo >> 2) & 3,
                transform: Transform::from_bits(lo),
            },
            0x04 => Self::PlaneBackref {
                count,
                back: param + 1,
            },
            0x05 => Self::MaskedRead {
                count,
                source: (lo >> 2) & 3,
                mask: Mask::Cached(lo & 3),
            },
            0x07 if param == 0 => Self::Single(hi),
            0x07 => Self::Single(((param as u8) << 4) | param as u8),
            0x08 => Self::Pair {
                count: param + 1,
                values: nibble_pair(hi),
            },
            0x09 => Self::MaskedRead {
                count,
                source: (lo >> 2) & 3,
                mask: Mask::Unmasked(lo & 3),
            },
            _ => Self::Skip,
        }
    }
}

/// Result of running the interpreter over one opcode stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanarOutput {
    /// Always `OUTPUT_SIZE` bytes, zero padded past `decoded_len`.
    pub data: Vec<u8>,
    pub decoded_len: usize,
}

impl PlanarOutput {
    pub fn is_truncated(&self) -> bool {
        self.decoded_len < OUTPUT_SIZE
    }
}

#[derive(Debug, Clone)]
pub struct Decompressor<'a> {
    src: ByteReader<'a>,
    table: &'a [u8],
    order: PlaneOrder,

    dst: Vec<u8>,
    planes: [[u8; PLANE_MEMORY_SIZE]; PLANE_COUNT],
    cache: PatternCache,
}

/// Run the planar interpreter over `stream`, using `table` as the header word table.
pub fn decode(stream: &[u8], table: &[u8], order: PlaneOrder) -> PlanarOutput {
    Decompressor::new(stream, table, order).decompress()
}

impl<'a> Decompressor<'a> {
    pub fn new(stream: &'a [u8], table: &'a [u8], order: PlaneOrder) -> Self {
        Self {
            src: ByteReader::new(stream),
            table,
            order,

            dst: Vec::with_capacity(OUTPUT_SIZE),
            planes: [[0; PLANE_MEMORY_SIZE]; PLANE_COUNT],
            cache: PatternCache::default(),
        }
    }

    pub fn decompress(mut self) -> PlanarOutput {
        while !self.is_full() && self.step() {}

        let decoded_len = self.dst.len();
        let mut data = self.dst;
        data.resize(OUTPUT_SIZE, 0);

        PlanarOutput { data, decoded_len }
    }

    /// Decode and run one instruction. Returns `false` once the stream is exhausted.
    fn step(&mut self) -> bool {
        let Some(op) = self.src.read() else {
            return false;
        };

        let Some(operation) = Operation::decode(op, self) else {
            log::trace!("stream ended inside parameters of {:#04x}", op);
            return false;
        };
        log::trace!("operation {:#04x}: {:?}", op, operation);

        self.execute(operation);
        true
    }

    fn read(&mut self) -> Option<u8> {
        self.src.read()
    }

    /// Count byte of a plane read, biased by 2. A missing byte counts as one.
    fn read_count(&mut self) -> usize {
        self.src.read().map_or(1, |count| count as usize + 2)
    }

    /// Little-endian word `index` of the header table, 0 past its end.
    fn table_word(&self, index: u8) -> u16 {
        let offset = index as usize * 2;
        self.table
            .get(offset..offset + 2)
            .map(|word| u16::from_le_bytes([word[0], word[1]]))
            .unwrap_or(0)
    }

    fn is_full(&self) -> bool {
        self.dst.len() >= OUTPUT_SIZE
    }

    fn destination_plane(&self) -> usize {
        let section = self.dst.len() / SECTION_SIZE;
        self.order
            .plane_for_section(section)
            .unwrap_or(DESTINATION_PLANE as usize)
    }

    fn select_plane(&self, selector: u8) -> usize {
        match selector {
            0..=2 => self.order.0[selector as usize] as usize,
            _ => self.destination_plane(),
        }
    }

    /// Value of `plane` at the address the next output byte maps to.
    fn plane_value(&self, plane: usize) -> u8 {
        self.planes[plane][zigzag_address(self.dst.len())]
    }

    fn push(&mut self, value: u8) {
        if self.is_full() {
            return;
        }

        let position = self.dst.len();
        if let Some(plane) = self.order.plane_for_section(position / SECTION_SIZE) {
            self.planes[plane][zigzag_address(position)] = value;
        }

        self.dst.push(value);
    }

    fn emit_with(&mut self, count: usize, mut next: impl FnMut(&Self) -> u8) {
        for _ in 0..count {
            if self.is_full() {
                break;
            }

            let value = next(&*self);
            self.push(value);
        }
    }

    fn resolve_mask(&mut self, mask: Mask) -> u8 {
        match mask {
            Mask::Cached(slot) => {
                let pattern = self.cache.get(slot);
                self.cache.age(slot);
                pattern
            }
            Mask::Immediate(pattern) => {
                self.cache.promote(pattern);
                pattern
            }
            Mask::Unmasked(slot) => {
                self.cache.age(slot);
                0xff
            }
        }
    }

    fn execute(&mut self, operation: Operation) {
        match operation {
            Operation::Fill { count, value } => self.emit_with(count, |_| value),
            Operation::Literal { count } => self.copy_literal(count),
            Operation::Single(value) => self.push(value),
            Operation::Pair { count, values } => self.repeat_pair(count, values),

            Operation::Backref { count, back } => self.copy_backref(count, back),
            Operation::RepeatBackref { count, back } => self.copy_repeat_backref(count, back),
            Operation::PlaneBackref { count, back } => self.copy_plane_backref(count, back),

            Operation::PlaneRead {
                count,
                source,
                transform,
            } => self.read_plane(count, source, transform),
            Operation::MaskedRead {
                count,
                source,
                mask,
            } => self.read_plane_masked(count, source, mask),
            Operation::RotatingMaskedRead {
                count,
                source,
                mask,
            } => self.read_plane_rotating_mask(count, source, mask),

            Operation::Skip => {}
        }
    }

    fn copy_literal(&mut self, count: usize) {
        for _ in 0..count {
            if self.is_full() {
                break;
            }

            match self.read() {
                Some(value) => self.push(value),
                None => break,
            }
        }
    }

    fn repeat_pair(&mut self, count: usize, values: [u8; 2]) {
        for _ in 0..count {
            if self.is_full() {
                break;
            }

            self.push(values[0]);
            self.push(values[1]);
        }
    }

    fn copy_backref(&mut self, count: usize, back: usize) {
        self.emit_with(count, |s| {
            s.dst
                .len()
                .checked_sub(back)
                .and_then(|index| s.dst.get(index))
                .copied()
                .unwrap_or(0)
        });
    }

    fn copy_repeat_backref(&mut self, count: usize, back: usize) {
        let start = self.dst.len();

        self.emit_with(count, |s| {
            let step = (s.dst.len() - start) % back;
            (start + step)
                .checked_sub(back)
                .map(|index| s.dst[index])
                .unwrap_or(0)
        });
    }

    fn copy_plane_backref(&mut self, count: usize, back: usize) {
        self.emit_with(count, |s| {
            let plane = s.destination_plane();
            zigzag_address(s.dst.len())
                .checked_sub(back)
                .map(|address| s.planes[plane][address])
                .unwrap_or(0)
        });
    }

    fn read_plane(&mut self, count: usize, source: u8, transform: Transform) {
        let plane = self.select_plane(source);

        // the first section has nothing to read back yet
        if self.dst.len() < SECTION_SIZE {
            self.emit_with(count, |s| s.dst.last().copied().unwrap_or(0));
            return;
        }

        self.emit_with(count, |s| transform.apply(s.plane_value(plane)));
    }

    fn read_plane_masked(&mut self, count: usize, source: u8, mask: Mask) {
        let plane = self.select_plane(source);
        let pattern = self.resolve_mask(mask);

        self.emit_with(count, |s| s.plane_value(plane) & pattern);
    }

    fn read_plane_rotating_mask(&mut self, count: usize, source: u8, mask: Mask) {
        let plane = self.select_plane(source);
        let mut pattern = self.resolve_mask(mask);
        let step = if pattern == 0x55 || pattern == 0xaa { 1 } else { 2 };

        self.emit_with(count, |s| {
            let value = s.plane_value(plane) & pattern;
            pattern = pattern.rotate_left(step);
            value
        });
    }
}
