use crate::{
    compression::tfdce::{self, PlaneOrder, OUTPUT_SIZE, SECTION_COUNT, SECTION_SIZE},
    palette::ColorIndex,
    Palette,
};
use image::{Rgba, RgbaImage};

pub const FACE_WIDTH: u32 = 64;
pub const FACE_HEIGHT: u32 = 80;

const PLANE_ORDER_OFFSET: usize = 7;
const TABLE_LEN_OFFSET: usize = 9;
const TABLE_OFFSET: usize = 10;

/// A decoded TF-DCE face record: three 640-byte bitplane sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    raw: Vec<u8>,
    plane_order: PlaneOrder,
    decoded_len: usize,
}

impl Face {
    /// Decode a face record. Never fails: missing header bytes read as 0 and a stream that ends
    /// early leaves the rest of the output zeroed (see [`Face::is_truncated`]).
    pub fn decode(data: &[u8]) -> Self {
        let header = |offset: usize| data.get(offset).copied().unwrap_or(0);

        let plane_order = PlaneOrder::from_selector(header(PLANE_ORDER_OFFSET));
        let stream_start = TABLE_OFFSET + header(TABLE_LEN_OFFSET) as usize * 2;

        let table = data
            .get(TABLE_OFFSET..stream_start.min(data.len()))
            .unwrap_or(&[]);
        let stream = data.get(stream_start..).unwrap_or(&[]);

        let output = tfdce::decode(stream, table, plane_order);
        if output.is_truncated() {
            log::debug!(
                "Face data ended after {} of {} bytes",
                output.decoded_len,
                OUTPUT_SIZE
            );
        }

        Face {
            raw: output.data,
            plane_order,
            decoded_len: output.decoded_len,
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn plane_order(&self) -> PlaneOrder {
        self.plane_order
    }

    pub fn decoded_len(&self) -> usize {
        self.decoded_len
    }

    pub fn is_truncated(&self) -> bool {
        self.decoded_len < OUTPUT_SIZE
    }

    /// The output sections rearranged so index `n` holds bitplane `n`.
    pub fn bitplanes(&self) -> [&[u8]; SECTION_COUNT] {
        let mut planes: [&[u8]; SECTION_COUNT] = [&[]; SECTION_COUNT];
        for (section, data) in self.raw.chunks_exact(SECTION_SIZE).enumerate() {
            let plane = self.plane_order.planes()[section] as usize;
            planes[plane] = data;
        }
        planes
    }

    pub fn color_index(&self, x: u32, y: u32) -> ColorIndex {
        let column = x / 8;
        let bit = 7 - (x % 8);

        let i = if column % 2 == 0 {
            y
        } else {
            FACE_HEIGHT - 1 - y
        };
        let byte_index = (column * FACE_HEIGHT + i) as usize;

        let [plane0, plane1, plane2] = self.bitplanes();
        ColorIndex::from_bits(
            plane0[byte_index] >> bit,
            plane1[byte_index] >> bit,
            plane2[byte_index] >> bit,
        )
    }

    pub fn to_image(&self, palette: &Palette) -> RgbaImage {
        RgbaImage::from_fn(FACE_WIDTH, FACE_HEIGHT, |x, y| {
            let color = palette.get(self.color_index(x, y));
            Rgba([color[0], color[1], color[2], 255])
        })
    }
}
