use crate::Palette;
use image::{Rgba, RgbaImage};
use thiserror::Error;

const TILE_SIZE: u32 = 16;

/// Where bitplane `k` lands in the pixel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// Plane 0 is the most significant bit.
    #[default]
    MsbFirst,
    /// Plane 0 is the least significant bit.
    LsbFirst,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BitplaneError {
    #[error("Unsupported depth of {0} bits per pixel")]
    InvalidDepth(u8),
    #[error("Plane alignment must be at least one byte")]
    ZeroAlignment,
    #[error("Tiled images must be a multiple of 16 pixels, got {width}x{height}")]
    UnalignedTiles { width: u32, height: u32 },
}

/// How a raw planar image is laid out.
///
/// Data comes in groups of `align_length * bpp` bytes: `align_length` bytes of plane 0, then
/// the same span of plane 1 and so on, covering `align_length * 8` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitplaneLayout {
    pub width: u32,
    pub height: u32,
    pub align_length: usize,
    pub bpp: u8,
    pub bit_order: BitOrder,
    /// Pixels are stored as consecutive 16x16 tiles instead of rows.
    pub tiled: bool,
}

impl BitplaneLayout {
    fn validate(&self) -> Result<(), BitplaneError> {
        if !(1..=8).contains(&self.bpp) {
            return Err(BitplaneError::InvalidDepth(self.bpp));
        }
        if self.align_length == 0 {
            return Err(BitplaneError::ZeroAlignment);
        }
        if self.tiled && (self.width % TILE_SIZE != 0 || self.height % TILE_SIZE != 0) {
            return Err(BitplaneError::UnalignedTiles {
                width: self.width,
                height: self.height,
            });
        }

        Ok(())
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes of planar data one image takes.
    pub fn image_size(&self) -> usize {
        self.pixel_count() * self.bpp as usize / 8
    }

    /// Split a file of back-to-back images, each preceded by `skip_header` bytes.
    /// A partial image at the end is dropped.
    pub fn blocks<'a>(
        &self,
        data: &'a [u8],
        skip_header: usize,
    ) -> impl Iterator<Item = &'a [u8]> + 'a {
        let image_size = self.image_size();
        let block_size = skip_header + image_size;
        let count = data.len().checked_div(block_size).unwrap_or(0);

        (0..count).map(move |index| {
            let start = index * block_size + skip_header;
            &data[start..start + image_size]
        })
    }
}

/// An image of palette indices read from planar data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitplaneImage {
    layout: BitplaneLayout,
    pixels: Vec<u8>,
}

impl BitplaneImage {
    /// Combine one bit from every plane into each pixel, MSB first within a byte. Groups past
    /// the end of `data` read as 0. Pixels after the last whole group stay 0.
    pub fn decode(data: &[u8], layout: BitplaneLayout) -> Result<Self, BitplaneError> {
        layout.validate()?;

        let align = layout.align_length;
        let bpp = layout.bpp as usize;
        let group_pixels = align * 8;
        let groups = layout.pixel_count() / group_pixels;

        let byte = |index: usize| data.get(index).copied().unwrap_or(0);

        let mut pixels = vec![0u8; layout.pixel_count()];
        for group in 0..groups {
            let group_start = group * align * bpp;

            for j in 0..group_pixels {
                let shift = 7 - (j % 8);
                let mut value = 0;

                for plane in 0..bpp {
                    let bit = (byte(group_start + align * plane + j / 8) >> shift) & 1;
                    value |= match layout.bit_order {
                        BitOrder::MsbFirst => bit << (bpp - plane - 1),
                        BitOrder::LsbFirst => bit << plane,
                    };
                }

                pixels[group * group_pixels + j] = value;
            }
        }

        Ok(Self { layout, pixels })
    }

    pub fn width(&self) -> u32 {
        self.layout.width
    }

    pub fn height(&self) -> u32 {
        self.layout.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        let index = if self.layout.tiled {
            let tiles_per_row = self.layout.width / TILE_SIZE;
            let tile = (y / TILE_SIZE) * tiles_per_row + x / TILE_SIZE;
            tile * TILE_SIZE * TILE_SIZE + (y % TILE_SIZE) * TILE_SIZE + x % TILE_SIZE
        } else {
            y * self.layout.width + x
        };

        self.pixels[index as usize]
    }

    pub fn to_image(&self, palette: &Palette) -> RgbaImage {
        RgbaImage::from_fn(self.width(), self.height(), |x, y| {
            let color = palette.color(self.pixel(x, y));
            Rgba([color[0], color[1], color[2], 255])
        })
    }
}
