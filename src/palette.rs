use image::Rgb;

/// Number of colors a 4-bitplane image can index. Faces use the first 8.
pub const PALETTE_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette([Rgb<u8>; PALETTE_SIZE]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorIndex(u8);

impl ColorIndex {
    pub const fn new(index: u8) -> Self {
        assert!(index < 16, "ColorIndex must be less than 16");

        ColorIndex(index)
    }

    /// Combine one bit from each of the three face bitplanes.
    pub const fn from_bits(plane0: u8, plane1: u8, plane2: u8) -> Self {
        ColorIndex(((plane2 & 1) << 2) | ((plane1 & 1) << 1) | (plane0 & 1))
    }

    pub const fn as_u8(&self) -> u8 {
        self.0
    }
}

impl Palette {
    /// Built-in face palette, used when the caller supplies none.
    pub const DEFAULT: Palette = Palette([
        Rgb([0, 0, 0]),
        Rgb([0, 186, 117]),
        Rgb([239, 101, 0]),
        Rgb([255, 207, 85]),
        Rgb([32, 69, 170]),
        Rgb([138, 207, 255]),
        Rgb([207, 117, 170]),
        Rgb([255, 255, 255]),
        Rgb([0, 0, 0]),
        Rgb([0, 0, 0]),
        Rgb([0, 0, 0]),
        Rgb([0, 0, 0]),
        Rgb([0, 0, 0]),
        Rgb([0, 0, 0]),
        Rgb([0, 0, 0]),
        Rgb([0, 0, 0]),
    ]);

    /// Read a palette from RGB triplets. Extra data is ignored and missing entries stay black.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut palette = [Rgb([0, 0, 0]); PALETTE_SIZE];
        for (i, color) in data.chunks_exact(3).take(PALETTE_SIZE).enumerate() {
            palette[i] = Rgb([color[0], color[1], color[2]]);
        }
        Palette(palette)
    }

    pub fn from_colors(colors: &[[u8; 3]]) -> Self {
        let mut palette = [Rgb([0, 0, 0]); PALETTE_SIZE];
        for (slot, &color) in palette.iter_mut().zip(colors) {
            *slot = Rgb(color);
        }
        Palette(palette)
    }

    pub const fn get(&self, index: ColorIndex) -> Rgb<u8> {
        self.0[index.0 as usize]
    }

    /// Color for a raw pixel value. Values past the palette are black.
    pub fn color(&self, value: u8) -> Rgb<u8> {
        self.0.get(value as usize).copied().unwrap_or(Rgb([0, 0, 0]))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::DEFAULT
    }
}
