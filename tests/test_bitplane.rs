use image::Rgba;
use koei_gfx::{Archive, BitOrder, BitplaneImage, BitplaneLayout, Palette};

fn layout(width: u32, height: u32) -> BitplaneLayout {
    BitplaneLayout {
        width,
        height,
        align_length: 1,
        bpp: 4,
        bit_order: BitOrder::MsbFirst,
        tiled: false,
    }
}

#[test]
fn rows_of_sixteen_colors() -> anyhow::Result<()> {
    // pixel x of each 8 pixel group has value x (left half) or x + 8 (right half)
    let left = [0x00, 0x0f, 0x33, 0x55];
    let right = [0xff, 0x0f, 0x33, 0x55];
    let data = [left, right].concat();

    let image = BitplaneImage::decode(&data, layout(16, 1))?;
    let values: Vec<u8> = (0..16).map(|x| image.pixel(x, 0)).collect();
    assert_eq!(values, (0..16).collect::<Vec<u8>>());

    let colors: Vec<u8> = (0..48).map(|i| (i / 3) as u8 * 16).collect();
    let png = image.to_image(&Palette::from_slice(&colors));
    assert_eq!(png.dimensions(), (16, 1));
    assert_eq!(png.get_pixel(15, 0), &Rgba([240, 240, 240, 255]));

    Ok(())
}

#[test]
fn missing_palette_entries_render_black() -> anyhow::Result<()> {
    let image = BitplaneImage::decode(&[0xff, 0xff, 0xff, 0xff], layout(8, 1))?;
    let png = image.to_image(&Palette::from_slice(&[1, 2, 3]));

    assert_eq!(image.pixel(0, 0), 15);
    assert_eq!(png.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));

    Ok(())
}

#[test]
fn stored_archive_entries_decode_as_images() -> anyhow::Result<()> {
    let image_data = [0x80, 0x00, 0x00, 0x00];

    let mut data = vec![0u8; 16 + 256];
    let offset = (data.len() + 24) as u32;
    data.extend_from_slice(&4u32.to_be_bytes());
    data.extend_from_slice(&4u32.to_be_bytes());
    data.extend_from_slice(&offset.to_be_bytes());
    data.extend_from_slice(&[0; 12]);
    data.extend_from_slice(&image_data);

    let archive = Archive::parse(&data)?;
    let entry = archive.entry(0).expect("entry 0");
    let image = BitplaneImage::decode(&entry, layout(8, 1))?;

    assert_eq!(image.pixels(), &[8, 0, 0, 0, 0, 0, 0, 0]);

    Ok(())
}
