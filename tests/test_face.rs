use koei_gfx::{compression::tfdce::OUTPUT_SIZE, Face, Palette, PlaneOrder};

fn face_record(selector: u8, table: &[u16], stream: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; 10];
    data[7] = selector;
    data[9] = table.len() as u8;

    for word in table {
        data.extend_from_slice(&word.to_le_bytes());
    }
    data.extend_from_slice(stream);

    data
}

#[test]
fn single_literal_before_stream_end() {
    let face = Face::decode(&face_record(0xc6, &[], &[0x71, 0x42]));

    assert_eq!(face.raw().len(), OUTPUT_SIZE);
    assert_eq!(face.raw()[0], 0x42);
    assert_eq!(face.decoded_len(), 1);
    assert!(face.is_truncated());
}

#[test]
fn run_length_fill() {
    let face = Face::decode(&face_record(0xc6, &[], &[0xa5, 0x99]));

    assert_eq!(face.decoded_len(), 7);
    assert_eq!(&face.raw()[..8], &[0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x00]);
}

#[test]
fn plane_order_comes_from_byte_seven() {
    let order = |selector| Face::decode(&face_record(selector, &[], &[])).plane_order();

    assert_eq!(order(0xc6).planes(), [0, 1, 2]);
    assert_eq!(order(0xe4).planes(), [2, 1, 0]);
    assert_eq!(order(0x00), PlaneOrder::DEFAULT);
    assert_eq!(order(0xff).planes(), [0, 2, 1]);
}

#[test]
fn table_words_are_skipped_by_the_stream() {
    // word 0: fill 3 x 0x5a, word 1: pair from nibbles of 0x12
    let face = Face::decode(&face_record(0xc6, &[0x5aa1, 0x1280], &[0x01, 0x00]));

    assert_eq!(
        &face.raw()[..face.decoded_len()],
        &[0x22, 0x11, 0x5a, 0x5a, 0x5a]
    );
}

#[test]
fn output_length_never_depends_on_input() {
    // xorshift, so the streams are arbitrary but reproducible
    let mut state = 0x2545_f491u32;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state as u8
    };

    for len in [0, 5, 10, 64, 300, 4000] {
        let data = (0..len).map(|_| next()).collect::<Vec<_>>();
        let face = Face::decode(&data);

        assert_eq!(face.raw().len(), OUTPUT_SIZE);
        assert!(face.decoded_len() <= OUTPUT_SIZE);
        assert_eq!(Face::decode(&data), face);

        let image = face.to_image(&Palette::DEFAULT);
        assert_eq!(image.dimensions(), (64, 80));
    }
}

#[test]
fn full_face_fills_every_section() {
    // 20 fills of 97 bytes overshoot the 1920 byte target
    let face = Face::decode(&face_record(0xe4, &[], &[0xff, 0x0f].repeat(20)));

    assert!(!face.is_truncated());
    assert!(face.raw().iter().all(|&b| b == 0x0f));

    // every byte is 0x0f: the left four pixels of a column are index 0, the right four index 7
    let image = face.to_image(&Palette::DEFAULT);
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(4, 0).0, [255, 255, 255, 255]);
}

fn fill_section(value: u8) -> Vec<u8> {
    let mut stream = [0xff, value].repeat(6);
    stream.extend_from_slice(&[0xd8, value]);
    stream
}

#[test]
fn sections_follow_the_selected_plane_order() {
    // order [2, 0, 1]: section 0 is bitplane 2, section 1 bitplane 0, section 2 bitplane 1
    let mut stream = fill_section(0xff);
    stream.extend(fill_section(0x00));
    // section 2 copies plane selector 0, which is bitplane 2
    stream.extend_from_slice(&[0x30, 0xff, 0x30, 0xff, 0x30, 0x7c]);

    let face = Face::decode(&face_record(0xd8, &[], &stream));
    assert!(!face.is_truncated());

    let [plane0, plane1, plane2] = face.bitplanes();
    assert!(plane0.iter().all(|&b| b == 0x00));
    assert!(plane1.iter().all(|&b| b == 0xff));
    assert!(plane2.iter().all(|&b| b == 0xff));

    assert_eq!(face.color_index(0, 0).as_u8(), 0b110);
    let image = face.to_image(&Palette::DEFAULT);
    assert_eq!(image.get_pixel(63, 79).0, [207, 117, 170, 255]);
}
