use koei_gfx::{PackedFile, UnpackError};

/// Lay out a packed file: a table of `(address, size)` pairs, then the entries back to back.
fn build_packed(entries: &[&[u8]]) -> Vec<u8> {
    let mut data = Vec::new();

    let mut address = 0u32;
    for entry in entries {
        data.extend_from_slice(&address.to_le_bytes());
        data.extend_from_slice(&(entry.len() as u16).to_le_bytes());
        address += entry.len() as u32;
    }

    for entry in entries {
        data.extend_from_slice(entry);
    }

    data
}

#[test]
fn entries_are_sliced_after_the_table() -> anyhow::Result<()> {
    let data = build_packed(&[b"first", b"second entry", b"x"]);
    let packed = PackedFile::parse(&data)?;

    assert_eq!(packed.len(), 3);
    assert_eq!(packed.header_size(), 18);
    assert_eq!(
        packed.iter().collect::<Vec<_>>(),
        vec![&b"first"[..], &b"second entry"[..], &b"x"[..]]
    );

    Ok(())
}

#[test]
fn entries_may_be_stored_out_of_order() -> anyhow::Result<()> {
    let mut data = Vec::new();
    data.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x02, 0x00]);
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x02, 0x00]);
    data.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd]);

    let packed = PackedFile::parse(&data)?;
    assert_eq!(packed.entry(0), Some(&[0xcc, 0xdd][..]));
    assert_eq!(packed.entry(1), Some(&[0xaa, 0xbb][..]));

    Ok(())
}

#[test]
fn entry_past_end_of_file_is_rejected() {
    let mut data = build_packed(&[&[1, 2, 3], &[4, 5]]);
    // point the second entry one byte further
    data[6] = 4;

    assert_eq!(
        PackedFile::parse(&data).unwrap_err(),
        UnpackError::EntryOutOfBounds {
            index: 1,
            address: 4,
            size: 2,
            len: data.len(),
        }
    );
}
