//! Reader-side helpers for integration tests: a minimal central-directory
//! parser and entry decoder, enough to verify archives produced by the
//! encoder without pulling in a ZIP crate.

#![allow(dead_code)]

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;

pub const LFH_SIZE: usize = 30;
pub const CDFH_FIXED_SIZE: usize = 46;
pub const EOCD_SIZE: usize = 22;

/// One entry as described by the central directory.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub file_name: String,
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub lfh_offset: u32,
}

/// End-of-central-directory fields relevant to the tests.
#[derive(Debug, Clone, Copy)]
pub struct ParsedEocd {
    pub entry_count: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

/// Parse the EOCD record, assumed to be the trailing 22 bytes (the encoder
/// never writes an archive comment).
pub fn parse_eocd(archive: &[u8]) -> ParsedEocd {
    assert!(archive.len() >= EOCD_SIZE, "archive shorter than an EOCD");
    let eocd = &archive[archive.len() - EOCD_SIZE..];
    assert_eq!(&eocd[0..4], b"PK\x05\x06", "missing EOCD signature");

    let mut cursor = Cursor::new(&eocd[4..]);
    let _disk_number = cursor.read_u16::<LittleEndian>().unwrap();
    let _disk_with_cd = cursor.read_u16::<LittleEndian>().unwrap();
    let disk_entries = cursor.read_u16::<LittleEndian>().unwrap();
    let total_entries = cursor.read_u16::<LittleEndian>().unwrap();
    assert_eq!(disk_entries, total_entries, "single-disk counts must match");
    let cd_size = cursor.read_u32::<LittleEndian>().unwrap();
    let cd_offset = cursor.read_u32::<LittleEndian>().unwrap();

    ParsedEocd {
        entry_count: total_entries,
        cd_size,
        cd_offset,
    }
}

/// Parse every central-directory file header, in directory order.
pub fn parse_central_directory(archive: &[u8]) -> Vec<ParsedEntry> {
    let eocd = parse_eocd(archive);
    let cd_start = eocd.cd_offset as usize;
    let cd_end = cd_start + eocd.cd_size as usize;
    let mut cursor = Cursor::new(&archive[cd_start..cd_end]);

    let mut entries = Vec::with_capacity(eocd.entry_count as usize);
    for _ in 0..eocd.entry_count {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig).unwrap();
        assert_eq!(&sig, b"PK\x01\x02", "missing CDFH signature");

        let _version_made_by = cursor.read_u16::<LittleEndian>().unwrap();
        let _version_needed = cursor.read_u16::<LittleEndian>().unwrap();
        let flags = cursor.read_u16::<LittleEndian>().unwrap();
        let method = cursor.read_u16::<LittleEndian>().unwrap();
        let _mod_time = cursor.read_u16::<LittleEndian>().unwrap();
        let _mod_date = cursor.read_u16::<LittleEndian>().unwrap();
        let crc32 = cursor.read_u32::<LittleEndian>().unwrap();
        let compressed_size = cursor.read_u32::<LittleEndian>().unwrap();
        let uncompressed_size = cursor.read_u32::<LittleEndian>().unwrap();
        let file_name_length = cursor.read_u16::<LittleEndian>().unwrap();
        let extra_field_length = cursor.read_u16::<LittleEndian>().unwrap();
        let comment_length = cursor.read_u16::<LittleEndian>().unwrap();
        let _disk_number_start = cursor.read_u16::<LittleEndian>().unwrap();
        let _internal_attrs = cursor.read_u16::<LittleEndian>().unwrap();
        let _external_attrs = cursor.read_u32::<LittleEndian>().unwrap();
        let lfh_offset = cursor.read_u32::<LittleEndian>().unwrap();

        let mut name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut name_bytes).unwrap();
        let file_name = String::from_utf8(name_bytes).unwrap();

        let skip = extra_field_length as u64 + comment_length as u64;
        cursor.set_position(cursor.position() + skip);

        entries.push(ParsedEntry {
            file_name,
            flags,
            method,
            crc32,
            compressed_size,
            uncompressed_size,
            lfh_offset,
        });
    }
    entries
}

/// Decode one entry's content, verifying its local header on the way.
pub fn read_entry_content(archive: &[u8], entry: &ParsedEntry) -> Vec<u8> {
    let offset = entry.lfh_offset as usize;
    assert_eq!(
        &archive[offset..offset + 4],
        b"PK\x03\x04",
        "local header offset of '{}' does not point at a header",
        entry.file_name
    );

    let mut cursor = Cursor::new(&archive[offset + 26..offset + 30]);
    let file_name_length = cursor.read_u16::<LittleEndian>().unwrap() as usize;
    let extra_field_length = cursor.read_u16::<LittleEndian>().unwrap() as usize;

    let name = &archive[offset + LFH_SIZE..offset + LFH_SIZE + file_name_length];
    assert_eq!(
        name,
        entry.file_name.as_bytes(),
        "local and central file names disagree"
    );

    let data_start = offset + LFH_SIZE + file_name_length + extra_field_length;
    let data = &archive[data_start..data_start + entry.compressed_size as usize];

    match entry.method {
        0 => data.to_vec(),
        8 => {
            let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
            DeflateDecoder::new(data).read_to_end(&mut out).unwrap();
            out
        }
        other => panic!("unexpected compression method {other}"),
    }
}

/// Decode the whole archive into (name, content) pairs in directory order.
pub fn read_archive(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    parse_central_directory(archive)
        .iter()
        .map(|entry| (entry.file_name.clone(), read_entry_content(archive, entry)))
        .collect()
}
