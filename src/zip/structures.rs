use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{DateTime, Datelike, Local, Timelike};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflated,
}

impl CompressionMethod {
    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflated => 8,
        }
    }
}

/// General-purpose flag bit 3: sizes and CRC are supplied by a trailing data
/// descriptor instead of the local header.
pub const GP_FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// Version needed to extract / version made by (2.0, deflate + descriptors).
pub const ZIP_VERSION: u16 = 20;

/// MS-DOS date/time pair as stored in ZIP headers.
///
/// 16-bit time is `hour<<11 | minute<<5 | second/2`; 16-bit date is
/// `(year-1980)<<9 | month<<5 | day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// Current wall-clock time in the system time zone.
    pub fn now() -> Self {
        Self::from_local(&Local::now())
    }

    pub fn from_local(dt: &DateTime<Local>) -> Self {
        let time = ((dt.hour() as u16) << 11)
            | ((dt.minute() as u16) << 5)
            | (dt.second() as u16 >> 1);
        let year = dt.year().max(1980) as u16;
        let date = ((year - 1980) << 9) | ((dt.month() as u16) << 5) | dt.day() as u16;
        Self { time, date }
    }
}

/// Finalized metadata for one archive entry.
///
/// Created once the entry's bytes have been fully emitted and immutable
/// thereafter; the central directory is rendered from these records in
/// emission order.
#[derive(Debug, Clone)]
pub struct ZipEntryRecord {
    pub file_name: String,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub compression_method: CompressionMethod,
    pub local_header_offset: u64,
}

impl ZipEntryRecord {
    /// Flags mirrored between the local header and the central directory:
    /// deflated entries were streamed and carry a data descriptor.
    pub fn flags(&self) -> u16 {
        match self.compression_method {
            CompressionMethod::Deflated => GP_FLAG_DATA_DESCRIPTOR,
            CompressionMethod::Stored => 0,
        }
    }
}

/// Local File Header (LFH) - 30 bytes plus the file name
#[derive(Debug, Clone)]
pub struct LocalFileHeader {
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub dos_time: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name: String,
}

impl LocalFileHeader {
    pub const SIGNATURE: &'static [u8] = b"PK\x03\x04";
    pub const FIXED_SIZE: usize = 30;

    /// Header for a streamed, deflated entry: sizes are unknown up front, so
    /// CRC and size fields are zero-filled and bit 3 announces the trailing
    /// data descriptor.
    pub fn streamed(file_name: impl Into<String>, dos_time: DosDateTime) -> Self {
        Self {
            flags: GP_FLAG_DATA_DESCRIPTOR,
            compression_method: CompressionMethod::Deflated,
            dos_time,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            file_name: file_name.into(),
        }
    }

    /// Header for a stored entry whose content is fully known up front: CRC
    /// and sizes are declared directly and no data descriptor follows.
    pub fn stored(
        file_name: impl Into<String>,
        size: u32,
        crc32: u32,
        dos_time: DosDateTime,
    ) -> Self {
        Self {
            flags: 0,
            compression_method: CompressionMethod::Stored,
            dos_time,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            file_name: file_name.into(),
        }
    }

    /// Total encoded length of this header.
    pub fn len(&self) -> usize {
        Self::FIXED_SIZE + self.file_name.len()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(ZIP_VERSION)?;
        w.write_u16::<LittleEndian>(self.flags)?;
        w.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        w.write_u16::<LittleEndian>(self.dos_time.time)?;
        w.write_u16::<LittleEndian>(self.dos_time.date)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(self.compressed_size)?;
        w.write_u32::<LittleEndian>(self.uncompressed_size)?;
        w.write_u16::<LittleEndian>(self.file_name.len() as u16)?;
        w.write_u16::<LittleEndian>(0)?; // Extra field length
        w.write_all(self.file_name.as_bytes())?;
        Ok(())
    }
}

/// Data descriptor - 16 bytes, trailing a streamed entry
#[derive(Debug, Clone, Copy)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl DataDescriptor {
    pub const SIGNATURE: &'static [u8] = b"PK\x07\x08";
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(self.compressed_size)?;
        w.write_u32::<LittleEndian>(self.uncompressed_size)?;
        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes plus the file name
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_FIXED_SIZE: usize = 46;

/// Write one central-directory header for a finished entry.
///
/// Method, flags, CRC and sizes mirror what was emitted in (or after) the
/// entry's local header; the offset points back at that local header.
pub fn write_central_directory_header<W: Write>(
    w: &mut W,
    entry: &ZipEntryRecord,
    dos_time: DosDateTime,
) -> io::Result<()> {
    w.write_all(CDFH_SIGNATURE)?;
    w.write_u16::<LittleEndian>(ZIP_VERSION)?; // Version made by
    w.write_u16::<LittleEndian>(ZIP_VERSION)?; // Version needed to extract
    w.write_u16::<LittleEndian>(entry.flags())?;
    w.write_u16::<LittleEndian>(entry.compression_method.as_u16())?;
    w.write_u16::<LittleEndian>(dos_time.time)?;
    w.write_u16::<LittleEndian>(dos_time.date)?;
    w.write_u32::<LittleEndian>(entry.crc32)?;
    w.write_u32::<LittleEndian>(entry.compressed_size as u32)?;
    w.write_u32::<LittleEndian>(entry.uncompressed_size as u32)?;
    w.write_u16::<LittleEndian>(entry.file_name.len() as u16)?;
    w.write_u16::<LittleEndian>(0)?; // Extra field length
    w.write_u16::<LittleEndian>(0)?; // File comment length
    w.write_u16::<LittleEndian>(0)?; // Disk number start
    w.write_u16::<LittleEndian>(0)?; // Internal file attributes
    w.write_u32::<LittleEndian>(0)?; // External file attributes
    w.write_u32::<LittleEndian>(entry.local_header_offset as u32)?;
    w.write_all(entry.file_name.as_bytes())?;
    Ok(())
}

/// End of Central Directory (EOCD) - 22 bytes, single-disk archive
#[derive(Debug, Clone, Copy)]
pub struct EndOfCentralDirectory {
    pub entry_count: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(0)?; // Disk number
        w.write_u16::<LittleEndian>(0)?; // Disk with central directory
        w.write_u16::<LittleEndian>(self.entry_count)?; // Entries on this disk
        w.write_u16::<LittleEndian>(self.entry_count)?; // Total entries
        w.write_u32::<LittleEndian>(self.cd_size)?;
        w.write_u32::<LittleEndian>(self.cd_offset)?;
        w.write_u16::<LittleEndian>(0)?; // Comment length
        Ok(())
    }
}
