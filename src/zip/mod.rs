//! Streaming ZIP archive encoding.
//!
//! This module assembles a valid ZIP byte stream on the fly from a sequence
//! of independently-sourced file contents, without knowing the total archive
//! size in advance and without buffering whole files in memory.
//!
//! ## Architecture
//!
//! The module is organized into four components:
//!
//! - [`structures`]: Data structures and byte builders for ZIP format
//!   elements (local headers, data descriptors, central directory, EOCD)
//! - [`compressor`]: Per-entry streaming raw-deflate compression with
//!   running CRC-32 accumulation
//! - [`report`]: The failure-report pseudo-entry listing files that could
//!   not be included
//! - [`encoder`]: The single-pass encoder orchestrating the above
//!
//! ## ZIP Format Overview
//!
//! An archive produced here consists of:
//! 1. Per file: a local file header, the deflated data, and a data
//!    descriptor carrying the CRC and sizes (unknown when the header was
//!    written)
//! 2. Optionally a stored `FAILED_FILES_REPORT.txt` entry
//! 3. The Central Directory with metadata for all entries
//! 4. The End of Central Directory (EOCD) record
//!
//! Writing headers before sizes are known requires general-purpose flag
//! bit 3 and trailing data descriptors; that is what makes single-pass
//! streaming possible.
//!
//! ## Limitations
//!
//! - No ZIP64 extensions: archives or entries beyond 32-bit limits are not
//!   guarded against
//! - No encryption support
//! - No seeking or archive modification after creation

pub mod compressor;
pub mod encoder;
pub mod report;
pub mod structures;

pub use compressor::{EntryCompressor, EntryDigest};
pub use encoder::{ArchiveSummary, FileOutcome, ZipEncoder, zip_stream, zip_stream_with_level};
pub use report::{FailedFile, REPORT_FILE_NAME, render_report};
pub use structures::{CompressionMethod, DosDateTime, ZipEntryRecord};
