//! Streaming ZIP encoder.
//!
//! Consumes an ordered sequence of per-file outcomes and produces the archive
//! byte stream in a single pass: local headers, deflated payloads, data
//! descriptors, an optional failure-report entry, and the trailing central
//! directory. Files are processed strictly sequentially, so at most one entry
//! is open at any time and every local-header offset is known the moment the
//! header is written.

use std::io;

use bytes::Bytes;
use chrono::Utc;
use flate2::Compression;
use futures::{Stream, StreamExt, pin_mut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;

use crate::error::{ArchiveError, StorageError};
use crate::storage::ByteStream;

use super::compressor::EntryCompressor;
use super::report::{FailedFile, REPORT_FILE_NAME, render_report};
use super::structures::{
    CompressionMethod, DataDescriptor, DosDateTime, EndOfCentralDirectory, LocalFileHeader,
    ZipEntryRecord, write_central_directory_header,
};

/// Buffer size of the duplex pipe behind [`zip_stream`]. Bounds how far the
/// encoder can run ahead of the consumer.
const PIPE_BUFFER_SIZE: usize = 64 * 1024;

/// Per-file result of resolving and fetching content.
///
/// Matched exhaustively everywhere it is consumed; a `Failure` carries a
/// failure already known before any content byte was produced, while the
/// stream inside a `Success` may still fail at any point during draining.
pub enum FileOutcome {
    Success {
        /// File name as it should appear in the archive.
        name: String,
        /// Lazy content chunks; drained by the encoder, not the producer.
        content: ByteStream,
    },
    Failure(FailedFile),
}

/// What an encoding run produced, for logging and CLI summaries.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveSummary {
    /// Central-directory entry count (includes the failure report, if any).
    pub entry_count: usize,
    /// Number of files that ended up in the failure report.
    pub failed_count: usize,
    /// Total archive length in bytes.
    pub bytes_written: u64,
}

/// Output sink wrapper tracking the running byte offset.
///
/// Every byte the encoder emits goes through here, so `written` is by
/// construction the exact offset of the next byte — entry offsets are read
/// off this counter at the moment each local header goes out.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: AsyncWrite + Unpin> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf).await?;
        self.written += buf.len() as u64;
        Ok(())
    }
}

/// Single-pass ZIP encoder writing to an async sink.
///
/// Owns the per-request archive state: the ordered entry records, the
/// accumulated failures, and the running byte offset. One encoder instance
/// serves exactly one archive; nothing is shared across requests.
pub struct ZipEncoder<W> {
    out: CountingWriter<W>,
    level: Compression,
    entries: Vec<ZipEntryRecord>,
    failures: Vec<FailedFile>,
}

impl<W: AsyncWrite + Unpin> ZipEncoder<W> {
    pub fn new(out: W) -> Self {
        Self::with_level(out, Compression::default())
    }

    pub fn with_level(out: W, level: Compression) -> Self {
        Self {
            out: CountingWriter::new(out),
            level,
            entries: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Encode one outcome sequence into a complete archive.
    ///
    /// Per-file errors are absorbed into the failure report; only sink and
    /// compressor errors (fatal, stream no longer trustworthy) are returned.
    pub async fn encode<S>(&mut self, outcomes: S) -> Result<ArchiveSummary, ArchiveError>
    where
        S: Stream<Item = FileOutcome>,
    {
        pin_mut!(outcomes);
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                FileOutcome::Failure(failed) => {
                    tracing::warn!(
                        file = %failed.file_name,
                        source = %failed.source_kind,
                        reason = %failed.reason,
                        "recording failed file"
                    );
                    self.failures.push(failed);
                }
                FileOutcome::Success { name, content } => {
                    self.encode_entry(name, content).await?;
                }
            }
        }

        if !self.failures.is_empty() {
            self.write_failure_report().await?;
        }
        self.write_central_directory().await?;
        self.out.inner.shutdown().await?;

        Ok(ArchiveSummary {
            entry_count: self.entries.len(),
            failed_count: self.failures.len(),
            bytes_written: self.out.written,
        })
    }

    /// Unwrap the output sink. Only meaningful after [`encode`](Self::encode)
    /// has completed.
    pub fn into_inner(self) -> W {
        self.out.inner
    }

    /// Drain one successful file's content into a deflated entry.
    ///
    /// The local header is deferred until the first non-empty chunk proves
    /// the stream is live, so a stream that fails (or stays empty) before
    /// producing data leaves no trace in the archive. A failure after the
    /// header went out cannot be retracted: the partial entry stays, the file
    /// is recorded as failed, and encoding moves on.
    async fn encode_entry(&mut self, name: String, content: ByteStream) -> Result<(), ArchiveError> {
        let mut compressor = EntryCompressor::new(self.level);
        let mut header_offset: Option<u64> = None;
        pin_mut!(content);

        while let Some(chunk) = content.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.record_stream_failure(&name, &e, header_offset.is_some());
                    return Ok(());
                }
            };
            if chunk.is_empty() {
                continue;
            }

            if header_offset.is_none() {
                let offset = self.out.written;
                let header = LocalFileHeader::streamed(name.clone(), DosDateTime::now());
                let mut buf = Vec::with_capacity(header.len());
                header.write_to(&mut buf)?;
                self.out.write_all(&buf).await?;
                header_offset = Some(offset);
            }

            let compressed = compressor.feed(&chunk)?;
            if !compressed.is_empty() {
                self.out.write_all(&compressed).await?;
            }
        }

        let Some(offset) = header_offset else {
            // Zero uncompressed bytes: no header was written, so the file
            // simply does not appear in the archive. Not a failure.
            tracing::debug!(file = %name, "skipping zero-byte file");
            return Ok(());
        };

        let (tail, digest) = compressor.finish()?;
        if !tail.is_empty() {
            self.out.write_all(&tail).await?;
        }

        let descriptor = DataDescriptor {
            crc32: digest.crc32,
            compressed_size: digest.compressed_size as u32,
            uncompressed_size: digest.uncompressed_size as u32,
        };
        let mut buf = Vec::with_capacity(DataDescriptor::SIZE);
        descriptor.write_to(&mut buf)?;
        self.out.write_all(&buf).await?;

        tracing::info!(
            file = %name,
            uncompressed = digest.uncompressed_size,
            compressed = digest.compressed_size,
            "finished archive entry"
        );
        self.entries.push(ZipEntryRecord {
            file_name: name,
            crc32: digest.crc32,
            compressed_size: digest.compressed_size,
            uncompressed_size: digest.uncompressed_size,
            compression_method: CompressionMethod::Deflated,
            local_header_offset: offset,
        });
        Ok(())
    }

    fn record_stream_failure(&mut self, name: &str, error: &StorageError, header_written: bool) {
        if header_written {
            tracing::error!(
                file = %name,
                error = %error,
                "content stream failed after entry bytes were emitted; partial entry remains"
            );
        } else {
            tracing::error!(file = %name, error = %error, "content stream failed before first chunk");
        }
        self.failures.push(FailedFile::new(
            name,
            error.kind().to_string(),
            error.key(),
            error.to_string(),
        ));
    }

    /// Append the stored failure-report pseudo-entry.
    ///
    /// The report is small and fully known up front, so its CRC and sizes go
    /// directly into the local header and no data descriptor is needed.
    async fn write_failure_report(&mut self) -> Result<(), ArchiveError> {
        let content = render_report(&self.failures, Utc::now());
        let bytes = content.as_bytes();
        let crc32 = crc32fast::hash(bytes);
        let offset = self.out.written;

        tracing::warn!(
            failed = self.failures.len(),
            "adding failure report to the archive"
        );

        let header =
            LocalFileHeader::stored(REPORT_FILE_NAME, bytes.len() as u32, crc32, DosDateTime::now());
        let mut buf = Vec::with_capacity(header.len() + bytes.len());
        header.write_to(&mut buf)?;
        buf.extend_from_slice(bytes);
        self.out.write_all(&buf).await?;

        self.entries.push(ZipEntryRecord {
            file_name: REPORT_FILE_NAME.to_string(),
            crc32,
            compressed_size: bytes.len() as u64,
            uncompressed_size: bytes.len() as u64,
            compression_method: CompressionMethod::Stored,
            local_header_offset: offset,
        });
        Ok(())
    }

    /// Emit the central directory and end-of-central-directory records.
    async fn write_central_directory(&mut self) -> Result<(), ArchiveError> {
        let cd_offset = self.out.written;

        // Offsets were recorded as headers went out; anything non-monotonic
        // means the archive state diverged from the byte stream.
        let mut previous: Option<u64> = None;
        for entry in &self.entries {
            let offset = entry.local_header_offset;
            if offset >= cd_offset || previous.is_some_and(|p| offset <= p) {
                return Err(ArchiveError::InvariantViolation(format!(
                    "local header offset {offset} of '{}' is out of order",
                    entry.file_name
                )));
            }
            previous = Some(offset);
        }

        let dos_time = DosDateTime::now();
        let mut buf = Vec::new();
        for entry in &self.entries {
            write_central_directory_header(&mut buf, entry, dos_time)?;
        }
        let cd_size = buf.len() as u32;

        let eocd = EndOfCentralDirectory {
            entry_count: self.entries.len() as u16,
            cd_size,
            cd_offset: cd_offset as u32,
        };
        eocd.write_to(&mut buf)?;
        self.out.write_all(&buf).await?;
        Ok(())
    }
}

/// Encode an outcome sequence into a pull-driven byte-chunk stream.
///
/// The encoder runs on a background task writing into one end of a bounded
/// duplex pipe; the returned stream reads the other end. Backpressure flows
/// naturally: the encoder suspends once the pipe is full, and it only drains
/// the active content stream as the consumer pulls. Dropping the returned
/// stream closes the pipe, which errors the next sink write and tears the
/// task down, releasing the in-flight fetch and compressor.
///
/// The stream is finite and consumed exactly once. A fatal encoding error
/// truncates it after whatever was already emitted.
pub fn zip_stream<S>(outcomes: S) -> impl Stream<Item = io::Result<Bytes>>
where
    S: Stream<Item = FileOutcome> + Send + 'static,
{
    zip_stream_with_level(outcomes, Compression::default())
}

/// [`zip_stream`] with an explicit deflate level.
pub fn zip_stream_with_level<S>(
    outcomes: S,
    level: Compression,
) -> impl Stream<Item = io::Result<Bytes>>
where
    S: Stream<Item = FileOutcome> + Send + 'static,
{
    let (writer, reader) = tokio::io::duplex(PIPE_BUFFER_SIZE);

    tokio::spawn(async move {
        let mut encoder = ZipEncoder::with_level(writer, level);
        match encoder.encode(outcomes).await {
            Ok(summary) => tracing::info!(
                entries = summary.entry_count,
                failed = summary.failed_count,
                bytes = summary.bytes_written,
                "finished writing archive stream"
            ),
            Err(e) => tracing::error!(
                error = %e,
                "archive encoding aborted; emitted stream is truncated"
            ),
        }
    });

    ReaderStream::new(reader)
}
