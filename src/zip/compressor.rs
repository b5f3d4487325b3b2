use flate2::{Compress, CompressError, Compression, FlushCompress, Status};

/// Output is produced in blocks of roughly this size.
const OUT_BLOCK_SIZE: usize = 8 * 1024;

/// Final CRC and byte counts for a completed entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryDigest {
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

/// Streaming raw-deflate compressor for a single archive entry.
///
/// Accepts arbitrary-size input chunks and flushes the deflate stream after
/// each one, so every [`feed`](Self::feed) returns all compressed bytes the
/// chunk produced. The flush-per-chunk policy costs a little compression
/// ratio but keeps buffering bounded and time-to-first-byte low. A running
/// CRC-32 is maintained over the raw input, independent of compression.
///
/// [`finish`](Self::finish) consumes the compressor, so it cannot be called
/// twice; on abandoned entries (mid-stream failure, zero-byte skip) dropping
/// the compressor releases its state.
pub struct EntryCompressor {
    compress: Compress,
    crc: crc32fast::Hasher,
    uncompressed_size: u64,
    compressed_size: u64,
}

impl EntryCompressor {
    /// Create a compressor emitting a raw deflate stream (no zlib wrapper).
    pub fn new(level: Compression) -> Self {
        Self {
            compress: Compress::new(level, false),
            crc: crc32fast::Hasher::new(),
            uncompressed_size: 0,
            compressed_size: 0,
        }
    }

    /// Compress one input chunk, returning whatever output it produced.
    ///
    /// The deflate stream is sync-flushed, so the returned bytes fully cover
    /// the chunk; the result may still be empty for an empty chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CompressError> {
        if chunk.is_empty() {
            return Ok(Vec::new());
        }

        self.crc.update(chunk);
        self.uncompressed_size += chunk.len() as u64;

        let mut out = Vec::with_capacity(OUT_BLOCK_SIZE.min(chunk.len() + 64));
        let mut consumed = 0usize;
        loop {
            if out.len() == out.capacity() {
                out.reserve(OUT_BLOCK_SIZE);
            }
            let before_in = self.compress.total_in();
            self.compress
                .compress_vec(&chunk[consumed..], &mut out, FlushCompress::Sync)?;
            consumed += (self.compress.total_in() - before_in) as usize;

            // A sync flush is complete once all input is consumed and the
            // output buffer was not filled to its brim.
            if consumed == chunk.len() && out.len() < out.capacity() {
                break;
            }
        }

        self.compressed_size += out.len() as u64;
        Ok(out)
    }

    /// Bytes fed so far, before compression.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Finalize the deflate stream, returning the trailing compressed bytes
    /// and the entry digest. Consumes the compressor.
    pub fn finish(mut self) -> Result<(Vec<u8>, EntryDigest), CompressError> {
        let mut out = Vec::with_capacity(OUT_BLOCK_SIZE);
        loop {
            if out.len() == out.capacity() {
                out.reserve(OUT_BLOCK_SIZE);
            }
            match self
                .compress
                .compress_vec(&[], &mut out, FlushCompress::Finish)?
            {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => continue,
            }
        }

        self.compressed_size += out.len() as u64;
        let digest = EntryDigest {
            crc32: self.crc.finalize(),
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
        };
        Ok((out, digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::DeflateDecoder;
    use std::io::Read;

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        DeflateDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_single_chunk_roundtrip() {
        let mut compressor = EntryCompressor::new(Compression::default());
        let mut compressed = compressor.feed(b"Hello World").unwrap();
        let (tail, digest) = compressor.finish().unwrap();
        compressed.extend_from_slice(&tail);

        assert_eq!(inflate(&compressed), b"Hello World");
        assert_eq!(digest.uncompressed_size, 11);
        assert_eq!(digest.compressed_size, compressed.len() as u64);
        assert_eq!(digest.crc32, crc32fast::hash(b"Hello World"));
    }

    #[test]
    fn test_multi_chunk_roundtrip() {
        let chunks: Vec<Vec<u8>> = (0u8..50).map(|i| vec![i; 4096]).collect();
        let original: Vec<u8> = chunks.concat();

        let mut compressor = EntryCompressor::new(Compression::default());
        let mut compressed = Vec::new();
        for chunk in &chunks {
            compressed.extend_from_slice(&compressor.feed(chunk).unwrap());
        }
        let (tail, digest) = compressor.finish().unwrap();
        compressed.extend_from_slice(&tail);

        assert_eq!(inflate(&compressed), original);
        assert_eq!(digest.uncompressed_size, original.len() as u64);
        assert_eq!(digest.crc32, crc32fast::hash(&original));
    }

    #[test]
    fn test_incompressible_input_grows_output() {
        // Pseudo-random bytes deflate to slightly more than their input size;
        // the output loop must keep reserving space until the flush completes.
        let mut data = vec![0u8; 256 * 1024];
        let mut state = 0x2545F4914F6CDD1Du64;
        for byte in &mut data {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *byte = state as u8;
        }

        let mut compressor = EntryCompressor::new(Compression::default());
        let mut compressed = compressor.feed(&data).unwrap();
        let (tail, _) = compressor.finish().unwrap();
        compressed.extend_from_slice(&tail);

        assert_eq!(inflate(&compressed), data);
    }

    #[test]
    fn test_empty_chunk_produces_no_output() {
        let mut compressor = EntryCompressor::new(Compression::default());
        assert!(compressor.feed(b"").unwrap().is_empty());
        assert_eq!(compressor.uncompressed_size(), 0);
    }

    #[test]
    fn test_finish_without_input_is_valid_empty_stream() {
        let compressor = EntryCompressor::new(Compression::default());
        let (tail, digest) = compressor.finish().unwrap();

        assert_eq!(inflate(&tail), b"");
        assert_eq!(digest.uncompressed_size, 0);
        assert_eq!(digest.crc32, 0);
    }
}
