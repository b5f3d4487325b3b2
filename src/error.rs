//! Error types for metadata lookup, storage fetches, and archive encoding.
//!
//! The taxonomy splits along recoverability: [`MetadataError`] and
//! [`StorageError`] are per-file problems that the encoder absorbs into the
//! failure report, while [`ArchiveError`] is fatal — once the output byte
//! stream can no longer be trusted, the archive is aborted mid-stream.

use thiserror::Error;

use crate::metadata::FileId;
use crate::storage::StorageKind;

/// Errors from the metadata collaborator. Per-file and recoverable.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// No metadata record exists for the requested id.
    #[error("no metadata found for file id {0}")]
    NotFound(FileId),

    /// The lookup itself failed (backing store unreachable, bad row, ...).
    #[error("metadata lookup failed for file id {id}: {reason}")]
    Lookup {
        /// The id whose lookup failed.
        id: FileId,
        /// Description of the underlying failure.
        reason: String,
    },
}

/// Errors from a storage backend. Per-file and recoverable: the encoder turns
/// every one of these into a failure-report line, never into a broken archive.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage key does not resolve to an object.
    #[error("object '{key}' not found in {kind} storage")]
    NotFound {
        /// Backend that was asked.
        kind: StorageKind,
        /// The key that did not resolve.
        key: String,
    },

    /// The backend could not be reached (DNS, connect, timeout, 5xx gateway).
    #[error("connectivity error fetching '{key}' from {kind}: {reason}")]
    Connectivity {
        /// Backend that was asked.
        kind: StorageKind,
        /// The key being fetched.
        key: String,
        /// Description of the transport-level failure.
        reason: String,
    },

    /// Any other backend failure.
    #[error("storage error fetching '{key}' from {kind}: {reason}")]
    Generic {
        /// Backend that was asked.
        kind: StorageKind,
        /// The key being fetched.
        key: String,
        /// Description of the failure.
        reason: String,
    },
}

impl StorageError {
    /// Creates a not-found error.
    pub fn not_found(kind: StorageKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Creates a connectivity error.
    pub fn connectivity(
        kind: StorageKind,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Connectivity {
            kind,
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a generic storage error.
    pub fn generic(kind: StorageKind, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Generic {
            kind,
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// The backend kind the error came from.
    pub fn kind(&self) -> StorageKind {
        match self {
            Self::NotFound { kind, .. }
            | Self::Connectivity { kind, .. }
            | Self::Generic { kind, .. } => *kind,
        }
    }

    /// The storage key that was being fetched.
    pub fn key(&self) -> &str {
        match self {
            Self::NotFound { key, .. }
            | Self::Connectivity { key, .. }
            | Self::Generic { key, .. } => key,
        }
    }
}

// No `From<reqwest::Error>` here: every variant needs the backend kind and key
// for the failure report, which the source error cannot supply. Adapters map
// errors through the constructors above instead.

/// Fatal encoding errors. Any of these aborts the byte stream: whatever was
/// already emitted cannot be retracted, so the consumer receives a truncated
/// archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Writing to the output sink failed.
    #[error("I/O error writing archive stream: {0}")]
    Io(#[from] std::io::Error),

    /// The deflate compressor reported an internal error.
    #[error("deflate compression failed: {0}")]
    Compression(#[from] flate2::CompressError),

    /// An offset or state invariant was violated; the emitted bytes can no
    /// longer be trusted to form a valid archive.
    #[error("archive invariant violated: {0}")]
    InvariantViolation(String),
}
