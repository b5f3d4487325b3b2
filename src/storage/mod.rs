//! Storage backends supplying file content as lazy byte-chunk streams.
//!
//! Each backend implements [`FileStorage`]: given a storage key it returns a
//! [`ByteStream`] that yields content chunks on demand and may fail at any
//! point during iteration. Backends are looked up by [`StorageKind`] through
//! an explicit [`StorageRegistry`] built once at startup and shared by
//! reference — no runtime container involved.

mod http;
mod local;

pub use http::RemoteHttpStorage;
pub use local::LocalDiskStorage;

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::StorageError;

/// Lazy sequence of content chunks. May fail mid-iteration; the consumer
/// (the archive encoder) is responsible for draining it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// The storage backends a file's content can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Object storage (no adapter ships with this crate).
    S3,
    /// A remote HTTP server; the storage key is a URL.
    RemoteHttp,
    /// The local filesystem; the storage key is a path.
    LocalDisk,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::S3 => "S3",
            StorageKind::RemoteHttp => "REMOTE_HTTP",
            StorageKind::LocalDisk => "LOCAL_DISK",
        };
        f.write_str(name)
    }
}

/// Trait for fetching file content from a storage backend.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// The backend kind this adapter serves.
    fn kind(&self) -> StorageKind;

    /// Open a content stream for the given key.
    ///
    /// A returned `Ok` only means the fetch started; the stream itself may
    /// still fail after producing data.
    async fn fetch(&self, key: &str) -> Result<ByteStream, StorageError>;
}

/// Lookup table from [`StorageKind`] to the adapter serving it.
///
/// Built once at startup and passed by reference into the aggregator. A kind
/// with no registered adapter is a per-file failure at archive time, not a
/// construction error: requests may legitimately reference backends a given
/// deployment does not serve.
#[derive(Default)]
pub struct StorageRegistry {
    adapters: HashMap<StorageKind, Arc<dyn FileStorage>>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own kind, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn FileStorage>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Look up the adapter for a kind.
    pub fn get(&self, kind: StorageKind) -> Option<&Arc<dyn FileStorage>> {
        self.adapters.get(&kind)
    }

    /// The kinds currently served, for startup logging.
    pub fn kinds(&self) -> Vec<StorageKind> {
        self.adapters.keys().copied().collect()
    }
}
