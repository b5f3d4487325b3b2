//! # zipstream
//!
//! A streaming ZIP archiver that assembles archives on the fly from multiple
//! storage backends.
//!
//! This library builds a valid ZIP byte stream from a sequence of
//! independently-sourced file contents without knowing the total archive size
//! in advance and without buffering whole files in memory. Files that cannot
//! be fetched do not abort the archive: they are collected into a
//! `FAILED_FILES_REPORT.txt` entry appended at the end, so the consumer
//! always receives a structurally valid archive describing exactly what it
//! contains.
//!
//! ## Features
//!
//! - Single-pass streamed encoding: local headers, deflated payloads, data
//!   descriptors, central directory
//! - Content from pluggable storage backends (local disk, remote HTTP)
//!   resolved per file through a metadata lookup
//! - Per-file failure absorption with an in-archive failure report
//! - Bounded memory: one file in flight at a time, chunk-level buffering only
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use zipstream::{
//!     ArchiveService, FileMetadata, InMemoryMetadataStore, LocalDiskStorage,
//!     StorageKind, StorageRegistry,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut metadata = InMemoryMetadataStore::new();
//!     metadata.insert(FileMetadata {
//!         id: 1,
//!         name: "hello.txt".to_string(),
//!         content_type: "text/plain".to_string(),
//!         storage_key: "hello.txt".to_string(),
//!         storage_kind: StorageKind::LocalDisk,
//!     });
//!
//!     let mut registry = StorageRegistry::new();
//!     registry.register(Arc::new(LocalDiskStorage::new(".")));
//!
//!     let service = ArchiveService::new(Arc::new(metadata), Arc::new(registry));
//!     let mut archive = service.create_zip_stream(vec![1]);
//!     while let Some(chunk) = archive.next().await {
//!         let chunk = chunk?;
//!         // forward chunk to a response body, file, socket, ...
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod metadata;
pub mod storage;
pub mod zip;

pub use archive::{ArchiveService, InputAggregator};
pub use cli::Cli;
pub use error::{ArchiveError, MetadataError, StorageError};
pub use metadata::{FileId, FileMetadata, InMemoryMetadataStore, MetadataStore};
pub use storage::{
    ByteStream, FileStorage, LocalDiskStorage, RemoteHttpStorage, StorageKind, StorageRegistry,
};
pub use zip::{
    ArchiveSummary, FailedFile, FileOutcome, REPORT_FILE_NAME, ZipEncoder, ZipEntryRecord,
    zip_stream, zip_stream_with_level,
};
