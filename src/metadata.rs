//! File metadata records and the metadata collaborator boundary.
//!
//! The archive pipeline never talks to storage directly from an id: it first
//! resolves the id into a [`FileMetadata`] record naming the file, the storage
//! backend that holds its content, and the key within that backend. The
//! [`MetadataStore`] trait is that resolution boundary; persistence behind it
//! (a relational store in a full deployment) is out of scope here, so the
//! crate ships an in-memory implementation for the CLI and tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::MetadataError;
use crate::storage::StorageKind;

/// Database-style identifier for a file.
pub type FileId = u64;

/// Resolved metadata for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Identifier the metadata was looked up by.
    pub id: FileId,
    /// File name as it should appear inside the archive.
    pub name: String,
    /// MIME type of the content.
    pub content_type: String,
    /// Key identifying the content within its storage backend.
    pub storage_key: String,
    /// Which storage backend holds the content.
    pub storage_kind: StorageKind,
}

/// Lookup boundary for file metadata.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Resolve a file id to its metadata record.
    async fn lookup(&self, id: FileId) -> Result<FileMetadata, MetadataError>;
}

/// In-memory metadata store backed by a map.
///
/// Used by the CLI (which synthesizes metadata from its arguments) and by
/// tests. Records are keyed by their id.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: HashMap<FileId, FileMetadata>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any existing record with the same id.
    pub fn insert(&mut self, metadata: FileMetadata) {
        self.records.insert(metadata.id, metadata);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn lookup(&self, id: FileId) -> Result<FileMetadata, MetadataError> {
        self.records
            .get(&id)
            .cloned()
            .ok_or(MetadataError::NotFound(id))
    }
}
