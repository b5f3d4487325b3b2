//! Turning file ids into archive outcomes.
//!
//! The [`InputAggregator`] resolves each requested id through the metadata
//! collaborator, picks the storage adapter for the resolved backend kind, and
//! opens the content stream — normalizing every step into the [`FileOutcome`]
//! sequence the encoder consumes. [`ArchiveService`] is the one-call facade
//! over aggregation and encoding.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use flate2::Compression;
use futures::{Stream, StreamExt, stream};

use crate::metadata::{FileId, MetadataStore};
use crate::storage::StorageRegistry;
use crate::zip::{FailedFile, FileOutcome, zip_stream_with_level};

/// Placeholder name for files whose metadata lookup failed before a real
/// file name was known.
const UNRESOLVED_NAME: &str = "<unresolved>";

/// Resolves requested file ids into an ordered outcome sequence.
///
/// Ids are processed strictly sequentially and the output preserves request
/// order, duplicates included: exactly one outcome per requested id. The
/// aggregator opens content streams but never drains them — that is the
/// encoder's job.
pub struct InputAggregator {
    metadata: Arc<dyn MetadataStore>,
    storage: Arc<StorageRegistry>,
}

impl InputAggregator {
    pub fn new(metadata: Arc<dyn MetadataStore>, storage: Arc<StorageRegistry>) -> Self {
        Self { metadata, storage }
    }

    /// Lazily resolve `ids` into outcomes, one at a time as the stream is
    /// polled.
    pub fn outcomes(&self, ids: Vec<FileId>) -> impl Stream<Item = FileOutcome> + Send + 'static {
        let metadata = Arc::clone(&self.metadata);
        let storage = Arc::clone(&self.storage);

        stream::iter(ids).then(move |id| {
            let metadata = Arc::clone(&metadata);
            let storage = Arc::clone(&storage);
            async move { resolve_one(&*metadata, &storage, id).await }
        })
    }
}

/// Resolve one id: metadata, then adapter, then content stream. Every
/// failure short-circuits into a `Failure` outcome; storage is never
/// contacted for an id whose metadata lookup failed.
async fn resolve_one(
    metadata: &dyn MetadataStore,
    registry: &StorageRegistry,
    id: FileId,
) -> FileOutcome {
    let meta = match metadata.lookup(id).await {
        Ok(meta) => meta,
        Err(e) => {
            tracing::warn!(id, error = %e, "metadata lookup failed");
            return FileOutcome::Failure(FailedFile::new(
                UNRESOLVED_NAME,
                "metadata",
                id.to_string(),
                e.to_string(),
            ));
        }
    };

    let Some(adapter) = registry.get(meta.storage_kind) else {
        tracing::error!(
            file = %meta.name,
            kind = %meta.storage_kind,
            "no storage adapter configured for backend kind"
        );
        return FileOutcome::Failure(FailedFile::new(
            meta.name,
            meta.storage_kind.to_string(),
            meta.storage_key,
            format!("no storage adapter configured for kind {}", meta.storage_kind),
        ));
    };

    tracing::info!(file = %meta.name, id, kind = %meta.storage_kind, "processing file");

    match adapter.fetch(&meta.storage_key).await {
        Ok(content) => FileOutcome::Success {
            name: meta.name,
            content,
        },
        Err(e) => FileOutcome::Failure(FailedFile::new(
            meta.name,
            meta.storage_kind.to_string(),
            meta.storage_key,
            e.to_string(),
        )),
    }
}

/// Facade from file ids to the archive byte stream.
pub struct ArchiveService {
    aggregator: InputAggregator,
    level: Compression,
}

impl ArchiveService {
    pub fn new(metadata: Arc<dyn MetadataStore>, storage: Arc<StorageRegistry>) -> Self {
        Self::with_level(metadata, storage, Compression::default())
    }

    pub fn with_level(
        metadata: Arc<dyn MetadataStore>,
        storage: Arc<StorageRegistry>,
        level: Compression,
    ) -> Self {
        tracing::info!(kinds = ?storage.kinds(), "initialized archive service");
        Self {
            aggregator: InputAggregator::new(metadata, storage),
            level,
        }
    }

    /// Create the archive byte stream for the given file ids.
    ///
    /// The stream is finite, non-restartable, and meant to be consumed
    /// exactly once (typically as an HTTP response body).
    pub fn create_zip_stream(&self, ids: Vec<FileId>) -> impl Stream<Item = io::Result<Bytes>> {
        zip_stream_with_level(self.aggregator.outcomes(ids), self.level)
    }
}
