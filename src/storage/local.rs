use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::io::ReaderStream;

use super::{ByteStream, FileStorage, StorageKind};
use crate::error::StorageError;

/// Chunk size for streaming files off disk.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Storage adapter serving files from the local filesystem.
///
/// Keys are paths, resolved relative to the adapter's root directory (or used
/// as-is when absolute).
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        let path = Path::new(key);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl FileStorage for LocalDiskStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::LocalDisk
    }

    async fn fetch(&self, key: &str) -> Result<ByteStream, StorageError> {
        let path = self.resolve(key);
        let key = key.to_string();

        let file = tokio::fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::not_found(StorageKind::LocalDisk, &key)
            } else {
                StorageError::generic(StorageKind::LocalDisk, &key, e.to_string())
            }
        })?;

        tracing::debug!(key = %key, path = %path.display(), "streaming file from local disk");

        let stream = ReaderStream::with_capacity(file, READ_CHUNK_SIZE).map(move |chunk| {
            chunk.map_err(|e| StorageError::generic(StorageKind::LocalDisk, &key, e.to_string()))
        });

        Ok(Box::pin(stream))
    }
}
