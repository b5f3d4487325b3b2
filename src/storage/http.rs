use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};

use super::{ByteStream, FileStorage, StorageKind};
use crate::error::StorageError;

/// Storage adapter streaming file content from a remote HTTP server.
///
/// Keys are full URLs. The response body is exposed chunk by chunk without
/// ever being buffered whole; errors surfacing mid-body are reported through
/// the stream, not the initial fetch.
pub struct RemoteHttpStorage {
    client: Client,
}

impl RemoteHttpStorage {
    /// Create an adapter with a 30 second request timeout.
    pub fn new() -> Result<Self, StorageError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                StorageError::generic(StorageKind::RemoteHttp, "-", e.to_string())
            })?;
        Ok(Self { client })
    }

    /// Create an adapter around an existing client (shared pools, test setups).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Map an HTTP error status to the storage error taxonomy.
    ///
    /// 404 is a clean not-found; gateway/availability statuses are
    /// connectivity problems; anything else is a generic storage error.
    fn status_error(key: &str, status: StatusCode) -> StorageError {
        let reason = format!("remote server returned {status} for URL {key}");
        match status {
            StatusCode::NOT_FOUND => StorageError::not_found(StorageKind::RemoteHttp, key),
            StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => {
                StorageError::connectivity(StorageKind::RemoteHttp, key, reason)
            }
            _ => StorageError::generic(StorageKind::RemoteHttp, key, reason),
        }
    }

    fn request_error(key: &str, e: &reqwest::Error) -> StorageError {
        if e.is_timeout() || e.is_connect() {
            StorageError::connectivity(StorageKind::RemoteHttp, key, e.to_string())
        } else {
            StorageError::generic(StorageKind::RemoteHttp, key, e.to_string())
        }
    }
}

#[async_trait]
impl FileStorage for RemoteHttpStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::RemoteHttp
    }

    async fn fetch(&self, key: &str) -> Result<ByteStream, StorageError> {
        tracing::info!(url = %key, "starting download from remote HTTP storage");

        let response = self
            .client
            .get(key)
            .send()
            .await
            .map_err(|e| Self::request_error(key, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(key, status));
        }

        let key = key.to_string();
        let stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| Self::request_error(&key, &e))
        });

        Ok(Box::pin(stream))
    }
}
