//! Main entry point for the zipstream CLI application.
//!
//! This binary streams a set of local files and/or remote HTTP URLs into a
//! single ZIP archive written to a file or to stdout. Sources that cannot be
//! fetched are reported inside the archive rather than aborting it.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use flate2::Compression;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use zipstream::{
    ArchiveService, Cli, FileId, FileMetadata, InMemoryMetadataStore, LocalDiskStorage,
    RemoteHttpStorage, StorageKind, StorageRegistry,
};

/// Application entry point.
///
/// Builds an in-memory metadata store and a storage registry from the
/// command-line sources, then streams the archive to the requested output.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut metadata = InMemoryMetadataStore::new();
    let mut ids: Vec<FileId> = Vec::with_capacity(cli.sources.len());
    for (i, source) in cli.sources.iter().enumerate() {
        let id = i as FileId + 1;
        let storage_kind = if Cli::is_http_url(source) {
            StorageKind::RemoteHttp
        } else {
            StorageKind::LocalDisk
        };
        metadata.insert(FileMetadata {
            id,
            name: archive_name(source, storage_kind),
            content_type: "application/octet-stream".to_string(),
            storage_key: source.clone(),
            storage_kind,
        });
        ids.push(id);
    }

    let mut registry = StorageRegistry::new();
    registry.register(Arc::new(LocalDiskStorage::new(".")));
    registry.register(Arc::new(RemoteHttpStorage::new()?));

    let service = ArchiveService::with_level(
        Arc::new(metadata),
        Arc::new(registry),
        Compression::new(cli.level.min(9)),
    );

    let mut archive = service.create_zip_stream(ids);

    let mut total: u64 = 0;
    if let Some(ref path) = cli.output {
        let mut file = tokio::fs::File::create(path).await?;
        while let Some(chunk) = archive.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        file.flush().await?;
    } else {
        let mut stdout = tokio::io::stdout();
        while let Some(chunk) = archive.next().await {
            let chunk = chunk?;
            stdout.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        stdout.flush().await?;
    }

    if !cli.is_quiet() {
        eprintln!("Archive written: {}", format_size(total));
    }

    Ok(())
}

/// Derive the in-archive file name from a source argument.
///
/// URLs use the last path segment (query string stripped); local paths use
/// the base file name.
fn archive_name(source: &str, kind: StorageKind) -> String {
    match kind {
        StorageKind::RemoteHttp => {
            let without_query = source.split(['?', '#']).next().unwrap_or(source);
            without_query
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty())
                .unwrap_or("download")
                .to_string()
        }
        _ => Path::new(source)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| source.to_string()),
    }
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
