//! Sync manager - keeps the local dataset copy current and serves entries

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::Mutex;

use super::{RemoteSource, SyncState};
use crate::catalog::{ingest, validate_entries, CatalogStore};
use crate::error::{CatalogError, Result};

/// Whether the local copy must be replaced
///
/// A missing local copy always needs a refresh. Otherwise only a remote
/// timestamp strictly newer than the local one does; a source that reports
/// no timestamp never forces a download over an existing file.
pub fn needs_refresh(local: Option<DateTime<Utc>>, remote: Option<DateTime<Utc>>) -> bool {
    match (local, remote) {
        (None, _) => true,
        (Some(local), Some(remote)) => remote > local,
        (Some(_), None) => false,
    }
}

/// Result of one `check_and_sync` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    /// A new dataset was downloaded and installed
    pub refreshed: bool,
    /// Timestamp of the dataset now on disk
    pub as_of: Option<DateTime<Utc>>,
}

impl SyncOutcome {
    /// User-facing status line
    pub fn message(&self) -> String {
        if self.refreshed {
            return "A new version of the medication list was downloaded.".to_string();
        }
        match self.as_of {
            Some(as_of) => format!(
                "The medication list is up to date (last update: {}).",
                as_of.format("%d/%m/%Y")
            ),
            None => "The medication list is up to date.".to_string(),
        }
    }
}

/// Snapshot of the local dataset for `cache info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub modified: Option<DateTime<Utc>>,
    /// Entry count if the dataset is loaded in memory
    pub cached_entries: Option<usize>,
}

/// Owns the local dataset copy and the in-memory catalog
///
/// `sync_lock` serializes sync attempts. The state lock is only held to read
/// or swap the in-memory catalog, never across a network call, so readers
/// see either the old or the new dataset without waiting for a download.
pub struct SyncManager<S: RemoteSource> {
    source: S,
    dataset_path: PathBuf,
    fallback: Option<PathBuf>,
    state: Mutex<SyncState>,
    sync_lock: Mutex<()>,
}

impl<S: RemoteSource> SyncManager<S> {
    pub fn new(source: S, dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            dataset_path: dataset_path.into(),
            fallback: None,
            state: Mutex::new(SyncState::default()),
            sync_lock: Mutex::new(()),
        }
    }

    /// Read-only snapshot used when no synced copy exists yet
    pub fn with_fallback(mut self, fallback: Option<PathBuf>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Compare remote and local timestamps and download if needed
    ///
    /// The new payload is parsed before anything is written, and installed
    /// with an atomic rename. Any failure leaves the previous file and the
    /// in-memory catalog untouched.
    pub async fn check_and_sync(&self) -> Result<SyncOutcome> {
        let _sync = self.sync_lock.lock().await;

        let remote = self.source.last_modified().await?;
        let local = file_modified(&self.dataset_path).await?;
        tracing::debug!(
            "Dataset timestamps: local={:?} remote={:?}",
            local,
            remote
        );

        if !needs_refresh(local, remote) {
            tracing::info!("Local dataset is current, skipping download");
            return Ok(SyncOutcome {
                refreshed: false,
                as_of: local,
            });
        }

        tracing::info!(
            "Refreshing dataset from {} into {}",
            self.source.describe(),
            self.dataset_path.display()
        );

        let bytes = self.source.download().await?;
        let entries = ingest::parse_workbook(&bytes, self.source.describe())?;
        validate_entries(&entries)?;

        let target = self.dataset_path.clone();
        tokio::task::spawn_blocking(move || install_atomically(&target, &bytes, remote))
            .await
            .map_err(|e| CatalogError::io(&self.dataset_path, std::io::Error::other(e)))??;
        self.state.lock().await.invalidate();

        let as_of = match remote {
            Some(remote) => Some(remote),
            None => file_modified(&self.dataset_path).await?,
        };

        tracing::info!("Installed dataset with {} entries", entries.len());
        Ok(SyncOutcome {
            refreshed: true,
            as_of,
        })
    }

    /// The current catalog
    ///
    /// Served from memory when loaded; otherwise read from the synced file,
    /// then from the fallback snapshot.
    pub async fn read_entries(&self) -> Result<CatalogStore> {
        let mut state = self.state.lock().await;

        if let Some(store) = state.cached() {
            tracing::debug!("Serving {} cached entries", store.len());
            return Ok(store.clone());
        }

        if let Some(modified) = file_modified(&self.dataset_path).await? {
            let entries = ingest::load_dataset_file(&self.dataset_path).await?;
            tracing::debug!(
                "Loaded {} entries from {}",
                entries.len(),
                self.dataset_path.display()
            );
            let store = CatalogStore::new(entries);
            state.populate(store.clone(), Some(modified));
            return Ok(store);
        }

        if let Some(fallback) = &self.fallback {
            if file_modified(fallback).await?.is_some() {
                let entries = ingest::load_dataset_file(fallback).await?;
                tracing::info!(
                    "No synced dataset yet, using snapshot {} ({} entries)",
                    fallback.display(),
                    entries.len()
                );
                let store = CatalogStore::new(entries);
                state.populate(store.clone(), None);
                return Ok(store);
            }
            tracing::warn!("Fallback snapshot {} does not exist", fallback.display());
        }

        Err(CatalogError::DatasetMissing {
            path: self.dataset_path.clone(),
        })
    }

    /// Drop the in-memory catalog; the next read reloads from disk
    pub async fn invalidate(&self) {
        self.state.lock().await.invalidate();
    }

    pub async fn dataset_info(&self) -> Result<DatasetInfo> {
        let state = self.state.lock().await;
        let modified = file_modified(&self.dataset_path).await?;

        Ok(DatasetInfo {
            path: self.dataset_path.clone(),
            exists: modified.is_some(),
            modified,
            cached_entries: state.cached().map(CatalogStore::len),
        })
    }

    /// Delete the synced copy; returns whether a file was removed
    pub async fn clear_dataset(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.invalidate();

        match tokio::fs::remove_file(&self.dataset_path).await {
            Ok(()) => {
                tracing::info!("Removed dataset {}", self.dataset_path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CatalogError::io(&self.dataset_path, e)),
        }
    }
}

/// Modification time of `path`, or `None` if it does not exist
async fn file_modified(path: &Path) -> Result<Option<DateTime<Utc>>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            let modified = metadata
                .modified()
                .map_err(|e| CatalogError::io(path, e))?;
            Ok(Some(DateTime::<Utc>::from(modified)))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CatalogError::io(path, e)),
    }
}

/// Write `bytes` next to `target` and rename over it
///
/// `modified` becomes the file's mtime, so a later freshness check compares
/// against the publication time rather than the local clock.
fn install_atomically(
    target: &Path,
    bytes: &[u8],
    modified: Option<DateTime<Utc>>,
) -> Result<()> {
    let dir = match target.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CatalogError::io(dir, e))?;
    temp.write_all(bytes)
        .and_then(|()| match modified {
            Some(modified) => temp.as_file().set_modified(SystemTime::from(modified)),
            None => Ok(()),
        })
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| CatalogError::io(temp.path(), e))?;

    temp.persist(target)
        .map_err(|e| CatalogError::io(target, e.error))?;

    tracing::debug!("Wrote {} bytes to {}", bytes.len(), target.display());
    Ok(())
}
