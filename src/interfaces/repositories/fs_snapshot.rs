use std::{io, path::{Path, PathBuf}};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::{
    entities::snapshot::{ClearScope, Snapshot, SnapshotQuery},
    errors::AppError,
    infrastructure::storage::atomic_file::{remove_if_exists, write_atomic},
    repositories::snapshot::SnapshotRepository,
};

/// One `<id>.json` document per snapshot. Listing parses every file and
/// filters in memory.
#[derive(Clone)]
pub struct FsSnapshotRepo {
    root: PathBuf,
}

impl FsSnapshotRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSnapshotRepo { root: root.into() }
    }

    fn snapshot_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    async fn read_snapshot(path: &Path) -> Result<Option<Snapshot>, AppError> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Snapshot>(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping malformed snapshot file");
                Ok(None)
            }
        }
    }

    async fn snapshot_files(&self) -> Result<Vec<PathBuf>, AppError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_document = path.extension().and_then(|e| e.to_str()) == Some("json")
                && !path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));

            if is_document {
                paths.push(path);
            }
        }

        Ok(paths)
    }

    async fn load_all(&self) -> Result<Vec<(PathBuf, Snapshot)>, AppError> {
        let mut snapshots = Vec::new();
        for path in self.snapshot_files().await? {
            if let Some(snapshot) = Self::read_snapshot(&path).await? {
                snapshots.push((path, snapshot));
            }
        }
        Ok(snapshots)
    }
}

#[async_trait]
impl SnapshotRepository for FsSnapshotRepo {
    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn upsert_snapshot(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        let document = serde_json::to_vec(snapshot)?;
        write_atomic(&self.snapshot_path(&snapshot.id), &document).await?;
        Ok(())
    }

    async fn list_snapshots(&self, query: &SnapshotQuery) -> Result<Vec<Snapshot>, AppError> {
        let candidates = match &query.id {
            Some(id) => Self::read_snapshot(&self.snapshot_path(id)).await?
                .into_iter()
                .collect(),
            None => self.load_all().await?
                .into_iter()
                .map(|(_, snapshot)| snapshot)
                .collect::<Vec<_>>(),
        };

        let mut snapshots: Vec<Snapshot> = candidates
            .into_iter()
            .filter(|snapshot| query.matches(snapshot))
            .collect();

        snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(snapshots)
    }

    async fn delete_owned_snapshot(&self, id: &str, owner_id: &str) -> Result<u64, AppError> {
        let path = self.snapshot_path(id);
        let Some(snapshot) = Self::read_snapshot(&path).await? else {
            return Ok(0);
        };

        if snapshot.owner_id.as_deref() != Some(owner_id) {
            return Ok(0);
        }

        Ok(remove_if_exists(&path).await? as u64)
    }

    async fn clear_snapshots(&self, scope: &ClearScope) -> Result<u64, AppError> {
        let mut removed = 0;

        match scope {
            ClearScope::Owner(owner_id) => {
                for (path, snapshot) in self.load_all().await? {
                    if snapshot.owner_id.as_deref() == Some(owner_id.as_str())
                        && remove_if_exists(&path).await?
                    {
                        removed += 1;
                    }
                }
            }
            ClearScope::Everything => {
                for path in self.snapshot_files().await? {
                    if remove_if_exists(&path).await? {
                        removed += 1;
                    }
                }
            }
        }

        Ok(removed)
    }
}
