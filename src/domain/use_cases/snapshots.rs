use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::{debug, info, instrument};

use crate::{
    entities::snapshot::{ClearScope, Snapshot, SnapshotPayload, SnapshotQuery},
    errors::AppError,
    repositories::snapshot::SnapshotRepository,
    utils::valid_id::valid_storage_id,
};

#[derive(Clone)]
pub struct SnapshotHandler {
    pub snapshot_repo: Arc<dyn SnapshotRepository>,
}

impl SnapshotHandler {
    pub fn new(snapshot_repo: Arc<dyn SnapshotRepository>) -> Self {
        SnapshotHandler { snapshot_repo }
    }

    /// Creates or replaces the snapshot stored under `id`, stamping it with
    /// the current time. Ownership is recorded, not checked; the caller
    /// supplies the authenticated owner.
    #[instrument(skip(self, payload))]
    pub async fn save_stage_snapshot(
        &self,
        id: &str,
        payload: SnapshotPayload,
        owner_id: Option<&str>,
        conversation_id: Option<&str>,
        is_manual_save: bool,
    ) -> Result<Snapshot, AppError> {
        let id = valid_storage_id(id)?;

        let snapshot = Snapshot {
            id: id.to_string(),
            timestamp: Utc::now().trunc_subsecs(6),
            owner_id: owner_id.map(str::to_string),
            conversation_id: conversation_id.map(str::to_string),
            is_manual_save,
            payload,
        };

        self.snapshot_repo.upsert_snapshot(&snapshot).await?;

        debug!(
            snapshot_id = %snapshot.id,
            backend = self.snapshot_repo.backend_name(),
            "Saved stage snapshot"
        );
        Ok(snapshot)
    }

    /// Snapshots matching every supplied filter, newest first.
    #[instrument(skip(self))]
    pub async fn get_stage_snapshots(&self, query: &SnapshotQuery) -> Result<Vec<Snapshot>, AppError> {
        if let Some(id) = &query.id {
            if valid_storage_id(id).is_err() {
                return Ok(Vec::new());
            }
        }

        self.snapshot_repo.list_snapshots(query).await
    }

    /// Deletes `id` only when it belongs to `owner_id`. Succeeds silently when
    /// nothing matches.
    #[instrument(skip(self))]
    pub async fn delete_stage_snapshot(&self, id: &str, owner_id: &str) -> Result<(), AppError> {
        if valid_storage_id(id).is_err() {
            return Ok(());
        }

        let removed = self.snapshot_repo.delete_owned_snapshot(id, owner_id).await?;
        if removed == 0 {
            debug!(snapshot_id = %id, "No snapshot owned by caller; nothing deleted");
        }

        Ok(())
    }

    /// Removes every snapshot in `scope` and returns how many went.
    #[instrument(skip(self))]
    pub async fn clear_stage_snapshots(&self, scope: ClearScope) -> Result<u64, AppError> {
        let removed = self.snapshot_repo.clear_snapshots(&scope).await?;

        info!(?scope, removed, "Cleared stage snapshots");
        Ok(removed)
    }
}
