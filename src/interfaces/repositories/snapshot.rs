use async_trait::async_trait;
use mockall::automock;
use sqlx::{self, types::Json, PgPool, QueryBuilder};
use tracing::warn;

use crate::{
    entities::snapshot::{ClearScope, Snapshot, SnapshotQuery, SnapshotRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxSnapshotRepo,
};

#[automock]
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    fn backend_name(&self) -> &'static str;
    /// Inserts or fully replaces the snapshot stored under `snapshot.id`.
    async fn upsert_snapshot(&self, snapshot: &Snapshot) -> Result<(), AppError>;
    /// Newest first; records whose payload no longer parses are skipped.
    async fn list_snapshots(&self, query: &SnapshotQuery) -> Result<Vec<Snapshot>, AppError>;
    async fn delete_owned_snapshot(&self, id: &str, owner_id: &str) -> Result<u64, AppError>;
    async fn clear_snapshots(&self, scope: &ClearScope) -> Result<u64, AppError>;
}

impl SqlxSnapshotRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxSnapshotRepo { pool }
    }
}

#[async_trait]
impl SnapshotRepository for SqlxSnapshotRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn upsert_snapshot(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO stage_snapshots (
                id, timestamp, owner_id, conversation_id, is_manual_save, payload
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                timestamp = EXCLUDED.timestamp,
                owner_id = EXCLUDED.owner_id,
                conversation_id = EXCLUDED.conversation_id,
                is_manual_save = EXCLUDED.is_manual_save,
                payload = EXCLUDED.payload
            "#
        )
        .bind(&snapshot.id)
        .bind(snapshot.timestamp)
        .bind(&snapshot.owner_id)
        .bind(&snapshot.conversation_id)
        .bind(snapshot.is_manual_save)
        .bind(Json(&snapshot.payload))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_snapshots(&self, query: &SnapshotQuery) -> Result<Vec<Snapshot>, AppError> {
        let mut builder = QueryBuilder::new("SELECT * FROM stage_snapshots WHERE TRUE");

        if let Some(id) = &query.id {
            builder.push(" AND id = ").push_bind(id);
        }
        if let Some(owner_id) = &query.owner_id {
            builder.push(" AND owner_id = ").push_bind(owner_id);
        }
        if let Some(conversation_id) = &query.conversation_id {
            builder.push(" AND conversation_id = ").push_bind(conversation_id);
        }
        if query.only_manual {
            builder.push(" AND is_manual_save = TRUE");
        }

        builder.push(" ORDER BY timestamp DESC");

        let rows = builder
            .build_query_as::<SnapshotRow>()
            .fetch_all(&self.pool)
            .await?;

        let snapshots = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                Snapshot::try_from(row)
                    .map_err(|e| warn!(snapshot_id = %id, error = %e, "Skipping malformed snapshot payload"))
                    .ok()
            })
            .collect();

        Ok(snapshots)
    }

    async fn delete_owned_snapshot(&self, id: &str, owner_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM stage_snapshots WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn clear_snapshots(&self, scope: &ClearScope) -> Result<u64, AppError> {
        let result = match scope {
            ClearScope::Owner(owner_id) => {
                sqlx::query("DELETE FROM stage_snapshots WHERE owner_id = $1")
                    .bind(owner_id)
                    .execute(&self.pool)
                    .await?
            }
            ClearScope::Everything => {
                sqlx::query("DELETE FROM stage_snapshots")
                    .execute(&self.pool)
                    .await?
            }
        };

        Ok(result.rows_affected())
    }
}
