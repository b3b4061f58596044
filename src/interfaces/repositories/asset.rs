use async_trait::async_trait;
use mockall::automock;
use sqlx::{self, types::Json, PgPool, QueryBuilder};

use crate::{
    entities::asset::{Asset, AssetFilter, AssetRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxAssetRepo,
};

/// Metadata index for stored assets. Binaries live in the blob store; an
/// implementation only keeps the records describing them.
#[automock]
#[async_trait]
pub trait AssetRepository: Send + Sync {
    fn backend_name(&self) -> &'static str;
    async fn insert_asset(&self, asset: &Asset) -> Result<(), AppError>;
    async fn get_asset(&self, id: &str) -> Result<Option<Asset>, AppError>;
    /// Newest first.
    async fn list_assets(&self, filter: &AssetFilter) -> Result<Vec<Asset>, AppError>;
    async fn list_assets_oldest_first(&self) -> Result<Vec<Asset>, AppError>;
    async fn delete_asset(&self, id: &str) -> Result<bool, AppError>;
}

impl SqlxAssetRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxAssetRepo { pool }
    }
}

#[async_trait]
impl AssetRepository for SqlxAssetRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn insert_asset(&self, asset: &Asset) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO generated_images (
                id, owner_id, conversation_id, title, prompt, model_id,
                file_path, width, height, meta, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#
        )
        .bind(&asset.id)
        .bind(&asset.owner_id)
        .bind(&asset.conversation_id)
        .bind(&asset.title)
        .bind(&asset.prompt)
        .bind(&asset.model_id)
        .bind(&asset.file_path)
        .bind(asset.width)
        .bind(asset.height)
        .bind(Json(&asset.meta))
        .bind(asset.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_asset(&self, id: &str) -> Result<Option<Asset>, AppError> {
        let row = sqlx::query_as::<_, AssetRow>(
            "SELECT * FROM generated_images WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Asset::from))
    }

    async fn list_assets(&self, filter: &AssetFilter) -> Result<Vec<Asset>, AppError> {
        let mut builder = QueryBuilder::new("SELECT * FROM generated_images WHERE TRUE");

        if let Some(owner_id) = &filter.owner_id {
            builder.push(" AND owner_id = ").push_bind(owner_id);
        }
        if let Some(conversation_id) = &filter.conversation_id {
            builder.push(" AND conversation_id = ").push_bind(conversation_id);
        }

        builder.push(" ORDER BY created_at DESC");

        let assets = builder
            .build_query_as::<AssetRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Asset::from)
            .collect();

        Ok(assets)
    }

    async fn list_assets_oldest_first(&self) -> Result<Vec<Asset>, AppError> {
        let assets = sqlx::query_as::<_, AssetRow>(
            "SELECT * FROM generated_images ORDER BY created_at ASC"
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Asset::from)
        .collect();

        Ok(assets)
    }

    async fn delete_asset(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM generated_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
