use std::{io, path::PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::{
    constants::SIDECAR_DIR,
    entities::asset::{Asset, AssetFilter},
    errors::AppError,
    infrastructure::storage::{
        atomic_file::{remove_if_exists, write_atomic},
        blob_store::BlobStore,
    },
    repositories::asset::AssetRepository,
};

/// Filesystem metadata index: one JSON sidecar per asset under
/// `<asset_root>/.meta/<id>.json`.
///
/// Image files without a sidecar are still listed, reconstructed from file
/// metadata alone. Reads never delete anything. Those records have no owner or conversation, so they only
/// show up in unfiltered listings.
#[derive(Clone)]
pub struct FsAssetRepo {
    blobs: BlobStore,
    meta_dir: PathBuf,
}

impl FsAssetRepo {
    pub fn new(blobs: BlobStore) -> Self {
        let meta_dir = blobs.root().join(SIDECAR_DIR);
        FsAssetRepo { blobs, meta_dir }
    }

    fn sidecar_path(&self, id: &str) -> PathBuf {
        self.meta_dir.join(format!("{}.json", id))
    }

    async fn read_sidecar(&self, id: &str) -> Result<Option<Asset>, AppError> {
        let raw = match fs::read(self.sidecar_path(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Asset>(&raw) {
            Ok(asset) => Ok(Some(asset)),
            Err(e) => {
                warn!(asset_id = %id, error = %e, "Skipping malformed asset sidecar");
                Ok(None)
            }
        }
    }

    /// Every asset on disk, sidecar-backed where possible. A sidecar whose
    /// image file is absent is skipped, never removed; only `delete_asset`
    /// removes sidecars.
    async fn load_all(&self) -> Result<Vec<Asset>, AppError> {
        let files = self.blobs.scan().await?;
        let mut assets = Vec::with_capacity(files.len());

        for file in files {
            match self.read_sidecar(&file.id).await? {
                Some(asset) if asset.file_path == file.file_name => assets.push(asset),
                _ => assets.push(file.into_asset()),
            }
        }

        Ok(assets)
    }
}

#[async_trait]
impl AssetRepository for FsAssetRepo {
    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn insert_asset(&self, asset: &Asset) -> Result<(), AppError> {
        let document = serde_json::to_vec_pretty(asset)?;
        write_atomic(&self.sidecar_path(&asset.id), &document).await?;
        Ok(())
    }

    async fn get_asset(&self, id: &str) -> Result<Option<Asset>, AppError> {
        if let Some(asset) = self.read_sidecar(id).await? {
            if self.blobs.exists(&asset.file_path).await {
                return Ok(Some(asset));
            }
        }

        Ok(self.blobs.find_by_id(id).await?.map(|file| file.into_asset()))
    }

    async fn list_assets(&self, filter: &AssetFilter) -> Result<Vec<Asset>, AppError> {
        let mut assets: Vec<Asset> = self.load_all().await?
            .into_iter()
            .filter(|asset| filter.matches(asset))
            .collect();

        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assets)
    }

    async fn list_assets_oldest_first(&self) -> Result<Vec<Asset>, AppError> {
        let mut assets = self.load_all().await?;
        assets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(assets)
    }

    async fn delete_asset(&self, id: &str) -> Result<bool, AppError> {
        Ok(remove_if_exists(&self.sidecar_path(id)).await?)
    }
}
