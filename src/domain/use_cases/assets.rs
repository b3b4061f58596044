use std::{collections::{HashMap, HashSet}, sync::Arc};

use chrono::{SubsecRound, Utc};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::{BYTES_PER_MB, EVICTION_TARGET_RATIO},
    entities::asset::{Asset, AssetFilter, AssetResponse, CleanupReport, ImageData, NewAssetMetadata},
    errors::AppError,
    infrastructure::storage::blob_store::{BlobStore, DiskUsage, ScannedFile},
    repositories::asset::AssetRepository,
    utils::{data_uri::decode_image_data, valid_id::is_plain_file_stem},
};

/// Asset store: image binaries on disk, metadata in the resolved repository.
///
/// The blob write is the durability floor. The metadata write is best-effort,
/// and reads fall back to scanning the asset root when the repository fails.
#[derive(Clone)]
pub struct AssetHandler {
    pub asset_repo: Arc<dyn AssetRepository>,
    pub blobs: BlobStore,
    public_base_url: String,
}

impl AssetHandler {
    pub fn new(
        asset_repo: Arc<dyn AssetRepository>,
        blobs: BlobStore,
        public_base_url: impl Into<String>,
    ) -> Self {
        AssetHandler {
            asset_repo,
            blobs,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn public_url(&self, asset: &Asset) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), asset.file_path)
    }

    fn to_response(&self, asset: Asset) -> AssetResponse {
        AssetResponse {
            url: self.public_url(&asset),
            asset,
        }
    }

    /// Stores a new image and returns its record.
    pub async fn save_image(
        &self,
        data: impl Into<ImageData>,
        metadata: NewAssetMetadata,
    ) -> Result<AssetResponse, AppError> {
        metadata.validate()?;
        let bytes = decode_image_data(data.into())?;
        let id = Uuid::new_v4().to_string();

        let file_path = self.blobs.write(&id, &bytes).await.map_err(|e| {
            error!(operation = "save_image", asset_id = %id, error = %e, "Failed to write image file");
            AppError::from(e)
        })?;

        let asset = Asset {
            id,
            owner_id: metadata.owner_id,
            conversation_id: metadata.conversation_id,
            title: metadata.title,
            prompt: metadata.prompt,
            model_id: metadata.model_id,
            file_path,
            width: metadata.width,
            height: metadata.height,
            created_at: Utc::now().trunc_subsecs(6),
            meta: metadata.meta,
        };

        if let Err(e) = self.asset_repo.insert_asset(&asset).await {
            warn!(
                operation = "save_image",
                asset_id = %asset.id,
                backend = self.asset_repo.backend_name(),
                error = %e,
                "Metadata mirror failed; image kept on disk"
            );
        }

        info!(asset_id = %asset.id, size = bytes.len(), "Saved image");
        Ok(self.to_response(asset))
    }

    #[instrument(skip(self))]
    pub async fn get_image(&self, id: &str) -> Result<Option<AssetResponse>, AppError> {
        if !is_plain_file_stem(id) {
            return Ok(None);
        }

        match self.asset_repo.get_asset(id).await {
            Ok(Some(asset)) => return Ok(Some(self.to_response(asset))),
            Ok(None) => {}
            Err(e) => {
                warn!(operation = "get_image", asset_id = %id, error = %e, "Metadata lookup failed; scanning asset root");
            }
        }

        let scanned = self.blobs.find_by_id(id).await?;
        Ok(scanned.map(|file| self.to_response(file.into_asset())))
    }

    /// Raw bytes of a stored image.
    #[instrument(skip(self))]
    pub async fn get_image_bytes(&self, id: &str) -> Result<Option<Vec<u8>>, AppError> {
        match self.get_image(id).await? {
            Some(response) => Ok(Some(self.blobs.read(&response.asset.file_path).await?)),
            None => Ok(None),
        }
    }

    /// Lists images newest first, filtered by owner and/or conversation.
    #[instrument(skip(self))]
    pub async fn get_all_images(
        &self,
        owner_id: Option<&str>,
        conversation_id: Option<&str>,
    ) -> Result<Vec<AssetResponse>, AppError> {
        let filter = AssetFilter::new(owner_id, conversation_id);

        let assets = match self.asset_repo.list_assets(&filter).await {
            Ok(assets) => assets,
            Err(e) => {
                warn!(operation = "get_all_images", error = %e, "Metadata listing failed; scanning asset root");
                let mut scanned: Vec<Asset> = self.blobs.scan().await?
                    .into_iter()
                    .map(|file| file.into_asset())
                    .filter(|asset| filter.matches(asset))
                    .collect();
                scanned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                scanned
            }
        };

        Ok(assets.into_iter().map(|asset| self.to_response(asset)).collect())
    }

    /// Deletes the binary and then its metadata. `false` when nothing matched.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, id: &str) -> Result<bool, AppError> {
        if !is_plain_file_stem(id) {
            return Ok(false);
        }

        let stored = match self.asset_repo.get_asset(id).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(operation = "delete_image", asset_id = %id, error = %e, "Metadata lookup failed; matching by file name");
                None
            }
        };

        let file_path = match stored {
            Some(asset) => Some(asset.file_path),
            None => self.blobs.find_by_id(id).await?.map(|file| file.file_name),
        };

        match file_path {
            Some(file_path) => self.remove_stored(id, &file_path).await,
            None => Ok(false),
        }
    }

    /// Removes the binary at `file_path`, then the metadata for `id`.
    async fn remove_stored(&self, id: &str, file_path: &str) -> Result<bool, AppError> {
        let removed_file = self.blobs.remove(file_path).await.map_err(|e| {
            error!(operation = "delete_image", asset_id = %id, error = %e, "Failed to delete image file");
            AppError::from(e)
        })?;

        let removed_record = self.asset_repo.delete_asset(id).await.map_err(|e| {
            error!(operation = "delete_image", asset_id = %id, error = %e, "Image file deleted but metadata removal failed");
            e
        })?;

        Ok(removed_file || removed_record)
    }

    /// Evicts oldest-first once the asset root reaches `max_size_mb`, stopping
    /// at 80% of the ceiling. Callers must not run two passes at once.
    #[instrument(skip(self))]
    pub async fn cleanup_old_images(&self, max_size_mb: f64) -> Result<CleanupReport, AppError> {
        if max_size_mb.is_nan() || max_size_mb <= 0.0 {
            return Err(AppError::InvalidInput("max_size_mb must be positive".into()));
        }

        let files = self.blobs.scan().await?;
        let usage = DiskUsage::of(&files);
        let max_bytes = (max_size_mb * BYTES_PER_MB) as u64;

        let mut report = CleanupReport {
            bytes_before: usage.bytes,
            bytes_after: usage.bytes,
            files_before: usage.files,
            deleted: Vec::new(),
        };

        if usage.bytes < max_bytes {
            info!(bytes = usage.bytes, max_bytes, "Asset storage under limit; nothing to evict");
            return Ok(report);
        }

        let target_bytes = (max_bytes as f64 * EVICTION_TARGET_RATIO) as u64;
        let mut running = usage.bytes;

        let on_disk: HashMap<String, ScannedFile> = files
            .into_iter()
            .map(|file| (file.file_name.clone(), file))
            .collect();

        for asset in self.eviction_candidates(&on_disk).await {
            if running <= target_bytes {
                break;
            }

            let size = on_disk.get(&asset.file_path).map_or(0, |file| file.size);
            match self.remove_stored(&asset.id, &asset.file_path).await {
                Ok(true) => {
                    running = running.saturating_sub(size);
                    report.deleted.push(asset.id);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(operation = "cleanup_old_images", asset_id = %asset.id, error = %e, "Eviction of asset failed");
                }
            }
        }

        report.bytes_after = running;
        info!(
            bytes_before = report.bytes_before,
            bytes_after = report.bytes_after,
            evicted = report.deleted.len(),
            "Asset eviction finished"
        );

        Ok(report)
    }

    /// Every asset oldest first: indexed records plus any file in `on_disk`
    /// the index does not know about, dated by modification time.
    async fn eviction_candidates(&self, on_disk: &HashMap<String, ScannedFile>) -> Vec<Asset> {
        let mut candidates = match self.asset_repo.list_assets_oldest_first().await {
            Ok(assets) => assets,
            Err(e) => {
                warn!(operation = "cleanup_old_images", error = %e, "Metadata listing failed; ordering by file modification time");
                Vec::new()
            }
        };

        let known: HashSet<String> = candidates.iter().map(|a| a.id.clone()).collect();
        candidates.extend(
            on_disk.values()
                .filter(|file| !known.contains(&file.id))
                .map(|file| file.clone().into_asset())
        );

        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        candidates
    }
}
