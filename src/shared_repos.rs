use std::sync::Arc;

use crate::{
    db::postgres::Backend,
    infrastructure::storage::blob_store::BlobStore,
    repositories::{
        asset::AssetRepository,
        fs_asset::FsAssetRepo,
        fs_snapshot::FsSnapshotRepo,
        snapshot::SnapshotRepository,
        sqlx_repo::{SqlxAssetRepo, SqlxSnapshotRepo},
    },
    settings::StorageSettings,
};

/// The storage implementations chosen for this process. Built once from the
/// resolved [`Backend`]; nothing downstream branches on backend availability.
#[derive(Clone)]
pub struct SharedRepositories {
    pub blobs: BlobStore,
    pub asset_repo: Arc<dyn AssetRepository>,
    pub snapshot_repo: Arc<dyn SnapshotRepository>,
}

impl SharedRepositories {
    pub fn resolve(backend: &Backend, storage: &StorageSettings) -> Self {
        match backend.handle() {
            Some(pool) => SharedRepositories {
                blobs: BlobStore::new(&storage.asset_root),
                asset_repo: Arc::new(SqlxAssetRepo::new(pool.clone())),
                snapshot_repo: Arc::new(SqlxSnapshotRepo::new(pool.clone())),
            },
            None => Self::filesystem(storage),
        }
    }

    pub fn filesystem(storage: &StorageSettings) -> Self {
        let blobs = BlobStore::new(&storage.asset_root);

        SharedRepositories {
            asset_repo: Arc::new(FsAssetRepo::new(blobs.clone())),
            snapshot_repo: Arc::new(FsSnapshotRepo::new(&storage.snapshot_root)),
            blobs,
        }
    }
}
