pub mod asset;
pub mod fs_asset;
pub mod fs_snapshot;
pub mod snapshot;
pub mod sqlx_repo;
