mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;
pub mod shared_repos;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, db, storage, utils};

use auth::jwt::JwtService;
use db::postgres::Backend;
use shared_repos::SharedRepositories;
use use_cases::{assets::AssetHandler, snapshots::SnapshotHandler};

pub struct AppState {
    pub backend: Backend,
    pub asset_handler: AssetHandler,
    pub snapshot_handler: SnapshotHandler,
    pub token_service: JwtService,
    pub max_asset_size_mb: f64,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, backend: Backend) -> Self {
        let repos = SharedRepositories::resolve(&backend, &config.storage);
        Self::with_repositories(config, backend, repos)
    }

    pub fn with_repositories(
        config: &settings::AppConfig,
        backend: Backend,
        repos: SharedRepositories,
    ) -> Self {
        let asset_handler = AssetHandler::new(
            repos.asset_repo,
            repos.blobs,
            config.storage.public_base_url.clone(),
        );
        let snapshot_handler = SnapshotHandler::new(repos.snapshot_repo);

        AppState {
            backend,
            asset_handler,
            snapshot_handler,
            token_service: JwtService::new(config),
            max_asset_size_mb: config.storage.max_asset_size_mb,
        }
    }
}
