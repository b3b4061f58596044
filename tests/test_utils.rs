#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::{postgres::PgPoolOptions, PgPool};
use stage_store::{
    auth::jwt::JWT_ALGORITHM,
    db::postgres::Backend,
    entities::{asset::NewAssetMetadata, token::Claims},
    settings::{AppConfig, AppEnvironment, DatabaseSettings, StorageSettings},
    shared_repos::SharedRepositories,
    storage::blob_store::BlobStore,
    use_cases::{assets::AssetHandler, snapshots::SnapshotHandler},
    AppState,
};
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_jwt_secret_that_is_long_enough_for_hs512_1234567890";

/// A filesystem-backed store rooted in a throwaway directory.
pub struct TestStore {
    pub dir: TempDir,
    pub config: AppConfig,
    pub assets: AssetHandler,
    pub snapshots: SnapshotHandler,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(&dir);
        let repos = SharedRepositories::resolve(&Backend::filesystem(), &config.storage);

        let assets = AssetHandler::new(
            repos.asset_repo,
            repos.blobs,
            config.storage.public_base_url.clone(),
        );
        let snapshots = SnapshotHandler::new(repos.snapshot_repo);

        Self { dir, config, assets, snapshots }
    }

    pub fn asset_root(&self) -> PathBuf {
        self.config.storage.asset_root.clone()
    }

    pub fn snapshot_root(&self) -> PathBuf {
        self.config.storage.snapshot_root.clone()
    }

    pub fn blobs(&self) -> BlobStore {
        BlobStore::new(self.asset_root())
    }

    pub fn app_state(&self) -> AppState {
        let repos = SharedRepositories::filesystem(&self.config.storage);
        AppState::with_repositories(&self.config, Backend::filesystem(), repos)
    }

    pub fn asset_handler_with(
        &self,
        repo: Arc<dyn stage_store::repositories::asset::AssetRepository>,
    ) -> AssetHandler {
        AssetHandler::new(repo, self.blobs(), "/generated-images")
    }
}

pub fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Stage Store Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        database: DatabaseSettings::default(),
        storage: StorageSettings {
            asset_root: dir.path().join("generated-images"),
            snapshot_root: dir.path().join("stage-snapshots"),
            public_base_url: "/generated-images".to_string(),
            max_asset_size_mb: 1.0,
            cleanup_interval: None,
        },
        jwt_secret: TEST_JWT_SECRET.to_string(),
    }
}

/// Bytes with a PNG signature; the store never decodes pixels.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend((0..len.saturating_sub(8)).map(|i| (i % 251) as u8));
    bytes.truncate(len);
    bytes
}

pub fn data_uri(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

pub fn metadata(owner: Option<&str>, conversation: Option<&str>) -> NewAssetMetadata {
    NewAssetMetadata {
        owner_id: owner.map(str::to_string),
        conversation_id: conversation.map(str::to_string),
        title: "Sunset over dunes".to_string(),
        prompt: Some("a warm sunset over sand dunes".to_string()),
        model_id: "image-gen-2".to_string(),
        width: 1024,
        height: 768,
        meta: serde_json::json!({ "provider": "test", "license": "cc0" }),
    }
}

pub fn mint_token(sub: &str, admin: bool) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: sub.to_string(),
        admin,
        exp: now + 600,
        iat: now,
    };

    encode(
        &Header::new(JWT_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to mint token")
}

/// Keeps consecutive writes on distinct timestamps.
pub async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

pub fn mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Pool for the Postgres-backed tests, migrated. `None` (and the test is
/// skipped) when `DATABASE_URL` is unset.
pub async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping Postgres-backed test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Ids and owners unique to one test, so tests sharing a database never
/// see each other's rows.
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}
