use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{info, warn};
use std::time::Duration;

use crate::settings::DatabaseSettings;

/// Process-wide answer to "is a relational store available?".
///
/// Resolved once at startup by [`resolve_backend`] and handed to every storage
/// component, so backend selection has a single source of truth.
#[derive(Clone, Debug, Default)]
pub struct Backend {
    pool: Option<PgPool>,
}

impl Backend {
    pub fn relational(pool: PgPool) -> Self {
        Backend { pool: Some(pool) }
    }

    /// Sentinel for "no relational backend"; everything runs on the filesystem.
    pub fn filesystem() -> Self {
        Backend { pool: None }
    }

    pub fn handle(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn is_relational(&self) -> bool {
        self.pool.is_some()
    }

    pub fn name(&self) -> &'static str {
        if self.is_relational() { "postgres" } else { "filesystem" }
    }

    pub async fn check_connection(&self) -> Result<(), sqlx::Error> {
        match &self.pool {
            Some(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            None => Ok(()),
        }
    }
}

pub async fn create_pool(
    options: PgConnectOptions,
    max_connections: u32,
    max_retries: u32,
) -> Result<PgPool, sqlx::Error> {
    let mut retry_count = 0;
    let mut wait_seconds = 1;

    loop {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options.clone())
            .await
        {
            Ok(pool) => {
                info!("Database connection established.");
                return Ok(pool);
            }
            Err(e) if retry_count < max_retries => {
                retry_count += 1;
                info!(
                    "Failed to connect to database (attempt {}/{}): {}. Retrying in {}s...",
                    retry_count, max_retries, e, wait_seconds);

                tokio::time::sleep(Duration::from_secs(wait_seconds)).await;

                wait_seconds *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Decides the backend for the lifetime of the process. Never fails: an
/// incomplete configuration, an unreachable server or a failed migration all
/// resolve to the filesystem backend.
pub async fn resolve_backend(settings: &DatabaseSettings) -> Backend {
    let Some(options) = settings.connect_options() else {
        info!("Relational backend not configured; using filesystem storage");
        return Backend::filesystem();
    };

    let pool = match create_pool(options, settings.max_connections, settings.connect_retries).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, "Relational backend unreachable; falling back to filesystem storage");
            return Backend::filesystem();
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        warn!(error = %e, "Migrations failed; falling back to filesystem storage");
        pool.close().await;
        return Backend::filesystem();
    }

    Backend::relational(pool)
}
