use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use crate::{
    constants::START_TIME,
    entities::snapshot::ClearScope,
    errors::AppError,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[derive(Serialize)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    backend: String,
    database: String,
    asset_bytes: Option<u64>,
    asset_files: Option<usize>,
    version: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    #[serde(default)]
    pub max_size_mb: Option<f64>,
}

#[get("/")]
pub async fn home(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Workspace snapshot and asset store",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.backend.name(),
    }))
}

#[get("/health")]
pub async fn admin_health_check(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> impl Responder {
    let now_utc = Utc::now();
    let uptime = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime.num_seconds().max(0) as u64));

    let database = if state.backend.is_relational() {
        match state.backend.check_connection().await {
            Ok(_) => "OK",
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                "Unavailable"
            }
        }
    } else {
        "Not configured"
    };

    let usage = state.asset_handler.blobs.usage().await.ok();

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "healthy".to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        backend: state.backend.name().to_string(),
        database: database.to_string(),
        asset_bytes: usage.map(|u| u.bytes),
        asset_files: usage.map(|u| u.files),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[instrument(skip(_claims, state, data))]
pub async fn cleanup_images(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: Option<web::Json<CleanupRequest>>,
) -> Result<impl Responder, AppError> {
    let max_size_mb = data
        .and_then(|body| body.into_inner().max_size_mb)
        .unwrap_or(state.max_asset_size_mb);

    let report = state.asset_handler.cleanup_old_images(max_size_mb).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// The only path to the unscoped, system-wide snapshot clear.
#[instrument(skip(claims, state), fields(admin = %claims.0.sub))]
pub async fn clear_all_snapshots(
    claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let removed = state.snapshot_handler
        .clear_stage_snapshots(ClearScope::Everything)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": removed })))
}
