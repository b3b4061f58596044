use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    entities::snapshot::{ClearScope, SaveSnapshotRequest, SnapshotPayload, SnapshotQuery},
    errors::AppError,
    use_cases::extractors::AuthClaims,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListSnapshotsQuery {
    #[serde(default, alias = "conversation_id")]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub only_manual: bool,
}

#[instrument(skip(claims, state, data), fields(owner_id = %claims.owner_id()))]
pub async fn save_snapshot(
    claims: AuthClaims,
    state: web::Data<AppState>,
    snapshot_id: web::Path<String>,
    data: web::Json<SaveSnapshotRequest>,
) -> Result<impl Responder, AppError> {
    let handler = &state.snapshot_handler;
    let owner_id = claims.owner_id();

    // An id already held by someone else must not change hands.
    let existing = handler
        .get_stage_snapshots(&SnapshotQuery {
            id: Some(snapshot_id.to_string()),
            ..SnapshotQuery::default()
        })
        .await?;
    if existing.iter().any(|s| s.owner_id.as_deref().is_some_and(|o| o != owner_id)) {
        return Err(AppError::ForbiddenAccess);
    }

    let request = data.into_inner();
    let payload = SnapshotPayload {
        text_drafts: request.text_drafts,
        image_drafts: request.image_drafts,
        composed_draft: request.composed_draft,
    };

    let snapshot = handler
        .save_stage_snapshot(
            &snapshot_id,
            payload,
            Some(owner_id),
            request.chat_id.as_deref(),
            request.is_manual_save,
        )
        .await?;

    Ok(HttpResponse::Ok().json(snapshot))
}

#[instrument(skip(claims, state, query), fields(owner_id = %claims.owner_id()))]
pub async fn get_snapshots(
    claims: AuthClaims,
    state: web::Data<AppState>,
    query: web::Query<ListSnapshotsQuery>,
) -> Result<impl Responder, AppError> {
    let query = query.into_inner();
    let snapshots = state.snapshot_handler
        .get_stage_snapshots(&SnapshotQuery {
            owner_id: Some(claims.owner_id().to_string()),
            conversation_id: query.chat_id,
            id: query.id,
            only_manual: query.only_manual,
        })
        .await?;

    Ok(HttpResponse::Ok().json(snapshots))
}

#[instrument(skip(claims, state), fields(owner_id = %claims.owner_id()))]
pub async fn delete_snapshot(
    claims: AuthClaims,
    state: web::Data<AppState>,
    snapshot_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    state.snapshot_handler
        .delete_stage_snapshot(&snapshot_id, claims.owner_id())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

#[instrument(skip(claims, state), fields(owner_id = %claims.owner_id()))]
pub async fn clear_my_snapshots(
    claims: AuthClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let removed = state.snapshot_handler
        .clear_stage_snapshots(ClearScope::Owner(claims.owner_id().to_string()))
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": removed })))
}
