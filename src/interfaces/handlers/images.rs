use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    entities::asset::NewAssetMetadata,
    errors::AppError,
    use_cases::extractors::AuthClaims,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SaveImageRequest {
    /// Data URI or bare base64.
    pub data: String,
    #[serde(flatten)]
    pub metadata: NewAssetMetadata,
}

#[derive(Debug, Deserialize)]
pub struct ListImagesQuery {
    #[serde(default, alias = "conversation_id")]
    pub chat_id: Option<String>,
}

#[instrument(skip(claims, state, data), fields(owner_id = %claims.owner_id()))]
pub async fn save_image(
    claims: AuthClaims,
    state: web::Data<AppState>,
    data: web::Json<SaveImageRequest>,
) -> Result<impl Responder, AppError> {
    let SaveImageRequest { data, mut metadata } = data.into_inner();
    metadata.owner_id = Some(claims.owner_id().to_string());

    let asset = state.asset_handler.save_image(data, metadata).await?;

    Ok(HttpResponse::Created().json(asset))
}

#[instrument(skip(claims, state, query), fields(owner_id = %claims.owner_id()))]
pub async fn get_all_images(
    claims: AuthClaims,
    state: web::Data<AppState>,
    query: web::Query<ListImagesQuery>,
) -> Result<impl Responder, AppError> {
    let images = state.asset_handler
        .get_all_images(Some(claims.owner_id()), query.chat_id.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(images))
}

#[instrument(skip(claims, state))]
pub async fn get_image(
    claims: AuthClaims,
    state: web::Data<AppState>,
    image_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let image = state.asset_handler
        .get_image(&image_id)
        .await?
        .filter(|image| image.asset.owner_id.as_deref() == Some(claims.owner_id()) || claims.0.admin)
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    Ok(HttpResponse::Ok().json(image))
}

#[instrument(skip(claims, state))]
pub async fn delete_image(
    claims: AuthClaims,
    state: web::Data<AppState>,
    image_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let image = state.asset_handler
        .get_image(&image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    let is_owner = image.asset.owner_id.as_deref() == Some(claims.owner_id());
    if !is_owner && !claims.0.admin {
        return Err(AppError::ForbiddenAccess);
    }

    if !state.asset_handler.delete_image(&image_id).await? {
        return Err(AppError::NotFound("Image not found".to_string()));
    }

    Ok(HttpResponse::NoContent().finish())
}
