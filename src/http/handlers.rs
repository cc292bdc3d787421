use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::album::{Album, AlbumId, NewAlbum};
use crate::http::error::{ApiError, ApiResult};
use crate::http::state::AppState;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.service_name.to_string(),
    })
}

pub async fn list_albums(State(state): State<AppState>) -> ApiResult<Json<Vec<Album>>> {
    let albums = state.store.list_all().await?;
    Ok(Json(albums))
}

pub async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Album>> {
    let id = parse_id(&id)?;
    let album = state.store.get_by_id(id).await?;
    Ok(Json(album))
}

/// Creates an album from the JSON body. Any `id` in the body is ignored.
pub async fn create_album(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Album>)> {
    let album = parse_album(&body)?;
    let album = state.store.create(album).await?;
    info!("Created album {}", album.id);
    Ok((StatusCode::CREATED, Json(album)))
}

pub async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Album>> {
    let id = parse_id(&id)?;
    let album = parse_album(&body)?;
    let album = state.store.update(id, album).await?;
    Ok(Json(album))
}

pub async fn delete_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    info!("Deleted album {}", id);
    Ok(StatusCode::NO_CONTENT)
}

// `u64::from_str` also takes a leading `+`.
fn parse_id(id: &str) -> ApiResult<AlbumId> {
    let invalid = || ApiError::BadRequest(format!("invalid album id '{}'", id));
    if !id.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid());
    }
    id.parse::<AlbumId>().map_err(|_| invalid())
}

// The body is decoded whatever the declared content type is.
fn parse_album(body: &[u8]) -> ApiResult<NewAlbum> {
    let album: NewAlbum = serde_json::from_slice(body)?;
    album.validate()?;
    Ok(album)
}
