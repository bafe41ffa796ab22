use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::info;

use super::{
    clearable, http_url, optional, required, tiktok_id_from_url, MAX_TIKTOK_ID_LENGTH,
    MAX_VIDEO_TITLE_LENGTH,
};
use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    extract::{JsonBody, Path, Query},
    models::{AppState, CreateVideoRequest, UpdateVideoRequest, Video, VideoId, VideoListQuery},
};

/// Videos in playlists the caller can see
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<VideoListQuery>,
) -> Json<Vec<Video>> {
    Json(state.store.list_videos(user.id(), query.playlist).await)
}

/// Add a video to one of the caller's playlists
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    JsonBody(mut request): JsonBody<CreateVideoRequest>,
) -> ApiResult<(StatusCode, Json<Video>)> {
    request.tiktok_url = http_url("TikTok URL", &request.tiktok_url)?;
    request.title = title(request.title.as_deref())?;
    request.thumbnail_url = match optional(request.thumbnail_url.as_deref()) {
        Some(url) => Some(http_url("Thumbnail URL", &url)?),
        None => None,
    };

    let tiktok_id = match optional(request.tiktok_id.as_deref()) {
        Some(id) => required("TikTok ID", &id, MAX_TIKTOK_ID_LENGTH)?,
        None => tiktok_id_from_url(&request.tiktok_url).ok_or_else(|| {
            ApiError::BadRequest(
                "TikTok ID is required when the URL does not contain one.".to_string(),
            )
        })?,
    };

    let video = state.store.add_video(user.id(), &request, tiktok_id).await?;
    info!(
        "[POST /videos] ✅ Added video {} ({}) to playlist {} at position {}",
        video.id, video.tiktok_id, video.playlist, video.order
    );
    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<VideoId>,
) -> ApiResult<Json<Video>> {
    Ok(Json(state.store.video(user.id(), id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<VideoId>,
    JsonBody(mut changes): JsonBody<UpdateVideoRequest>,
) -> ApiResult<Json<Video>> {
    if let Some(text) = clearable(changes.title.take()) {
        changes.title = Some(title(text.as_deref())?);
    }
    changes.thumbnail_url = match clearable(changes.thumbnail_url.take()) {
        Some(Some(url)) => Some(Some(http_url("Thumbnail URL", &url)?)),
        other => other,
    };
    Ok(Json(state.store.update_video(user.id(), id, &changes).await?))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<VideoId>,
) -> ApiResult<StatusCode> {
    state.store.delete_video(user.id(), id).await?;
    info!("[DELETE /videos/{}] 🗑️  Removed by user {}", id, user.id());
    Ok(StatusCode::NO_CONTENT)
}

fn title(value: Option<&str>) -> ApiResult<Option<String>> {
    optional(value)
        .map(|t| required("Title", &t, MAX_VIDEO_TITLE_LENGTH))
        .transpose()
}
