use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{Datelike, Utc};
use tracing::{debug, info};

use super::{clearable, optional, required, MAX_TITLE_LENGTH};
use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    explore::PageRequest,
    extract::{JsonBody, Path, Query},
    models::{
        AppState, CreatePlaylistRequest, ExploreQuery, LimitQuery, PlaylistId, PlaylistListQuery,
        PlaylistResponse, SearchQuery, ShareResponse, StatusResponse, UpdatePlaylistRequest,
    },
    store::{Listing, PlaylistOrdering, Scope},
};

/// List playlists visible to the caller
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<PlaylistListQuery>,
) -> ApiResult<Json<Vec<PlaylistResponse>>> {
    let ordering = match query.ordering.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
        Some(raw) => raw.parse::<PlaylistOrdering>().map_err(ApiError::BadRequest)?,
        None => PlaylistOrdering::default(),
    };
    let listing = Listing {
        scope: Some(Scope::Visible),
        search: optional(query.search.as_deref()).map(|s| s.to_lowercase()),
        ordering,
        ..Listing::default()
    };

    let playlists = state.store.list_playlists(user.id(), &listing).await;
    debug!("[GET /playlists] user={} -> {} playlists", user.id(), playlists.len());
    Ok(Json(playlists))
}

/// Create a playlist owned by the caller
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    JsonBody(mut request): JsonBody<CreatePlaylistRequest>,
) -> ApiResult<(StatusCode, Json<PlaylistResponse>)> {
    request.title = required("Title", &request.title, MAX_TITLE_LENGTH)?;
    request.description = optional(request.description.as_deref());
    request.cover_image = optional(request.cover_image.as_deref());

    let playlist = state.store.create_playlist(user.id(), &request).await?;
    info!(
        "[POST /playlists] ✅ Created playlist {} ({:?}) for user {}",
        playlist.id,
        playlist.title,
        user.id()
    );
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// Retrieve a playlist, counting the view
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<PlaylistId>,
) -> ApiResult<Json<PlaylistResponse>> {
    let playlist = state.store.view_playlist(user.id(), id).await?;
    Ok(Json(playlist))
}

/// Update a playlist (owner only); absent fields are left unchanged, `null` or blank clears
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<PlaylistId>,
    JsonBody(mut changes): JsonBody<UpdatePlaylistRequest>,
) -> ApiResult<Json<PlaylistResponse>> {
    if let Some(title) = changes.title.take() {
        changes.title = Some(required("Title", &title, MAX_TITLE_LENGTH)?);
    }
    changes.description = clearable(changes.description.take());
    changes.cover_image = clearable(changes.cover_image.take());

    let playlist = state.store.update_playlist(user.id(), id, &changes).await?;
    info!("[PATCH /playlists/{}] ✅ Updated by user {}", id, user.id());
    Ok(Json(playlist))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<PlaylistId>,
) -> ApiResult<StatusCode> {
    state.store.delete_playlist(user.id(), id).await?;
    info!("[DELETE /playlists/{}] 🗑️  Deleted by user {}", id, user.id());
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle the caller's like
pub async fn like(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<PlaylistId>,
) -> ApiResult<Json<StatusResponse>> {
    let liked = state.store.toggle_like(user.id(), id).await?;
    let status = if liked { "liked" } else { "unliked" };
    debug!("[POST /playlists/{}/like] user={} -> {}", id, user.id(), status);
    Ok(Json(StatusResponse::new(status)))
}

pub async fn share(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<PlaylistId>,
) -> ApiResult<Json<ShareResponse>> {
    let share_count = state.store.record_share(user.id(), id).await?;
    debug!("[POST /playlists/{}/share] share_count={}", id, share_count);
    Ok(Json(ShareResponse { share_count }))
}

pub async fn my_playlists(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Json<Vec<PlaylistResponse>> {
    let listing = Listing::of(Scope::OwnedBy(user.id()));
    Json(state.store.list_playlists(user.id(), &listing).await)
}

pub async fn liked_playlists(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Json<Vec<PlaylistResponse>> {
    let listing = Listing::of(Scope::LikedByViewer);
    Json(state.store.list_playlists(user.id(), &listing).await)
}

/// Most liked public playlists, ties broken by views
pub async fn popular(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<PlaylistResponse>> {
    let listing = Listing {
        scope: Some(Scope::Public),
        ordering: PlaylistOrdering::POPULAR,
        limit: Some(query.limit.unwrap_or(state.config.explore.default_list_limit)),
        ..Listing::default()
    };
    Json(state.store.list_playlists(user.id(), &listing).await)
}

pub async fn recent(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<PlaylistResponse>> {
    let listing = Listing {
        scope: Some(Scope::Public),
        ordering: PlaylistOrdering::NEWEST,
        limit: Some(query.limit.unwrap_or(state.config.explore.default_list_limit)),
        ..Listing::default()
    };
    Json(state.store.list_playlists(user.id(), &listing).await)
}

/// Search titles, descriptions and tag names
pub async fn search(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<PlaylistResponse>> {
    let Some(needle) = optional(Some(query.q.as_str())).map(|q| q.to_lowercase()) else {
        return Json(Vec::new());
    };
    let listing = Listing {
        scope: Some(Scope::Visible),
        search: Some(needle),
        search_tags: true,
        ..Listing::default()
    };

    let playlists = state.store.list_playlists(user.id(), &listing).await;
    debug!("[GET /playlists/search] q={:?} -> {} results", query.q, playlists.len());
    Json(playlists)
}

/// A user's playlists: everything for the owner, public ones for everyone else
pub async fn by_user(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<PlaylistResponse>>> {
    let owner = state
        .store
        .profile_by_username(&username)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let scope = if owner.id == user.id() {
        Scope::OwnedBy(owner.id)
    } else {
        Scope::PublicOwnedBy(owner.id)
    };
    Ok(Json(state.store.list_playlists(user.id(), &Listing::of(scope)).await))
}

/// One page of the daily shuffled explore feed
pub async fn explore(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ExploreQuery>,
) -> ApiResult<Json<Vec<PlaylistResponse>>> {
    let settings = &state.config.explore;
    let page = positive("page", query.page.unwrap_or(1))?;
    let limit = positive("limit", query.limit.unwrap_or(i64::from(settings.default_page_size)))?
        .min(settings.max_page_size);

    let request = PageRequest::new(page, limit, user.id(), Utc::now().ordinal())?;
    let playlists = state.store.explore(&request).await?;

    info!(
        "[GET /playlists/explore] 🎲 user={} page={} limit={} seed={} -> {} playlists",
        user.id(),
        page,
        limit,
        request.seed(),
        playlists.len()
    );
    Ok(Json(playlists))
}

fn positive(name: &str, value: i64) -> ApiResult<u32> {
    if value < 1 {
        return Err(ApiError::BadRequest(format!(
            "{} must be a positive integer.",
            name
        )));
    }
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}
