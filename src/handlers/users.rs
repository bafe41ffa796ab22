use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::info;

use super::{clearable, email, optional, required, username, MAX_NAME_LENGTH};
use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    extract::{JsonBody, Path},
    models::{
        AppState, FollowRequest, FollowResponse, FollowStatusResponse, RegisterRequest,
        StatusResponse, ToggleFollowRequest, UpdateProfileRequest, UserId, UserProfile,
    },
};

/// Register a new user
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(mut request): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    request.first_name = required("First name", &request.first_name, MAX_NAME_LENGTH)?;
    request.last_name = required("Last name", &request.last_name, MAX_NAME_LENGTH)?;
    request.username = username(&request.username)?;
    request.email = email(&request.email)?;
    request.profile_picture = optional(request.profile_picture.as_deref());

    let user = state.store.create_user(&request).await?;
    info!("[POST /users/register] ✅ Registered user {} ({})", user.id, user.username);

    let profile = state
        .store
        .profile(user.id)
        .await
        .ok_or_else(|| ApiError::Internal(format!("user {} vanished after creation", user.id)))?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<UserProfile>> {
    state
        .store
        .profile(user.id())
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Partial profile update for the caller
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    JsonBody(mut changes): JsonBody<UpdateProfileRequest>,
) -> ApiResult<Json<UserProfile>> {
    if let Some(name) = changes.username.take() {
        changes.username = Some(username(&name)?);
    }
    if let Some(name) = changes.first_name.take() {
        changes.first_name = Some(required("First name", &name, MAX_NAME_LENGTH)?);
    }
    if let Some(name) = changes.last_name.take() {
        changes.last_name = Some(required("Last name", &name, MAX_NAME_LENGTH)?);
    }
    changes.profile_picture = clearable(changes.profile_picture.take());

    let profile = state.store.update_user(user.id(), &changes).await?;
    Ok(Json(profile))
}

pub async fn by_username(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(name): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    state
        .store
        .profile_by_username(&name)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn follow_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<UserId>,
) -> Json<FollowStatusResponse> {
    let is_following = state.store.is_following(user.id(), id).await;
    Json(FollowStatusResponse { is_following })
}

/// Follows where the caller is either side
pub async fn follows(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Json<Vec<FollowResponse>> {
    Json(state.store.follows_involving(user.id()).await)
}

pub async fn follow(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    JsonBody(request): JsonBody<FollowRequest>,
) -> ApiResult<(StatusCode, Json<FollowResponse>)> {
    let follow = state.store.follow(user.id(), request.followed).await?;
    info!("[POST /follows] user {} now follows {}", user.id(), request.followed);
    Ok((StatusCode::CREATED, Json(follow)))
}

pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(followed): Path<UserId>,
) -> ApiResult<StatusCode> {
    state.store.unfollow(user.id(), followed).await?;
    info!("[DELETE /follows/{}] user {} unfollowed", followed, user.id());
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_follow(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    JsonBody(request): JsonBody<ToggleFollowRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let target = request
        .user_id
        .ok_or_else(|| ApiError::BadRequest("User ID is required.".to_string()))?;

    let following = state.store.toggle_follow(user.id(), target).await?;
    let status = if following { "followed" } else { "unfollowed" };
    info!("[POST /follows/toggle_follow] user {} {} {}", user.id(), status, target);
    Ok(Json(StatusResponse::new(status)))
}
