use std::{sync::Arc, time::Duration};

use axum::{
    error_handling::HandleErrorLayer,
    routing::{delete, get, post},
    BoxError, Router,
};
use tower::{Layer, ServiceBuilder};
use tower_http::{
    cors::CorsLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    error::ApiError,
    handlers::{playlists, tags, users, videos},
    models::AppState,
    system_info,
};

/// The service handed to the server: trailing slashes are trimmed before routing,
/// so `/api/v1/playlists/explore/` reaches the same handler as the bare path.
pub fn app(state: Arc<AppState>) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/me", get(users::me).patch(users::update_me))
        .route("/users/by-username/:username", get(users::by_username))
        .route("/users/follow-status/:id", get(users::follow_status))
        .route("/playlists", get(playlists::list).post(playlists::create))
        .route("/playlists/explore", get(playlists::explore))
        .route("/playlists/my_playlists", get(playlists::my_playlists))
        .route("/playlists/liked_playlists", get(playlists::liked_playlists))
        .route("/playlists/popular", get(playlists::popular))
        .route("/playlists/recent_playlists", get(playlists::recent))
        .route("/playlists/search", get(playlists::search))
        .route("/playlists/user/:username", get(playlists::by_user))
        .route(
            "/playlists/:id",
            get(playlists::retrieve)
                .put(playlists::update)
                .patch(playlists::update)
                .delete(playlists::destroy),
        )
        .route("/playlists/:id/like", post(playlists::like))
        .route("/playlists/:id/share", post(playlists::share))
        .route("/videos", get(videos::list).post(videos::create))
        .route(
            "/videos/:id",
            get(videos::retrieve)
                .patch(videos::update)
                .delete(videos::destroy),
        )
        .route("/tags", get(tags::list))
        .route("/tags/autocomplete", get(tags::autocomplete))
        .route("/follows", get(users::follows).post(users::follow))
        .route("/follows/toggle_follow", post(users::toggle_follow))
        .route("/follows/:user_id", delete(users::unfollow));

    let mut app = Router::new()
        .route("/health", get(system_info::health))
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let timeout = state.config.limits.request_timeout_secs;
    if timeout > 0 {
        app = app.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(Duration::from_secs(timeout)),
        );
    }

    app.with_state(state)
}

async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("[timeout] Request exceeded the configured time limit");
        ApiError::Timeout
    } else {
        ApiError::Internal(err.to_string())
    }
}
