use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::{
    auth::CurrentUser,
    extract::Query,
    models::{AppState, SearchQuery, TagResponse},
};

pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Json<Vec<TagResponse>> {
    Json(state.store.tags().await)
}

/// Tags whose name starts with `q`
pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<TagResponse>> {
    let limit = state.config.limits.autocomplete_limit;
    Json(state.store.autocomplete_tags(&query.q, limit).await)
}
