use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{
    error::ApiError,
    models::{AppState, User, UserId},
};

/// Header carrying the id of the caller, set by the authenticating gateway in front of us.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller. Rejects with 401 when the identity header is
/// missing, malformed, or names an unknown user.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> UserId {
        self.0.id
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthenticated(
                    "Authentication credentials were not provided.".to_string(),
                )
            })?;

        let id: UserId = raw
            .trim()
            .parse()
            .map_err(|_| ApiError::Unauthenticated("Malformed user identity.".to_string()))?;

        state
            .store
            .user(id)
            .await
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthenticated("Unknown user.".to_string()))
    }
}
