use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use super::{bearer_token, ApiError};
use crate::turnstile::AppContext;

/// Resolve a bearer token into the current stored profile.
///
/// The token is authenticated remotely; profile fields come from the store,
/// keyed by durable identifier, never from token claims.
#[instrument(skip_all)]
pub async fn profile(
    context: Extension<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?;

    match context.store.login_by_token(&token).await? {
        Some(profile) => Ok((StatusCode::OK, Json(profile)).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no profile for this identity" })),
        )
            .into_response()),
    }
}
