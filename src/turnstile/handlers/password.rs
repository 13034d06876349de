use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use super::{bearer_token, ApiError};
use crate::store::MutationOutcome;
use crate::turnstile::AppContext;

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    email: String,
}

/// Self-service password change for the identity behind the bearer token.
#[instrument(skip_all)]
pub async fn change_password(
    context: Extension<Arc<AppContext>>,
    headers: HeaderMap,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?;

    let Some(Json(request)) = payload else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing payload" })),
        )
            .into_response());
    };

    let Some(profile) = context.store.login_by_token(&token).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no profile for this identity" })),
        )
            .into_response());
    };

    match context
        .store
        .update_password(profile.id(), &request.password)
        .await?
    {
        MutationOutcome::Applied => Ok(StatusCode::NO_CONTENT.into_response()),
        MutationOutcome::NotFound => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no profile for this identity" })),
        )
            .into_response()),
    }
}

/// Forgot-password: mint a single-use temporary password and hand it to the
/// delivery seam. Always answers 204 so the response cannot be used to probe
/// which emails exist.
#[instrument(skip_all)]
pub async fn forgot_password(
    context: Extension<Arc<AppContext>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing payload" })),
        )
            .into_response());
    };

    if let Some(temp_password) = context.store.issue_temp_password(&request.email).await? {
        context.notifier.deliver(&request.email, &temp_password);
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
