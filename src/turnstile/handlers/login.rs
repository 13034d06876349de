use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use super::ApiError;
use crate::credentials::LoginCredentials;
use crate::turnstile::AppContext;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Login with email and password; a fresh session token is minted on success.
///
/// Failure stays deliberately vague: a wrong password and an unknown email
/// produce the same response.
#[instrument(skip_all)]
pub async fn login(
    context: Extension<Arc<AppContext>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing payload" })),
        )
            .into_response());
    };

    let login = LoginCredentials::new(&request.email, &request.password)?;

    match context.store.login(&login).await? {
        Some(profile) => {
            let token = context.tokenizer.tokenize(&profile)?;
            Ok((StatusCode::OK, Json(LoginResponse { token })).into_response())
        }
        None => Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "login failed" })),
        )
            .into_response()),
    }
}
