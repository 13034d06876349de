//! Admin-gated credential management endpoints.
//!
//! Every handler here passes the caller's bearer token to the store, which
//! re-reads the current admin flag on each call; a stale token never grants
//! admin access.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use super::{bearer_token, ApiError};
use crate::credentials::{Credentials, Name};
use crate::error::Error;
use crate::store::{InsertOutcome, MutationOutcome};
use crate::turnstile::AppContext;

#[derive(Deserialize)]
pub struct UserPayload {
    email: String,
    password: Option<String>,
    first_name: String,
    last_name: String,
    title: String,
    department: String,
    location: String,
    role: String,
    #[serde(default)]
    is_admin: bool,
}

fn credentials_from_payload(id: i32, payload: &UserPayload) -> Result<Credentials, Error> {
    let mut credentials = Credentials::new(
        id,
        Name::parse(&payload.first_name)?,
        Name::parse(&payload.last_name)?,
    )?;
    credentials.set_email(&payload.email)?;
    credentials.set_title(&payload.title)?;
    credentials.set_department(&payload.department)?;
    credentials.set_location(&payload.location)?;
    credentials.set_role(&payload.role)?;
    credentials.set_admin(payload.is_admin);
    Ok(credentials)
}

/// List every credentials record.
#[instrument(skip_all)]
pub async fn list(
    context: Extension<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?;
    let records = context.store.list_all(&token).await?;
    Ok((StatusCode::OK, Json(records)))
}

/// Create a new credentials record.
#[instrument(skip_all)]
pub async fn insert(
    context: Extension<Arc<AppContext>>,
    headers: HeaderMap,
    payload: Option<Json<UserPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?;

    let Some(Json(payload)) = payload else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing payload" })),
        )
            .into_response());
    };

    let credentials = credentials_from_payload(0, &payload)?;
    let password = payload
        .password
        .as_deref()
        .ok_or_else(|| Error::Validation("password is required".to_string()))?;

    match context.store.insert(&token, &credentials, password).await? {
        InsertOutcome::Created(id) => {
            Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
        }
        InsertOutcome::Duplicate => Ok((
            StatusCode::CONFLICT,
            Json(json!({ "error": "a record with this email already exists" })),
        )
            .into_response()),
    }
}

/// Update profile fields, email, role, and admin flag for an existing record.
#[instrument(skip_all)]
pub async fn update(
    context: Extension<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    payload: Option<Json<UserPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?;

    let Some(Json(payload)) = payload else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing payload" })),
        )
            .into_response());
    };

    let credentials = credentials_from_payload(id, &payload)?;

    match context.store.update(&token, &credentials).await? {
        MutationOutcome::Applied => Ok(StatusCode::NO_CONTENT.into_response()),
        MutationOutcome::NotFound => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no such credentials record" })),
        )
            .into_response()),
    }
}

/// Delete a credentials record.
#[instrument(skip_all)]
pub async fn remove(
    context: Extension<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?;

    match context.store.delete(&token, id).await? {
        MutationOutcome::Applied => Ok(StatusCode::NO_CONTENT.into_response()),
        MutationOutcome::NotFound => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no such credentials record" })),
        )
            .into_response()),
    }
}
