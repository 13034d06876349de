pub mod admin;

pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

pub mod password;
pub use self::password::{change_password, forgot_password};

pub mod profile;
pub use self::profile::profile;

// common plumbing for the handlers
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::auth::BearerToken;
use crate::error::Error;

/// Error wrapper mapping the core taxonomy onto HTTP status codes.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::Authentication(message) => (StatusCode::UNAUTHORIZED, message.clone()),
            Error::Authorization(message) => (StatusCode::FORBIDDEN, message.clone()),
            Error::Persistence(err) => {
                // The caller learns the backend is unavailable, not why.
                error!("persistence failure: {err}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "backend unavailable".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Extract and validate the bearer token from the Authorization header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<BearerToken, Error> {
    let raw = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| Error::validation("missing bearer token"))?;

    BearerToken::parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_the_header() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn bearer_token_requires_the_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn bearer_token_parses_a_well_formed_header() {
        let raw = "a".repeat(300);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {raw}")).unwrap(),
        );
        let token = bearer_token(&headers).unwrap();
        assert_eq!(token.as_str(), raw);
    }
}
