//! Remote token authentication.
//!
//! A validated [`BearerToken`] is exchanged for a [`Credentials`] record by a
//! single POST to the configured authentication service. HTTP 201 is the only
//! success signal; this component performs no retries and never touches local
//! persistence — the store is consulted afterwards for authorization and
//! profile data.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

use crate::auth::token::BearerToken;
use crate::credentials::{Credentials, Name};
use crate::error::{Error, Result};

// An unresponsive authentication service must not block callers forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the remote authentication service.
#[derive(Debug, Clone)]
pub struct Authenticator {
    endpoint: Url,
    client: Client,
}

/// Shape of the credentials payload returned by the authentication service.
#[derive(Debug, Deserialize)]
struct WireCredentials {
    id: i32,
    #[serde(rename = "fName")]
    first_name: String,
    #[serde(rename = "lName")]
    last_name: String,
    title: String,
    dept: String,
    loc: String,
}

impl Authenticator {
    /// Build an authenticator for the given endpoint URL.
    ///
    /// The URL is validated here so a malformed endpoint fails at
    /// construction rather than on the first authentication call.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the endpoint URL does not parse
    /// or the HTTP client cannot be built.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|err| {
            error!("cannot construct authentication endpoint URL: {err}");
            Error::authentication("cannot construct authentication endpoint URL")
        })?;

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| {
                error!("error creating authentication client: {err}");
                Error::authentication("error creating authentication client")
            })?;

        Ok(Self { endpoint, client })
    }

    /// Exchange a token for the credentials it belongs to.
    ///
    /// # Errors
    ///
    /// Returns an authentication error for transport failures, any non-201
    /// response, a null payload, or a payload that does not parse into a
    /// credentials record.
    pub async fn authenticate(&self, token: &BearerToken) -> Result<Credentials> {
        info!("authenticating token");

        let mut map = HashMap::new();
        map.insert("token", token.as_str());

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&map)
            .send()
            .await
            .map_err(|err| {
                error!("error connecting to authentication service: {err}");
                Error::authentication("error connecting to authentication service")
            })?;

        let status = response.status();
        if status != StatusCode::CREATED {
            error!("received response code {status} from authentication service");
            return Err(Error::Authentication(format!(
                "received response code {status} from authentication service"
            )));
        }

        let payload: serde_json::Value = response.json().await.map_err(|err| {
            error!("unreadable response from authentication service: {err}");
            Error::authentication("unreadable response from authentication service")
        })?;

        if payload.is_null() {
            error!("authentication service returned no credentials");
            return Err(Error::authentication(
                "authentication service returned no credentials",
            ));
        }

        let wire: WireCredentials = serde_json::from_value(payload).map_err(|err| {
            error!("could not parse credentials from authentication service: {err}");
            Error::authentication("could not parse credentials from authentication service")
        })?;

        let credentials = Credentials::try_from(wire)?;
        info!("successfully received credentials from authentication service");
        Ok(credentials)
    }
}

impl TryFrom<WireCredentials> for Credentials {
    type Error = Error;

    fn try_from(wire: WireCredentials) -> Result<Self> {
        let build = || -> Result<Credentials> {
            let mut credentials = Credentials::new(
                wire.id,
                Name::parse(&wire.first_name)?,
                Name::parse(&wire.last_name)?,
            )?;
            credentials.set_title(&wire.title)?;
            credentials.set_department(&wire.dept)?;
            credentials.set_location(&wire.loc)?;
            Ok(credentials)
        };

        // A payload that fails value validation is a garbled response, not a
        // caller input problem.
        build().map_err(|err| {
            error!("invalid credentials payload from authentication service: {err}");
            Error::Authentication(format!("invalid credentials payload: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
    use serde_json::json;
    use std::net::SocketAddr;

    fn test_token() -> BearerToken {
        BearerToken::parse(&"t".repeat(300)).unwrap()
    }

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .expect("serve test router");
        });
        addr
    }

    #[test]
    fn malformed_endpoint_fails_at_construction() {
        let err = Authenticator::new("not a url").unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn created_response_yields_credentials() {
        let router = Router::new().route(
            "/verify",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert!(body["token"].is_string());
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "id": 42,
                        "fName": "Jane",
                        "lName": "Doe",
                        "title": "Developer",
                        "dept": "Engineering",
                        "loc": "HQ"
                    })),
                )
            }),
        );
        let addr = serve(router).await;

        let authenticator = Authenticator::new(&format!("http://{addr}/verify")).unwrap();
        let credentials = authenticator.authenticate(&test_token()).await.unwrap();

        assert_eq!(credentials.id(), 42);
        assert_eq!(credentials.first_name(), "Jane");
        assert_eq!(credentials.department(), "Engineering");
        assert!(!credentials.is_admin());
    }

    #[tokio::test]
    async fn non_created_status_is_an_authentication_error() {
        let router = Router::new().route(
            "/verify",
            post(|| async { StatusCode::FORBIDDEN.into_response() }),
        );
        let addr = serve(router).await;

        let authenticator = Authenticator::new(&format!("http://{addr}/verify")).unwrap();
        let err = authenticator.authenticate(&test_token()).await.unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn null_payload_is_an_authentication_error() {
        let router = Router::new().route(
            "/verify",
            post(|| async { (StatusCode::CREATED, Json(serde_json::Value::Null)) }),
        );
        let addr = serve(router).await;

        let authenticator = Authenticator::new(&format!("http://{addr}/verify")).unwrap();
        let err = authenticator.authenticate(&test_token()).await.unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
        assert!(err.to_string().contains("no credentials"));
    }

    #[tokio::test]
    async fn garbled_payload_is_an_authentication_error() {
        let router = Router::new().route(
            "/verify",
            post(|| async { (StatusCode::CREATED, Json(json!({"unexpected": true}))) }),
        );
        let addr = serve(router).await;

        let authenticator = Authenticator::new(&format!("http://{addr}/verify")).unwrap();
        let err = authenticator.authenticate(&test_token()).await.unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_an_authentication_error() {
        // Bind-then-drop leaves a port with no listener.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let authenticator = Authenticator::new(&format!("http://{addr}/verify")).unwrap();
        let err = authenticator.authenticate(&test_token()).await.unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
    }
}
