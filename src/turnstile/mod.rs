//! HTTP server wiring for the credential core.
//!
//! The request layer is thin plumbing: handlers validate input at the
//! boundary, call into the core, and map the error taxonomy to status codes.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request},
    routing::{get, post, put},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

use crate::auth::{Authenticator, SessionTokenizer};
use crate::cli::globals::GlobalArgs;
use crate::store::CredentialsStore;

pub mod handlers;
pub mod notify;

/// Shared state handed to every handler.
pub struct AppContext {
    pub store: CredentialsStore,
    pub tokenizer: SessionTokenizer,
    pub notifier: Arc<dyn notify::TempPasswordNotifier>,
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, globals: &GlobalArgs) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let authenticator = Authenticator::new(&globals.auth_url)?;
    let store = CredentialsStore::new(pool, authenticator);
    let tokenizer = SessionTokenizer::new(globals.signing_key.clone());
    let context = Arc::new(AppContext {
        store,
        tokenizer,
        notifier: Arc::new(notify::LogNotifier),
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any);

    let app = router().layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors)
            .layer(Extension(context)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Build the API router.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::login))
        .route("/profile", post(handlers::profile))
        .route("/password", put(handlers::change_password))
        .route("/forgot-password", put(handlers::forgot_password))
        .route(
            "/admin/users",
            get(handlers::admin::list).post(handlers::admin::insert),
        )
        .route(
            "/admin/users/:id",
            put(handlers::admin::update).delete(handlers::admin::remove),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
