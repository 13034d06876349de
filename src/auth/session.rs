//! Signed session token issuance.
//!
//! Session tokens are stateless and never persisted server-side; the fixed
//! 60-minute lifetime is the sole revocation mechanism. The signing key is an
//! operational secret provisioned outside source control.

use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::credentials::Credentials;
use crate::error::{Error, Result};

const SESSION_TTL_SECONDS: u64 = 60 * 60;
const ISSUER: &str = "turnstile";

/// Claims embedded in an issued session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub department: String,
    pub title: String,
}

/// Mints signed, time-bounded session tokens from a credentials record.
#[derive(Clone)]
pub struct SessionTokenizer {
    signing_key: SecretString,
}

impl SessionTokenizer {
    #[must_use]
    pub fn new(signing_key: SecretString) -> Self {
        Self { signing_key }
    }

    /// Produce a signed session token carrying a claims subset.
    ///
    /// The subject is the concatenation of first and last name; expiry is
    /// issuance time plus 60 minutes.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when signing fails.
    pub fn tokenize(&self, credentials: &Credentials) -> Result<String> {
        debug!("issuing session token");

        let now = get_current_timestamp();
        let claims = SessionClaims {
            iss: ISSUER.to_string(),
            sub: format!("{} {}", credentials.first_name(), credentials.last_name()),
            iat: now,
            exp: now + SESSION_TTL_SECONDS,
            id: credentials.id(),
            first_name: credentials.first_name().to_string(),
            last_name: credentials.last_name().to_string(),
            location: credentials.location().to_string(),
            department: credentials.department().to_string(),
            title: credentials.title().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.signing_key.expose_secret().as_bytes()),
        )
        .map_err(|err| {
            error!("failed to sign session token: {err}");
            Error::authentication("failed to sign session token")
        })
    }
}
