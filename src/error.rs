//! Error taxonomy shared by the credential core.
//!
//! Callers map each variant to a different failure mode: malformed input,
//! unresolvable identity, missing privilege, or an unavailable backend.
//! A database outage must stay distinguishable from "no such user".

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-bounds input, raised at the boundary.
    #[error("validation error: {0}")]
    Validation(String),

    /// The remote authentication service could not resolve an identity.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// The caller lacks the privilege required for the operation.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// The persistence layer failed; not the same as an empty result.
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_by_kind() {
        assert_eq!(
            Error::validation("name must not be empty").to_string(),
            "validation error: name must not be empty"
        );
        assert_eq!(
            Error::authentication("no credentials").to_string(),
            "authentication error: no credentials"
        );
        assert_eq!(
            Error::Authorization("admin privileges required".to_string()).to_string(),
            "authorization error: admin privileges required"
        );
    }

    #[test]
    fn persistence_wraps_sqlx_errors() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::Persistence(_)));
        assert!(err.to_string().starts_with("persistence error:"));
    }
}
