//! # Turnstile (Single Sign-On credential service)
//!
//! `turnstile` is the credential authentication and authorization core of a
//! single-sign-on deployment. It validates bearer tokens, resolves them
//! against a remote authentication service, persists credential records, and
//! mints signed session tokens.
//!
//! ## Authentication
//!
//! Two paths lead to a session token:
//!
//! - **Token login:** an inbound bearer token is shape-checked (sanitized,
//!   250–400 characters) and exchanged for an identity via a single POST to
//!   the authentication service; HTTP 201 is the only success signal. Profile
//!   data is then overlaid from the local store, keyed by durable identifier.
//! - **Password login:** email plus plaintext password, verified against an
//!   Argon2id digest with a one-time temporary-password fallback for the
//!   forgot-password flow. A matched temp password is cleared atomically so
//!   it can never be replayed.
//!
//! ## Authorization
//!
//! Admin-restricted mutations re-read the current admin flag from the store
//! on every call. Privileges revoked in the store take effect on the next
//! request, not on token renewal, so stale token claims never grant access.
//!
//! ## Sessions
//!
//! Session tokens are signed, stateless, and expire 60 minutes after
//! issuance; the signing key is provisioned from the environment, never from
//! source. There is no server-side revocation list: the short lifetime is the
//! revocation mechanism.

pub mod auth;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod security;
pub mod store;
pub mod turnstile;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
