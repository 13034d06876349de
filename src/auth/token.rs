//! Inbound bearer token shape validation.
//!
//! The length band is a cheap check that rejects truncated or padded tokens
//! before a network round-trip is spent resolving them.

use std::fmt;
use tracing::error;

use crate::error::{Error, Result};
use crate::security::Sanitizer;

const MIN_TOKEN_CHARS: usize = 250;
const MAX_TOKEN_CHARS: usize = 400;

/// An opaque bearer credential accepted from a caller.
///
/// Construction sanitizes the raw string and enforces the 250..=400 length
/// band; an instance always holds an acceptable token.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// # Errors
    ///
    /// Returns a validation error naming the violated bound when the
    /// sanitized token is shorter than 250 or longer than 400 characters.
    pub fn parse(raw: &str) -> Result<Self> {
        let sanitized = Sanitizer::default().sanitize_input(raw);
        let length = sanitized.chars().count();

        if length < MIN_TOKEN_CHARS {
            error!("bearer token received is too short");
            return Err(Error::validation("bearer token is too short"));
        }
        if length > MAX_TOKEN_CHARS {
            error!("bearer token received is too long");
            return Err(Error::validation("bearer token is too long"));
        }

        Ok(Self(sanitized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of debug output.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(len={})", self.0.chars().count())
    }
}
