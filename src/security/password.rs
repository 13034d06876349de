//! One-way password hashing with Argon2id.
//!
//! Hashing is strict: empty plaintext is a validation error. Verification is
//! permissive about stored data: a digest that does not parse yields `false`
//! instead of an error, so corrupted rows cannot crash an authentication
//! attempt or leak anything through an exception path.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use tracing::{debug, error};

use crate::error::{Error, Result};

// OWASP minimum Argon2id params: m=19456 KiB, t=2 iterations, p=1 thread
const M_COST: u32 = 19_456;
const T_COST: u32 = 2;
const P_COST: u32 = 1;

pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        let params = Params::new(M_COST, T_COST, P_COST, None).expect("valid argon2 params");
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl PasswordHasher {
    /// Hash a plaintext secret with a fresh random salt.
    ///
    /// Hashing the same plaintext twice yields different digests; both verify.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty plaintext or if hashing fails.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            error!("attempt to hash an empty password");
            return Err(Error::validation("password must not be empty"));
        }

        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|err| Error::Validation(format!("failed to hash password: {err}")))
    }

    /// Verify a plaintext secret against a stored digest.
    ///
    /// # Errors
    ///
    /// Returns a validation error when plaintext or digest is empty. A digest
    /// that is present but malformed yields `Ok(false)`.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool> {
        if plaintext.is_empty() {
            error!("attempt to verify an empty password");
            return Err(Error::validation("password must not be empty"));
        }
        if digest.is_empty() {
            error!("attempt to verify against an empty digest");
            return Err(Error::validation("password digest must not be empty"));
        }

        match PasswordHash::new(digest) {
            Ok(parsed) => Ok(self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()),
            Err(err) => {
                error!("invalid password digest format: {err}");
                debug!("treating unparseable digest as a failed verification");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() -> anyhow::Result<()> {
        let hasher = PasswordHasher::default();
        let first = hasher.hash("correct horse battery staple")?;
        let second = hasher.hash("correct horse battery staple")?;

        assert_ne!(first, second);
        assert!(hasher.verify("correct horse battery staple", &first)?);
        assert!(hasher.verify("correct horse battery staple", &second)?);
        Ok(())
    }

    #[test]
    fn wrong_password_fails_verification() -> anyhow::Result<()> {
        let hasher = PasswordHasher::default();
        let digest = hasher.hash("correct horse battery staple")?;
        assert!(!hasher.verify("incorrect horse", &digest)?);
        Ok(())
    }

    #[test]
    fn empty_plaintext_is_rejected() {
        let hasher = PasswordHasher::default();
        assert!(matches!(hasher.hash(""), Err(Error::Validation(_))));
        assert!(matches!(
            hasher.verify("", "$argon2id$whatever"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            hasher.verify("secret", ""),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn malformed_digest_returns_false_not_error() -> anyhow::Result<()> {
        let hasher = PasswordHasher::default();
        assert!(!hasher.verify("secret", "not-a-valid-hash")?);
        Ok(())
    }
}
