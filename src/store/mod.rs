//! Persistence-backed credential store.
//!
//! CRUD plus the two authentication paths: login by password (with one-time
//! temp-password fallback) and login by remotely resolved token. Every
//! admin-restricted mutation re-reads the current admin flag from the store,
//! keyed by durable identifier — never from claims baked into a token.
//!
//! All queries are parameterized; user-controlled strings never reach query
//! text. Persistence failures propagate as [`Error::Persistence`] so callers
//! can tell "backend unavailable" apart from "not found".

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, info, Instrument};

use crate::auth::{Authenticator, BearerToken};
use crate::credentials::{parse_password, Credentials, LoginCredentials, Name};
use crate::error::{Error, Result};
use crate::security::PasswordHasher;

const TEMP_PASSWORD_CHARS: usize = 24;

const PROFILE_SELECT: &str = r"
    SELECT credentials.id, credentials.email, credentials.password,
           credentials.temp_password, credentials.is_admin,
           credentials.first_name, credentials.last_name,
           titles.title, departments.department, locations.location,
           user_roles.user_role
    FROM credentials
    JOIN titles ON credentials.title_id = titles.id
    JOIN departments ON credentials.department_id = departments.id
    JOIN locations ON credentials.location_id = locations.id
    JOIN user_roles ON credentials.user_role_id = user_roles.id
";

/// Outcome when inserting a new credentials record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(i32),
    Duplicate,
}

/// Outcome for identifier-keyed mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    NotFound,
}

pub struct CredentialsStore {
    pool: PgPool,
    authenticator: Authenticator,
    hasher: PasswordHasher,
}

impl CredentialsStore {
    #[must_use]
    pub fn new(pool: PgPool, authenticator: Authenticator) -> Self {
        Self {
            pool,
            authenticator,
            hasher: PasswordHasher::default(),
        }
    }

    /// Login with email and plaintext password.
    ///
    /// Falls back to the temp password when the stored password does not
    /// match; a matching temp password is cleared atomically so it cannot be
    /// used twice. `Ok(None)` deliberately does not distinguish a wrong
    /// password from an unknown email — only the logs do.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the store is unavailable.
    pub async fn login(&self, login: &LoginCredentials) -> Result<Option<Credentials>> {
        let query = format!("{PROFILE_SELECT} WHERE credentials.email = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(login.email())
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        let Some(row) = row else {
            debug!("login attempt for unknown email");
            return Ok(None);
        };

        let digest: String = row.get("password");
        if self.hasher.verify(login.password(), &digest)? {
            info!("password login succeeded");
            return Ok(Some(credentials_from_row(&row)?));
        }

        if let Some(temp_digest) = row.get::<Option<String>, _>("temp_password") {
            if self.hasher.verify(login.password(), &temp_digest)? {
                return self.consume_temp_password(&row, &temp_digest).await;
            }
        }

        debug!("password mismatch");
        Ok(None)
    }

    /// Clear a matched temp password so it is single-use.
    ///
    /// The digest is part of the predicate: if a concurrent login consumed it
    /// first, zero rows match and this attempt fails.
    async fn consume_temp_password(
        &self,
        row: &PgRow,
        temp_digest: &str,
    ) -> Result<Option<Credentials>> {
        let query = "UPDATE credentials SET temp_password = NULL WHERE id = $1 AND temp_password = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let cleared = sqlx::query(query)
            .bind(row.get::<i32, _>("id"))
            .bind(temp_digest)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        if cleared.rows_affected() == 1 {
            info!("temporary password login succeeded; temp password cleared");
            return Ok(Some(credentials_from_row(row)?));
        }

        debug!("temporary password already consumed");
        Ok(None)
    }

    /// Canonical profile lookup, keyed by durable identifier.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the store is unavailable.
    pub async fn profile_by_id(&self, id: i32) -> Result<Option<Credentials>> {
        let query = format!("{PROFILE_SELECT} WHERE credentials.id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        row.map(|row| credentials_from_row(&row)).transpose()
    }

    /// Resolve a token remotely, then overlay the current stored profile.
    ///
    /// The store — not the token claims — is authoritative for email, admin
    /// flag, and profile fields.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the token cannot be resolved, or
    /// a persistence error when the store is unavailable.
    pub async fn login_by_token(&self, token: &BearerToken) -> Result<Option<Credentials>> {
        let remote = self.authenticator.authenticate(token).await?;
        self.profile_by_id(remote.id()).await
    }

    /// Always-fresh admin check: resolve the token, then read the current
    /// admin flag by identifier. A revoked admin loses privileges on the
    /// next call, not on token renewal.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the token cannot be resolved, or
    /// a persistence error when the store is unavailable.
    pub async fn verify_is_admin(&self, token: &BearerToken) -> Result<bool> {
        let remote = self.authenticator.authenticate(token).await?;

        let query = "SELECT is_admin FROM credentials WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(remote.id())
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(row.is_some_and(|row| row.get::<bool, _>("is_admin")))
    }

    async fn require_admin(&self, token: &BearerToken) -> Result<()> {
        if self.verify_is_admin(token).await? {
            Ok(())
        } else {
            Err(Error::Authorization(
                "admin privileges required".to_string(),
            ))
        }
    }

    /// Admin-gated insert of a new credentials record.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when the caller is not an admin, a
    /// validation error for a missing email or out-of-policy password, or a
    /// persistence error when the store is unavailable.
    pub async fn insert(
        &self,
        admin: &BearerToken,
        credentials: &Credentials,
        password: &str,
    ) -> Result<InsertOutcome> {
        self.require_admin(admin).await?;

        let email = credentials
            .email()
            .ok_or_else(|| Error::validation("email is required"))?;
        let password = parse_password(password)?;
        let digest = self.hasher.hash(&password)?;

        let query = r"
            INSERT INTO credentials
                (email, password, is_admin, first_name, last_name,
                 title_id, department_id, location_id, user_role_id)
            VALUES ($1, $2, $3, $4, $5,
                    (SELECT id FROM titles WHERE title = $6),
                    (SELECT id FROM departments WHERE department = $7),
                    (SELECT id FROM locations WHERE location = $8),
                    (SELECT id FROM user_roles WHERE user_role = $9))
            RETURNING id
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(&digest)
            .bind(credentials.is_admin())
            .bind(credentials.first_name())
            .bind(credentials.last_name())
            .bind(credentials.title())
            .bind(credentials.department())
            .bind(credentials.location())
            .bind(credentials.role())
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => {
                info!("credentials record created");
                Ok(InsertOutcome::Created(row.get("id")))
            }
            Err(err) if is_unique_violation(&err) => {
                debug!("credentials record already exists");
                Ok(InsertOutcome::Duplicate)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Admin-gated update of profile fields, email, role, and admin flag.
    ///
    /// Password changes go through [`CredentialsStore::update_password`].
    ///
    /// # Errors
    ///
    /// Returns an authorization error when the caller is not an admin, a
    /// validation error for a missing email, or a persistence error when the
    /// store is unavailable.
    pub async fn update(
        &self,
        admin: &BearerToken,
        credentials: &Credentials,
    ) -> Result<MutationOutcome> {
        self.require_admin(admin).await?;

        let email = credentials
            .email()
            .ok_or_else(|| Error::validation("email is required"))?;

        let query = r"
            UPDATE credentials
            SET email = $1, is_admin = $2, first_name = $3, last_name = $4,
                title_id = (SELECT id FROM titles WHERE title = $5),
                department_id = (SELECT id FROM departments WHERE department = $6),
                location_id = (SELECT id FROM locations WHERE location = $7),
                user_role_id = (SELECT id FROM user_roles WHERE user_role = $8)
            WHERE id = $9
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(email)
            .bind(credentials.is_admin())
            .bind(credentials.first_name())
            .bind(credentials.last_name())
            .bind(credentials.title())
            .bind(credentials.department())
            .bind(credentials.location())
            .bind(credentials.role())
            .bind(credentials.id())
            .execute(&self.pool)
            .instrument(span)
            .await?;

        if result.rows_affected() == 1 {
            info!("credentials record updated");
            Ok(MutationOutcome::Applied)
        } else {
            Ok(MutationOutcome::NotFound)
        }
    }

    /// Admin-gated hard delete.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when the caller is not an admin, or a
    /// persistence error when the store is unavailable.
    pub async fn delete(&self, admin: &BearerToken, id: i32) -> Result<MutationOutcome> {
        self.require_admin(admin).await?;

        let query = "DELETE FROM credentials WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        if result.rows_affected() == 1 {
            info!("credentials record deleted");
            Ok(MutationOutcome::Applied)
        } else {
            Ok(MutationOutcome::NotFound)
        }
    }

    /// Admin-gated list of every credentials record.
    ///
    /// # Errors
    ///
    /// Returns an authorization error when the caller is not an admin, or a
    /// persistence error when the store is unavailable.
    pub async fn list_all(&self, admin: &BearerToken) -> Result<Vec<Credentials>> {
        self.require_admin(admin).await?;

        let query = format!("{PROFILE_SELECT} ORDER BY credentials.id");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        rows.iter().map(credentials_from_row).collect()
    }

    /// Self-service password change for an already-authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an out-of-policy password, or a
    /// persistence error when the store is unavailable.
    pub async fn update_password(&self, id: i32, password: &str) -> Result<MutationOutcome> {
        let password = parse_password(password)?;
        let digest = self.hasher.hash(&password)?;

        let query = "UPDATE credentials SET password = $1 WHERE id = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(&digest)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        if result.rows_affected() == 1 {
            info!("password updated");
            Ok(MutationOutcome::Applied)
        } else {
            Ok(MutationOutcome::NotFound)
        }
    }

    /// Mint a single-use temporary password for the forgot-password flow.
    ///
    /// Only the digest is stored; the plaintext is returned once for the
    /// delivery layer and `Ok(None)` for an unknown email lets callers keep
    /// their response indistinguishable from success.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the store is unavailable.
    pub async fn issue_temp_password(&self, email: &str) -> Result<Option<String>> {
        let query = "SELECT id FROM credentials WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        let Some(row) = row else {
            debug!("temporary password requested for unknown email");
            return Ok(None);
        };

        let plaintext = generate_temp_password();
        let digest = self.hasher.hash(&plaintext)?;

        let query = "UPDATE credentials SET temp_password = $1 WHERE id = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(&digest)
            .bind(row.get::<i32, _>("id"))
            .execute(&self.pool)
            .instrument(span)
            .await?;

        info!("temporary password issued");
        Ok(Some(plaintext))
    }
}

fn credentials_from_row(row: &PgRow) -> Result<Credentials> {
    let mut credentials = Credentials::new(
        row.get("id"),
        Name::parse(&row.get::<String, _>("first_name"))?,
        Name::parse(&row.get::<String, _>("last_name"))?,
    )?;
    credentials.set_email(&row.get::<String, _>("email"))?;
    credentials.set_title(&row.get::<String, _>("title"))?;
    credentials.set_department(&row.get::<String, _>("department"))?;
    credentials.set_location(&row.get::<String, _>("location"))?;
    credentials.set_role(&row.get::<String, _>("user_role"))?;
    credentials.set_admin(row.get("is_admin"));
    Ok(credentials)
}

fn generate_temp_password() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_CHARS)
        .map(char::from)
        .collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_passwords_are_fresh_and_within_policy() {
        let first = generate_temp_password();
        let second = generate_temp_password();

        assert_eq!(first.chars().count(), TEMP_PASSWORD_CHARS);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
        assert!(parse_password(&first).is_ok());
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolClosed));
    }

    #[test]
    fn outcome_debug_names() {
        assert_eq!(format!("{:?}", InsertOutcome::Duplicate), "Duplicate");
        assert_eq!(format!("{:?}", MutationOutcome::NotFound), "NotFound");
    }
}
