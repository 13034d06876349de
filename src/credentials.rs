//! Credential value objects.
//!
//! All free-text fields are sanitized on the way in and capped at 64
//! characters; once constructed, a value object only holds accepted data.
//! Plaintext passwords never live on [`Credentials`]; they are handled as
//! transient arguments and hashed before storage.

use regex::Regex;
use serde::Serialize;
use tracing::error;

use crate::error::{Error, Result};
use crate::security::Sanitizer;

const MAX_FIELD_CHARS: usize = 64;
const MIN_PASSWORD_CHARS: usize = 12;

/// A validated first or last name: sanitized, non-empty, at most 64 chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(String);

impl Name {
    /// # Errors
    ///
    /// Returns a validation error when the sanitized name is empty or longer
    /// than 64 characters.
    pub fn parse(input: &str) -> Result<Self> {
        let sanitized = Sanitizer::default().sanitize_input(input);

        if sanitized.is_empty() {
            error!("name must not be empty");
            return Err(Error::validation("name must not be empty"));
        }
        if sanitized.chars().count() > MAX_FIELD_CHARS {
            error!("name must not exceed 64 characters");
            return Err(Error::validation("name must not exceed 64 characters"));
        }

        Ok(Self(sanitized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for Name {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A persisted (or remotely resolved) user record.
///
/// The identifier is non-negative and stable; email and admin flag are only
/// present once the record has been overlaid from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    first_name: Name,
    last_name: Name,
    title: String,
    department: String,
    location: String,
    role: String,
    is_admin: bool,
}

impl Credentials {
    /// # Errors
    ///
    /// Returns a validation error when the identifier is negative.
    pub fn new(id: i32, first_name: Name, last_name: Name) -> Result<Self> {
        if id < 0 {
            error!("id must be non-negative");
            return Err(Error::validation("id must be non-negative"));
        }

        Ok(Self {
            id,
            email: None,
            first_name,
            last_name,
            title: String::new(),
            department: String::new(),
            location: String::new(),
            role: String::new(),
            is_admin: false,
        })
    }

    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    #[must_use]
    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn department(&self) -> &str {
        &self.department
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// # Errors
    ///
    /// Returns a validation error for invalid email syntax or length.
    pub fn set_email(&mut self, email: &str) -> Result<()> {
        self.email = Some(parse_email(email)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation error when the sanitized title exceeds 64 chars.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.title = sanitized_field("title", title)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation error when the sanitized value exceeds 64 chars.
    pub fn set_department(&mut self, department: &str) -> Result<()> {
        self.department = sanitized_field("department", department)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation error when the sanitized value exceeds 64 chars.
    pub fn set_location(&mut self, location: &str) -> Result<()> {
        self.location = sanitized_field("location", location)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation error when the sanitized value exceeds 64 chars.
    pub fn set_role(&mut self, role: &str) -> Result<()> {
        self.role = sanitized_field("role", role)?;
        Ok(())
    }

    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }
}

/// Email plus plaintext password as submitted to the login endpoint.
///
/// Both fields are validated at construction; an instance always holds a
/// syntactically acceptable pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: String,
}

impl LoginCredentials {
    /// # Errors
    ///
    /// Returns a validation error for bad email syntax or an out-of-policy
    /// password.
    pub fn new(email: &str, password: &str) -> Result<Self> {
        Ok(Self {
            email: parse_email(email)?,
            password: parse_password(password)?,
        })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

fn sanitized_field(field: &str, value: &str) -> Result<String> {
    let sanitized = Sanitizer::default().sanitize_input(value);

    if sanitized.chars().count() > MAX_FIELD_CHARS {
        error!("{field} must not exceed 64 characters");
        return Err(Error::Validation(format!(
            "{field} must not exceed 64 characters"
        )));
    }

    Ok(sanitized)
}

pub(crate) fn parse_email(email: &str) -> Result<String> {
    let sanitized = Sanitizer::default().sanitize_input(email);

    if sanitized.is_empty() {
        error!("email must not be empty");
        return Err(Error::validation("email must not be empty"));
    }
    if sanitized.chars().count() > MAX_FIELD_CHARS {
        error!("email must not exceed 64 characters");
        return Err(Error::validation("email must not exceed 64 characters"));
    }
    if !valid_email(&sanitized) {
        error!("invalid email syntax");
        return Err(Error::validation("invalid email"));
    }

    Ok(sanitized)
}

pub(crate) fn parse_password(password: &str) -> Result<String> {
    let sanitized = Sanitizer::default().sanitize_input(password);

    if sanitized.is_empty() {
        error!("password must not be empty");
        return Err(Error::validation("password must not be empty"));
    }
    if sanitized.chars().count() > MAX_FIELD_CHARS {
        error!("password must not exceed 64 characters");
        return Err(Error::validation("password must not exceed 64 characters"));
    }
    if sanitized.chars().count() < MIN_PASSWORD_CHARS {
        error!("password must be at least 12 characters");
        return Err(Error::validation("password must be at least 12 characters"));
    }

    Ok(sanitized)
}

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}
