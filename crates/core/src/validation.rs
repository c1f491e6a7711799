//! Field-level validation for form-shaped endpoints.
//!
//! Rules are split from the handlers so they can be unit-tested without a
//! database. Uniqueness checks (username/email collisions) need storage and
//! live in the API layer; the handlers merge their results into the same
//! [`FieldErrors`] set so a submission reports every problem at once.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Maximum accepted upload size for application and design images.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// MIME types accepted for application and design images.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/bmp"];

/// Accumulated validation errors keyed by field name.
///
/// Ordered (BTreeMap) so error responses are stable for clients and tests.
/// An empty set means the submission is valid; any entry means nothing may
/// be persisted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Consume the set, returning `Err(self)` when any error was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

fn cyrillic_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The studio serves a Russian-speaking clientele; personal names must be
    // Cyrillic letters, whitespace, or hyphens.
    RE.get_or_init(|| Regex::new(r"^[А-Яа-яёЁ\s\-]+$").expect("valid regex"))
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9\-]+$").expect("valid regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Deliberately loose: something@domain.tld with no whitespace. Catching
    // typos is the goal; full address-spec parsing is not.
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"))
}

/// Validate a personal name (first or last): non-empty after trimming and
/// Cyrillic-only. Returns the trimmed value.
pub fn validate_personal_name(value: &str) -> Result<String, &'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !cyrillic_name_re().is_match(trimmed) {
        return Err("Only Cyrillic letters, spaces and hyphens are allowed");
    }
    Ok(trimmed.to_string())
}

/// Validate the username character set (uniqueness is checked separately
/// against storage).
pub fn validate_username_format(value: &str) -> Result<(), &'static str> {
    if value.is_empty() || !username_re().is_match(value) {
        return Err("Only Latin letters, digits and hyphens are allowed");
    }
    Ok(())
}

/// Validate an email address: non-empty after trimming and plausibly
/// formed. Returns the trimmed value. Uniqueness is checked separately
/// against storage.
pub fn validate_email(value: &str) -> Result<String, &'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Email is required");
    }
    if !email_re().is_match(trimmed) {
        return Err("Enter a valid email address");
    }
    Ok(trimmed.to_string())
}

/// Validate a password at registration: must not be empty after trimming.
pub fn validate_password(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("Password is required");
    }
    Ok(())
}

/// Validate an uploaded image's declared MIME type and size.
///
/// Returns a message naming the allowed formats or the size limit.
pub fn validate_image(content_type: &str, size_bytes: usize) -> Result<(), String> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err("Allowed formats: jpg, jpeg, png, bmp".to_string());
    }
    if size_bytes > MAX_IMAGE_BYTES {
        return Err("Maximum image size is 2 MiB".to_string());
    }
    Ok(())
}

/// Validate the staff comment attached when accepting an application:
/// non-empty after trimming. Returns the trimmed value.
pub fn validate_admin_comment(value: &str) -> Result<String, &'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("A comment is required");
    }
    Ok(trimmed.to_string())
}
