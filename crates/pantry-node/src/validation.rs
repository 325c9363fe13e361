//! Input validation for API endpoints.
//!
//! Request payloads are shape-checked here before any store call, with
//! field-level detail in a `422` response. The stores apply the full
//! rules (reserved names, uniqueness) again on write; boundary checks
//! exist so a bad form submit fails with named fields rather than a
//! bare error string.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

/// Usernames: lowercase alphanumeric with single hyphens between runs.
pub static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9](?:-?[a-z0-9])*$").expect("Invalid regex"));

/// Cookbook and tool names: lowercase alphanumeric, hyphens, underscores.
pub static RESOURCE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("Invalid regex"));

/// Maximum lengths for various fields.
pub const MAX_USERNAME_LENGTH: usize = 39;
pub const MAX_RESOURCE_NAME_LENGTH: usize = 100;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Validation error response.
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    /// Error type.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Field-level error details.
    pub details: Vec<FieldError>,
}

/// Field-level validation error.
#[derive(Debug, Serialize)]
pub struct FieldError {
    /// Field name.
    pub field: String,
    /// Error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(self)).into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(errors: ValidationErrors) -> Self {
        let details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    code: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation failed for field '{}'", field)),
                })
            })
            .collect();

        ValidationErrorResponse {
            error: "validation_error".to_string(),
            message: "Validation failed".to_string(),
            details,
        }
    }
}

/// Validate a username.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        let mut err = ValidationError::new("length");
        err.message = Some("Username cannot be empty".into());
        return Err(err);
    }

    if username.len() > MAX_USERNAME_LENGTH {
        let mut err = ValidationError::new("length");
        err.message = Some(
            format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LENGTH
            )
            .into(),
        );
        return Err(err);
    }

    if !USERNAME_REGEX.is_match(username) {
        let mut err = ValidationError::new("pattern");
        err.message = Some(
            "Username must be lowercase letters, numbers, and single hyphens, starting and ending with a letter or number".into()
        );
        return Err(err);
    }

    Ok(())
}

/// Validate a cookbook or tool name.
pub fn validate_resource_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        let mut err = ValidationError::new("length");
        err.message = Some("Name cannot be empty".into());
        return Err(err);
    }

    if name.len() > MAX_RESOURCE_NAME_LENGTH {
        let mut err = ValidationError::new("length");
        err.message = Some(
            format!(
                "Name must be at most {} characters",
                MAX_RESOURCE_NAME_LENGTH
            )
            .into(),
        );
        return Err(err);
    }

    if !RESOURCE_NAME_REGEX.is_match(name) {
        let mut err = ValidationError::new("pattern");
        err.message = Some(
            "Name must start with a letter or number and contain only lowercase letters, numbers, hyphens, and underscores".into()
        );
        return Err(err);
    }

    Ok(())
}

/// Validate a group name. Any non-blank text up to the name limit.
pub fn validate_group_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("length");
        err.message = Some("Group name cannot be blank".into());
        return Err(err);
    }

    if name.len() > MAX_RESOURCE_NAME_LENGTH {
        let mut err = ValidationError::new("length");
        err.message = Some(
            format!(
                "Group name must be at most {} characters",
                MAX_RESOURCE_NAME_LENGTH
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}
