//! Transport-level validation for inbound HTTP payloads.
//!
//! Field rules mirror the request schemas: failures become
//! `validation_error` domain errors whose details name the `field` and a
//! machine-readable `code`. Path and query values are taken as raw strings and
//! parsed here so failures can name the offending parameter; JSON extractor
//! failures are routed through [`json_config`] and [`query_config`].

use std::sync::OnceLock;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, web};
use regex::Regex;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::{DEFAULT_PAGE_LIMIT, DomainError, Page, PostId, ServiceError, UserId};

/// Largest page a listing may request.
pub const MAX_PAGE_LIMIT: i64 = 500;

pub(crate) const NAME_MAX_CHARS: usize = 80;
pub(crate) const EMAIL_MAX_CHARS: usize = 100;
pub(crate) const CAPTION_MAX_CHARS: usize = 255;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidEmail,
    InvalidInteger,
    InvalidType,
    TooShort,
    TooLong,
    OutOfRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidEmail => "invalid_email",
            ErrorCode::InvalidInteger => "invalid_integer",
            ErrorCode::InvalidType => "invalid_type",
            ErrorCode::TooShort => "too_short",
            ErrorCode::TooLong => "too_long",
            ErrorCode::OutOfRange => "out_of_range",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

pub(crate) const ID: FieldName = FieldName::new("id");
pub(crate) const EMAIL: FieldName = FieldName::new("email");
pub(crate) const NAME: FieldName = FieldName::new("name");
pub(crate) const AGE: FieldName = FieldName::new("age");
pub(crate) const AUTHOR_ID: FieldName = FieldName::new("author_id");
pub(crate) const CONTENT: FieldName = FieldName::new("content");
pub(crate) const CAPTION: FieldName = FieldName::new("caption");
pub(crate) const LIMIT: FieldName = FieldName::new("limit");
pub(crate) const OFFSET: FieldName = FieldName::new("offset");

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> DomainError {
        DomainError::validation(self.message)
            .with_detail("field", self.field)
            .with_detail("code", code.as_str())
    }

    fn with_value(self, code: ErrorCode, value: impl Into<Value>) -> DomainError {
        self.with_code(code).with_detail("value", value)
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> DomainError {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

fn invalid_integer_error(field: &str, value: &str) -> DomainError {
    ValidationError::new(field, format!("{field} must be an integer"))
        .with_value(ErrorCode::InvalidInteger, value)
}

fn out_of_range_error(field: FieldName, value: i64, requirement: &str) -> DomainError {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be {requirement}"))
        .with_value(ErrorCode::OutOfRange, value)
}

/// Parse a raw path or query value as an integer.
pub(crate) fn parse_integer(value: &str, field: FieldName) -> Result<i64, DomainError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_integer_error(field.as_str(), value))
}

/// Require `value >= min`.
pub(crate) fn require_at_least(field: FieldName, value: i64, min: i64) -> Result<i64, DomainError> {
    if value < min {
        return Err(out_of_range_error(
            field,
            value,
            &format!("greater than or equal to {min}"),
        ));
    }
    Ok(value)
}

/// Require `value` to fall within `min..=max`.
pub(crate) fn require_between(
    field: FieldName,
    value: i64,
    min: i64,
    max: i64,
) -> Result<i64, DomainError> {
    if !(min..=max).contains(&value) {
        return Err(out_of_range_error(
            field,
            value,
            &format!("between {min} and {max}"),
        ));
    }
    Ok(value)
}

/// Check a string's length in characters against inclusive bounds.
pub(crate) fn require_length(
    field: FieldName,
    value: &str,
    min: usize,
    max: Option<usize>,
) -> Result<(), DomainError> {
    let field = field.as_str();
    let length = value.chars().count();
    if length < min {
        let unit = if min == 1 { "character" } else { "characters" };
        return Err(
            ValidationError::new(field, format!("{field} must have at least {min} {unit}"))
                .with_code(ErrorCode::TooShort),
        );
    }
    if let Some(max) = max.filter(|max| length > *max) {
        return Err(
            ValidationError::new(field, format!("{field} must have at most {max} characters"))
                .with_code(ErrorCode::TooLong),
        );
    }
    Ok(())
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Dot-atom local part; hostname labels may not start or end with `-`.
        let pattern = concat!(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
            r"@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
        );
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Syntactic email check: dot-atom local part and a dotted hostname.
pub(crate) fn validate_email(value: &str) -> Result<(), DomainError> {
    if !email_regex().is_match(value) {
        let field = EMAIL.as_str();
        return Err(
            ValidationError::new(field, format!("{field} must be a valid email address"))
                .with_value(ErrorCode::InvalidEmail, value),
        );
    }
    require_length(EMAIL, value, 1, Some(EMAIL_MAX_CHARS))
}

/// Parse a positive entity identifier.
pub(crate) fn parse_id(value: &str, field: FieldName) -> Result<i64, DomainError> {
    let raw = parse_integer(value, field)?;
    require_at_least(field, raw, 1)
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, DomainError> {
    parse_id(value, field).map(UserId::new)
}

pub(crate) fn parse_post_id(value: &str, field: FieldName) -> Result<PostId, DomainError> {
    parse_id(value, field).map(PostId::new)
}

/// Resolve optional raw `limit`/`offset` query values into a [`Page`].
pub(crate) fn parse_page(
    limit: Option<&str>,
    offset: Option<&str>,
) -> Result<Page, DomainError> {
    let limit = match limit {
        Some(raw) => require_between(LIMIT, parse_integer(raw, LIMIT)?, 1, MAX_PAGE_LIMIT)?,
        None => DEFAULT_PAGE_LIMIT,
    };
    let offset = match offset {
        Some(raw) => require_at_least(OFFSET, parse_integer(raw, OFFSET)?, 0)?,
        None => 0,
    };
    Ok(Page { limit, offset })
}

fn missing_field_name(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

/// Translate a JSON extractor failure into a domain error.
///
/// Syntax errors and unreadable bodies are `bad_request`; well-formed JSON of
/// the wrong shape is a `validation_error`.
pub(crate) fn json_payload_error(err: &JsonPayloadError) -> DomainError {
    match err {
        JsonPayloadError::Deserialize(inner) if inner.is_data() => {
            let message = inner.to_string();
            match missing_field_name(&message) {
                Some(field) => ValidationError::new(field, format!("missing required field: {field}"))
                    .with_code(ErrorCode::MissingField),
                None => ValidationError::new("body", message.clone())
                    .with_code(ErrorCode::InvalidType),
            }
        }
        JsonPayloadError::Deserialize(inner) => {
            DomainError::bad_request("Malformed JSON body.").with_detail("reason", inner.to_string())
        }
        other => DomainError::bad_request("Request body could not be read.")
            .with_detail("reason", other.to_string()),
    }
}

/// JSON extractor configuration routing failures through the error boundary.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req: &HttpRequest| {
        debug!(path = req.path(), error = %err, "rejected JSON payload");
        ServiceError::from(json_payload_error(&err)).into()
    })
}

/// Query extractor configuration; undecodable query strings are
/// `validation_error`s on the `query` field.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, req: &HttpRequest| {
        debug!(path = req.path(), error = %err, "rejected query string");
        ServiceError::from(
            ValidationError::new("query", err.to_string()).with_code(ErrorCode::InvalidType),
        )
        .into()
    })
}

/// Error details as a JSON value for assertions.
#[cfg(test)]
pub(crate) fn details_of(err: &DomainError) -> Value {
    err.details().map_or(json!(null), |d| Value::Object(d.clone()))
}
