//! Uniform JSON response envelope.
//!
//! Every handled response, success or domain failure, shares one top-level
//! shape so clients can branch on `success` before looking further.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::ErrorCode;

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessEnvelope<T> {
    success: bool,
    data: T,
    meta: Map<String, Value>,
}

/// Error payload nested under `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Map<String, Value>>,
}

/// Failed response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

/// Wrap `data` with an empty `meta` object.
///
/// # Examples
/// ```
/// use backend::inbound::http::envelope;
/// use serde_json::json;
///
/// let body = serde_json::to_value(envelope::success(json!({"x": 1}))).unwrap();
/// assert_eq!(body, json!({"success": true, "data": {"x": 1}, "meta": {}}));
/// ```
pub fn success<T: Serialize>(data: T) -> SuccessEnvelope<T> {
    success_with_meta(data, Map::new())
}

/// Wrap `data` together with caller-supplied metadata.
pub fn success_with_meta<T: Serialize>(data: T, meta: Map<String, Value>) -> SuccessEnvelope<T> {
    SuccessEnvelope {
        success: true,
        data,
        meta,
    }
}

/// Build an error envelope; `details` is omitted from the JSON when `None`.
pub fn error(
    code: ErrorCode,
    message: impl Into<String>,
    details: Option<Map<String, Value>>,
) -> ErrorEnvelope {
    ErrorEnvelope {
        success: false,
        error: ErrorBody {
            code,
            message: message.into(),
            details,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn to_json(value: impl Serialize) -> Value {
        serde_json::to_value(value).expect("envelope serialises")
    }

    #[rstest]
    fn success_defaults_meta_to_an_empty_object() {
        assert_eq!(
            to_json(success(json!({"x": 1}))),
            json!({"success": true, "data": {"x": 1}, "meta": {}})
        );
    }

    #[rstest]
    fn success_carries_supplied_meta() {
        let mut meta = Map::new();
        meta.insert("total".to_owned(), json!(3));

        let body = to_json(success_with_meta(json!([]), meta));

        assert_eq!(body["meta"], json!({"total": 3}));
    }

    #[rstest]
    fn error_without_details_has_no_details_key() {
        let body = to_json(error(ErrorCode::NotFound, "msg", None));

        assert_eq!(
            body,
            json!({"success": false, "error": {"code": "not_found", "message": "msg"}})
        );
    }

    #[rstest]
    fn error_with_details_nests_them_under_error() {
        let mut details = Map::new();
        details.insert("email".to_owned(), json!("ada@example.com"));

        let body = to_json(error(ErrorCode::Conflict, "taken", Some(details)));

        assert_eq!(body["error"]["details"], json!({"email": "ada@example.com"}));
        assert_eq!(body["error"]["code"], json!("conflict"));
    }
}
