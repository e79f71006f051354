//! HTTP adapter mapping for service errors.
//!
//! Purpose: the single place where failures escaping handlers become
//! responses. Domain errors render as error envelopes with a status chosen by
//! an exhaustive match on [`ErrorCode`]; storage failures are never put in an
//! envelope and surface as an empty 500.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{DomainError, ErrorCode, ServiceError};

use super::envelope;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ServiceError>;

/// Status for each domain error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
    }
}

fn domain_response(err: &DomainError) -> HttpResponse {
    HttpResponse::build(status_for(err.code())).json(envelope::error(
        err.code(),
        err.message(),
        err.details().cloned(),
    ))
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Domain(err) => status_for(err.code()),
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Domain(err) => domain_response(err),
            Self::Storage(err) => {
                error!(error = %err, "unmapped storage failure");
                HttpResponse::InternalServerError().finish()
            }
        }
    }
}
