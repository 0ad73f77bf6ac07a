use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::toasts::ToastServiceError;
use crate::infra::http::models::ErrorBody;

/// Diagnostic attached to failure responses so the logging middleware can
/// report what went wrong without re-parsing the body.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            error: "Method not allowed".to_string(),
        }
    }

    pub fn storage(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.into(),
        }
    }
}

impl From<ToastServiceError> for ApiError {
    fn from(err: ToastServiceError) -> Self {
        match err {
            ToastServiceError::Validation(violation) => Self::bad_request(violation.to_string()),
            ToastServiceError::Store(err) => Self::storage(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.error.clone(),
        };
        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorReport {
            status: self.status,
            detail: self.error,
        });
        response
    }
}
