use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rolegate_core::AppError;

const REDACTED_MESSAGE: &str = "Forbidden";

/// Rejection produced by the authorization gate.
///
/// Every error category maps to `403 Forbidden` with a plain-text body.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    expose_detail: bool,
}

impl ApiError {
    /// Wraps an error, keeping or hiding its message in the response body.
    pub fn forbidden(error: AppError, expose_detail: bool) -> Self {
        Self {
            error,
            expose_detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = if self.expose_detail {
            self.error.to_string()
        } else {
            REDACTED_MESSAGE.to_owned()
        };

        (StatusCode::FORBIDDEN, body).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
