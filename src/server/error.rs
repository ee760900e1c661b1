//! Error-to-HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use presenter_core::Error;
use serde_json::json;

/// Wrapper so core errors can be returned from route handlers.
#[derive(Debug)]
pub struct AppError {
    inner: Error,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self { inner }
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!(status = %status, error = %self.inner, "Server error in manifest route");
        }

        let code = match &self.inner {
            Error::ProviderUnavailable { .. } => "provider_unavailable",
            Error::MalformedResponse { .. } => "malformed_response",
            Error::CacheUnavailable(_) => "cache_unavailable",
            Error::UnresolvableSource(_) => "unresolvable_source",
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::NotImplemented(_) => "not_implemented",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.inner.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_produces_404() {
        let response = AppError::new(Error::not_found("manifest", "x")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_implemented_produces_501() {
        let response = AppError::new(Error::NotImplemented("v2".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[test]
    fn provider_failure_is_bad_gateway() {
        let response = AppError::new(Error::provider("flickr", "timeout")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
