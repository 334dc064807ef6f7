//! Application error types and Axum response conversion.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use sidecar_core::ProducerError;
use tracing::error;

/// Request failures and their HTTP status mapping.
///
/// Every producer failure collapses to 500; the body carries the wrapped
/// message so operators can tell failures apart by reading it.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    MethodNotAllowed { allowed: Method },
    Producer(ProducerError),
}

impl From<ProducerError> for AppError {
    fn from(err: ProducerError) -> Self {
        AppError::Producer(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "404 page not found\n").into_response(),
            AppError::MethodNotAllowed { allowed } => {
                let mut response =
                    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed\n").into_response();
                if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                response
            }
            AppError::Producer(err) => {
                error!(kind = ?err.kind(), error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("An error occurred: {err}\n"),
                )
                    .into_response()
            }
        }
    }
}
