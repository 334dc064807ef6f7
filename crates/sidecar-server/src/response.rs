//! Translation of producer outcomes into HTTP responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use sidecar_core::{Payload, ProducerError};

use crate::error::AppError;

const TEXT: &str = "text/plain; charset=utf-8";
const JSON: &str = "application/json";

/// A successful producer payload ready to be written.
pub struct Reply(pub Payload);

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.0 {
            Payload::Empty => StatusCode::OK.into_response(),
            Payload::Text(body) => ([(header::CONTENT_TYPE, TEXT)], body).into_response(),
            Payload::Json(body) => ([(header::CONTENT_TYPE, JSON)], body).into_response(),
        }
    }
}

pub fn translate(outcome: Result<Payload, ProducerError>) -> Response {
    match outcome {
        Ok(payload) => Reply(payload).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
