//! Method restriction and per-request deadline around a producer.

use std::time::Duration;

use axum::http::Method;
use axum::response::{IntoResponse, Response};
use sidecar_core::{Collaborators, Producer, ProducerError, RequestContext};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::AppError;
use crate::response;

/// A producer that only answers one method and must finish before a deadline.
#[derive(Debug, Clone)]
pub struct Guarded {
    method: Method,
    timeout: Duration,
    producer: Producer,
}

impl Guarded {
    pub fn new(producer: Producer, method: Method, timeout: Duration) -> Self {
        Self {
            method,
            timeout,
            producer,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn producer(&self) -> &Producer {
        &self.producer
    }

    /// Runs the producer inside a child scope of `parent`.
    ///
    /// The child scope is cancelled when this future completes or is dropped,
    /// whichever comes first.
    pub async fn call(
        &self,
        method: &Method,
        parent: &CancellationToken,
        collaborators: &Collaborators,
    ) -> Response {
        if *method != self.method {
            return AppError::MethodNotAllowed {
                allowed: self.method.clone(),
            }
            .into_response();
        }

        let scope = parent.child_token();
        let _release = scope.clone().drop_guard();
        let ctx = RequestContext::new(scope, Instant::now() + self.timeout);

        let running = self.producer.run(&ctx, collaborators);
        let outcome = match tokio::time::timeout(self.timeout, running).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    producer = self.producer.label(),
                    timeout = ?self.timeout,
                    "producer exceeded deadline"
                );
                Err(ProducerError::timeout(self.producer.context(), self.timeout))
            }
        };
        response::translate(outcome)
    }
}
