//! Path-to-producer dispatch table.
//!
//! Routes are registered on a [`RegistryBuilder`] during startup and frozen
//! into a [`Registry`] before the listener starts, so serving needs no locks.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::http::Method;
use axum::response::{IntoResponse, Response};
use sidecar_core::{Collaborators, Producer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::guard::Guarded;

/// Collects routes before the server starts.
pub struct RegistryBuilder {
    timeout: Duration,
    routes: BTreeMap<String, Guarded>,
}

impl RegistryBuilder {
    /// Creates an empty builder; every route gets `timeout` as its deadline.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            routes: BTreeMap::new(),
        }
    }

    /// Registers `producer` at `path`. A second registration for the same
    /// path replaces the first.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        producer: Producer,
        method: Method,
    ) -> &mut Self {
        let path = path.into();
        let route = Guarded::new(producer, method, self.timeout);
        if self.routes.insert(path.clone(), route).is_some() {
            warn!(path = %path, "route registered twice, keeping the latest");
        }
        self
    }

    pub fn get(&mut self, path: impl Into<String>, producer: Producer) -> &mut Self {
        self.register(path, producer, Method::GET)
    }

    /// Freezes the table. `scope` is the parent of every request scope;
    /// cancelling it aborts all in-flight producers.
    pub fn build(self, collaborators: Collaborators, scope: CancellationToken) -> Registry {
        for (path, route) in &self.routes {
            debug!(
                path = %path,
                method = %route.method(),
                producer = route.producer().label(),
                "registered route"
            );
        }
        Registry {
            routes: self.routes,
            collaborators,
            scope,
        }
    }
}

/// Immutable dispatch table shared by all requests.
pub struct Registry {
    routes: BTreeMap<String, Guarded>,
    collaborators: Collaborators,
    scope: CancellationToken,
}

impl Registry {
    /// Exact-path lookup.
    pub fn lookup(&self, path: &str) -> Option<&Guarded> {
        self.routes.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub async fn dispatch(&self, method: &Method, path: &str) -> Response {
        match self.lookup(path) {
            Some(route) => route.call(method, &self.scope, &self.collaborators).await,
            None => AppError::NotFound.into_response(),
        }
    }
}
