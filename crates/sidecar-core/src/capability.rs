//! Collaborator capabilities the producers depend on.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::{ExecError, QueryError};
use crate::query::{RowSet, StatusQuery};

/// Runs named status queries against the pooler's admin interface.
///
/// Implementations must give up and return [`QueryError::Canceled`] once the
/// request scope is cancelled.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch(&self, ctx: &RequestContext, query: StatusQuery) -> Result<RowSet, QueryError>;
}

/// Runs an external program and returns its standard output.
///
/// Implementations must stop the program once the request scope is cancelled.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        ctx: &RequestContext,
        program: &str,
        args: &[String],
    ) -> Result<Vec<u8>, ExecError>;
}

/// Capabilities injected into every producer at startup.
///
/// `executor` is `None` when no database handle is available; query
/// producers then fail with `NotConnected`.
#[derive(Clone)]
pub struct Collaborators {
    pub executor: Option<Arc<dyn QueryExecutor>>,
    pub runner: Arc<dyn CommandRunner>,
}

impl Collaborators {
    pub fn new(executor: Option<Arc<dyn QueryExecutor>>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { executor, runner }
    }
}
