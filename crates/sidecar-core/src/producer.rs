//! Content producers that back each HTTP route.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::capability::Collaborators;
use crate::context::RequestContext;
use crate::error::ProducerError;
use crate::health::HealthEvaluator;
use crate::query::StatusQuery;

/// Response body of a successful producer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Empty,
    Text(Vec<u8>),
    Json(Vec<u8>),
}

/// The closed set of producers a route can be backed by.
///
/// Everything a producer needs is captured at registration time; request
/// input never reaches file paths or command arguments.
#[derive(Debug, Clone)]
pub enum Producer {
    /// Always succeeds with an empty body.
    Static,
    /// Reads a file in full.
    File { description: String, path: PathBuf },
    /// Runs a program with fixed arguments and returns its stdout.
    Command {
        description: String,
        program: String,
        args: Vec<String>,
    },
    /// Runs a status query and renders the rows as JSON.
    Query(StatusQuery),
    /// Runs the health probe chain.
    Health(HealthEvaluator),
}

impl Producer {
    pub fn file(description: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Producer::File {
            description: description.into(),
            path: path.into(),
        }
    }

    pub fn command<I, S>(
        description: impl Into<String>,
        program: impl Into<String>,
        args: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Producer::Command {
            description: description.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Producer::Static => "static",
            Producer::File { .. } => "file",
            Producer::Command { .. } => "command",
            Producer::Query(_) => "query",
            Producer::Health(_) => "health",
        }
    }

    /// Description of what this producer fetches, prefixed to its errors.
    pub fn context(&self) -> String {
        match self {
            Producer::Static => "Error serving request".to_string(),
            Producer::File { description, .. } | Producer::Command { description, .. } => {
                format!("Error fetching {description}")
            }
            Producer::Query(query) => format!("Error fetching {query} from PGBouncer"),
            Producer::Health(_) => "Error checking health".to_string(),
        }
    }

    pub async fn run(
        &self,
        ctx: &RequestContext,
        collaborators: &Collaborators,
    ) -> Result<Payload, ProducerError> {
        match self {
            Producer::Static => Ok(Payload::Empty),
            Producer::File { path, .. } => read_file(self.context(), path).await,
            Producer::Command { program, args, .. } => {
                debug!(program = %program, "running command");
                collaborators
                    .runner
                    .run(ctx, program, args)
                    .await
                    .map(Payload::Text)
                    .map_err(|source| ProducerError::exec(self.context(), source))
            }
            Producer::Query(query) => run_query(ctx, collaborators, *query, self.context()).await,
            Producer::Health(evaluator) => evaluator
                .evaluate(ctx, collaborators)
                .await
                .into_result()
                .map(|()| Payload::Empty),
        }
    }
}

async fn read_file(context: String, path: &Path) -> Result<Payload, ProducerError> {
    // Error text must not include the path.
    tokio::fs::read(path)
        .await
        .map(Payload::Text)
        .map_err(|source| ProducerError::io(context, source))
}

async fn run_query(
    ctx: &RequestContext,
    collaborators: &Collaborators,
    query: StatusQuery,
    context: String,
) -> Result<Payload, ProducerError> {
    let executor = collaborators
        .executor
        .as_ref()
        .ok_or(ProducerError::NotConnected)?;
    let rows = executor
        .fetch(ctx, query)
        .await
        .map_err(|source| ProducerError::query(context, source))?;
    debug!(query = query.command(), rows = rows.len(), "status query returned");
    Ok(Payload::Json(serde_json::to_vec(&rows)?))
}
