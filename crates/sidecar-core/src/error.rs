//! Error taxonomy for producers and the collaborators they call into.

use std::time::Duration;

use thiserror::Error;

/// Coarse classification of a [`ProducerError`].
///
/// Only used for logging; every kind is reported to HTTP clients the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotConnected,
    Query,
    Serialization,
    Io,
    Exec,
    Timeout,
}

/// Errors returned by a [`QueryExecutor`](crate::QueryExecutor).
#[derive(Error, Debug)]
pub enum QueryError {
    /// No database handle is available.
    #[error("PGBouncer database is not connected")]
    NotConnected,

    /// The request scope was cancelled before the query finished.
    #[error("query canceled")]
    Canceled,

    /// The admin console rejected the query or the connection failed.
    #[error("{0}")]
    Backend(String),

    /// A column value could not be read from the result set.
    #[error("could not decode column {column}: {message}")]
    Decode { column: String, message: String },
}

/// Errors returned by a [`CommandRunner`](crate::CommandRunner).
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started.
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Collecting the program's output failed.
    #[error("could not read output of {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but did not exit successfully.
    #[error("{program} failed with {status}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The request scope was cancelled while the program was running.
    #[error("{program} canceled")]
    Canceled { program: String },
}

/// A failed producer run, carrying the description of what was being fetched.
///
/// `Display` renders the full context chain outermost first, e.g.
/// `Error fetching users from PGBouncer: connection refused`.
#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("PGBouncer database is not connected")]
    NotConnected,

    #[error("{context}: {source}")]
    Query {
        context: String,
        #[source]
        source: QueryError,
    },

    #[error("Error converting response to JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Exec {
        context: String,
        #[source]
        source: ExecError,
    },

    #[error("{context}: request did not complete within {limit:?}")]
    Timeout { context: String, limit: Duration },
}

impl ProducerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProducerError::NotConnected => ErrorKind::NotConnected,
            ProducerError::Query { .. } => ErrorKind::Query,
            ProducerError::Serialization(_) => ErrorKind::Serialization,
            ProducerError::Io { .. } => ErrorKind::Io,
            ProducerError::Exec { .. } => ErrorKind::Exec,
            ProducerError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// The producer described by `context` was still running after `limit`.
    pub fn timeout(context: impl Into<String>, limit: Duration) -> Self {
        ProducerError::Timeout {
            context: context.into(),
            limit,
        }
    }

    pub(crate) fn query(context: impl Into<String>, source: QueryError) -> Self {
        ProducerError::Query {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ProducerError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn exec(context: impl Into<String>, source: ExecError) -> Self {
        ProducerError::Exec {
            context: context.into(),
            source,
        }
    }
}
