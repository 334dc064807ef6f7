//! Core domain types for the PGBouncer monitoring sidecar.
//!
//! This crate holds everything the HTTP layer dispatches to:
//!
//! - [`Producer`] and [`Payload`]: the closed set of route producers
//! - [`HealthEvaluator`]: the short-circuiting liveness probe chain
//! - [`QueryExecutor`] and [`CommandRunner`]: collaborator capabilities,
//!   bundled as [`Collaborators`]
//! - [`ProcessRunner`]: the `tokio::process` command runner
//! - [`ProducerError`]: error taxonomy with human-readable context chains
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sidecar_core::{Collaborators, ProcessRunner, Producer, RequestContext};
//!
//! let collaborators = Collaborators::new(None, Arc::new(ProcessRunner));
//! let producer = Producer::command("kernel logs", "dmesg", Vec::<String>::new());
//! let ctx = RequestContext::with_timeout(Duration::from_secs(10));
//! let payload = producer.run(&ctx, &collaborators).await?;
//! ```

mod capability;
mod context;
mod error;
mod health;
mod producer;
mod query;
mod runner;

pub use capability::{Collaborators, CommandRunner, QueryExecutor};
pub use context::RequestContext;
pub use error::{ErrorKind, ExecError, ProducerError, QueryError};
pub use health::{probe_local_port, HealthEvaluator, HealthPolicy, HealthVerdict};
pub use producer::{Payload, Producer};
pub use query::{Row, RowSet, StatusQuery};
pub use runner::ProcessRunner;
