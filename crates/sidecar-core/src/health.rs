//! Liveness probes behind the `/health` endpoint.
//!
//! The probes run in sequence and stop at the first failure:
//!
//! 1. Pooler check: either an authenticated `SHOW USERS;` through the query
//!    executor (enhanced check) or a bare TCP connect to the pooler port.
//! 2. Agent check (optional): `sudo -n datadog-agent health`.
//!
//! A healthy verdict carries no detail; an unhealthy one carries the wrapped
//! failure so it can travel through the normal error path.

use std::io;
use std::net::Ipv4Addr;

use tokio::net::TcpStream;
use tracing::debug;

use crate::capability::Collaborators;
use crate::context::RequestContext;
use crate::error::{ProducerError, QueryError};
use crate::query::StatusQuery;

const AGENT_PROGRAM: &str = "sudo";
const AGENT_ARGS: [&str; 3] = ["-n", "datadog-agent", "health"];

/// Which probes the health endpoint runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    /// Port PGBouncer listens on locally.
    pub pooler_port: u16,
    /// Run an authenticated query instead of a TCP probe.
    pub enhanced_check: bool,
    /// Also ask the co-located Datadog agent for its health.
    pub check_agent: bool,
}

#[derive(Debug)]
pub enum HealthVerdict {
    Healthy,
    Unhealthy(ProducerError),
}

impl HealthVerdict {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthVerdict::Healthy)
    }

    pub fn into_result(self) -> Result<(), ProducerError> {
        match self {
            HealthVerdict::Healthy => Ok(()),
            HealthVerdict::Unhealthy(err) => Err(err),
        }
    }
}

/// Short-circuiting chain of liveness probes.
#[derive(Debug, Clone)]
pub struct HealthEvaluator {
    policy: HealthPolicy,
    agent_program: String,
    agent_args: Vec<String>,
}

impl HealthEvaluator {
    pub fn new(policy: HealthPolicy) -> Self {
        Self {
            policy,
            agent_program: AGENT_PROGRAM.to_string(),
            agent_args: AGENT_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn policy(&self) -> HealthPolicy {
        self.policy
    }

    pub async fn evaluate(
        &self,
        ctx: &RequestContext,
        collaborators: &Collaborators,
    ) -> HealthVerdict {
        if let Err(err) = self.check_pooler(ctx, collaborators).await {
            return HealthVerdict::Unhealthy(err);
        }
        if let Err(err) = self.check_agent(ctx, collaborators).await {
            return HealthVerdict::Unhealthy(err);
        }
        HealthVerdict::Healthy
    }

    async fn check_pooler(
        &self,
        ctx: &RequestContext,
        collaborators: &Collaborators,
    ) -> Result<(), ProducerError> {
        if self.policy.enhanced_check {
            let Some(executor) = collaborators.executor.as_ref() else {
                return Err(ProducerError::query(
                    "PGBouncer enhanced health check failed",
                    QueryError::NotConnected,
                ));
            };
            executor
                .fetch(ctx, StatusQuery::Users)
                .await
                .map(|_| ())
                .map_err(|source| {
                    ProducerError::query("PGBouncer enhanced health check failed", source)
                })
        } else {
            probe_local_port(self.policy.pooler_port)
                .await
                .map_err(|source| ProducerError::io("PGBouncer port probe check failed", source))
        }
    }

    async fn check_agent(
        &self,
        ctx: &RequestContext,
        collaborators: &Collaborators,
    ) -> Result<(), ProducerError> {
        if !self.policy.check_agent {
            return Ok(());
        }
        collaborators
            .runner
            .run(ctx, &self.agent_program, &self.agent_args)
            .await
            .map(|_| ())
            .map_err(|source| ProducerError::exec("Datadog agent health command failed", source))
    }
}

/// Connects to `port` on the loopback interface and closes the connection.
pub async fn probe_local_port(port: u16) -> io::Result<()> {
    let stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await?;
    debug!(port, "pooler port accepted connection");
    drop(stream);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::net::TcpListener;

    use super::*;
    use crate::capability::{CommandRunner, QueryExecutor};
    use crate::error::ExecError;
    use crate::query::RowSet;

    struct Executor {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueryExecutor for Executor {
        async fn fetch(
            &self,
            _: &RequestContext,
            query: StatusQuery,
        ) -> Result<RowSet, QueryError> {
            assert_eq!(query, StatusQuery::Users);
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(QueryError::Backend("password authentication failed".into()))
            } else {
                Ok(RowSet::default())
            }
        }
    }

    struct Runner {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandRunner for Runner {
        async fn run(
            &self,
            _: &RequestContext,
            program: &str,
            args: &[String],
        ) -> Result<Vec<u8>, ExecError> {
            assert_eq!(program, "sudo");
            assert_eq!(args, ["-n", "datadog-agent", "health"]);
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ExecError::Failed {
                    program: program.into(),
                    status: "exit status: 1".into(),
                    stderr: String::new(),
                })
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn collaborators(
        executor_fails: bool,
        runner_fails: bool,
    ) -> (Collaborators, Arc<Executor>, Arc<Runner>) {
        let executor = Arc::new(Executor {
            fail: executor_fails,
            calls: AtomicUsize::new(0),
        });
        let runner = Arc::new(Runner {
            fail: runner_fails,
            calls: AtomicUsize::new(0),
        });
        let collaborators = Collaborators::new(Some(executor.clone()), runner.clone());
        (collaborators, executor, runner)
    }

    fn ctx() -> RequestContext {
        RequestContext::with_timeout(Duration::from_secs(5))
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn port_probe_healthy_when_listening() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (collaborators, executor, runner) = collaborators(true, true);

        let evaluator = HealthEvaluator::new(HealthPolicy {
            pooler_port: port,
            enhanced_check: false,
            check_agent: false,
        });
        assert!(evaluator.evaluate(&ctx(), &collaborators).await.is_healthy());
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn port_probe_failure_short_circuits() {
        let port = closed_port().await;
        let (collaborators, _, runner) = collaborators(false, false);

        let evaluator = HealthEvaluator::new(HealthPolicy {
            pooler_port: port,
            enhanced_check: false,
            check_agent: true,
        });
        let err = evaluator
            .evaluate(&ctx(), &collaborators)
            .await
            .into_result()
            .unwrap_err();
        assert!(err.to_string().contains("port probe"), "{err}");
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enhanced_check_failure() {
        let (collaborators, executor, _) = collaborators(true, false);
        let evaluator = HealthEvaluator::new(HealthPolicy {
            pooler_port: 0,
            enhanced_check: true,
            check_agent: true,
        });
        let err = evaluator
            .evaluate(&ctx(), &collaborators)
            .await
            .into_result()
            .unwrap_err();
        assert!(err.to_string().contains("enhanced health check"), "{err}");
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn enhanced_check_without_executor() {
        let runner = Arc::new(Runner { fail: false, calls: AtomicUsize::new(0) });
        let collaborators = Collaborators::new(None, runner);
        let evaluator = HealthEvaluator::new(HealthPolicy {
            pooler_port: 0,
            enhanced_check: true,
            check_agent: false,
        });
        let err = evaluator
            .evaluate(&ctx(), &collaborators)
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "PGBouncer enhanced health check failed: PGBouncer database is not connected"
        );
    }

    #[tokio::test]
    async fn agent_failure_after_enhanced_success() {
        let (collaborators, _, runner) = collaborators(false, true);
        let evaluator = HealthEvaluator::new(HealthPolicy {
            pooler_port: 0,
            enhanced_check: true,
            check_agent: true,
        });
        let err = evaluator
            .evaluate(&ctx(), &collaborators)
            .await
            .into_result()
            .unwrap_err();
        assert!(err.to_string().contains("Datadog agent"), "{err}");
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_checks_pass() {
        let (collaborators, executor, runner) = collaborators(false, false);
        let evaluator = HealthEvaluator::new(HealthPolicy {
            pooler_port: 0,
            enhanced_check: true,
            check_agent: true,
        });
        assert!(evaluator.evaluate(&ctx(), &collaborators).await.is_healthy());
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }
}
