#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::HeaderMap;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use sidecar_core::{
    Collaborators, CommandRunner, ExecError, HealthPolicy, QueryError, QueryExecutor,
    RequestContext, Row, RowSet, StatusQuery,
};
use sidecar_server::{register_all, server, RegistryBuilder, RouteOptions};

pub enum Behaviour<T> {
    Succeed(T),
    Fail(String),
    /// Park until the request scope is cancelled.
    Block,
}

/// Records every scope it was handed so tests can check it was released.
#[derive(Default)]
pub struct Calls {
    count: AtomicUsize,
    scopes: Mutex<Vec<CancellationToken>>,
}

impl Calls {
    fn record(&self, ctx: &RequestContext) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.scopes.lock().unwrap().push(ctx.token().clone());
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn scopes(&self) -> Vec<CancellationToken> {
        self.scopes.lock().unwrap().clone()
    }
}

pub struct StubExecutor {
    behaviour: Behaviour<RowSet>,
    pub calls: Calls,
    pub queries: Mutex<Vec<StatusQuery>>,
}

impl StubExecutor {
    pub fn new(behaviour: Behaviour<RowSet>) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: Calls::default(),
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl QueryExecutor for StubExecutor {
    async fn fetch(&self, ctx: &RequestContext, query: StatusQuery) -> Result<RowSet, QueryError> {
        self.calls.record(ctx);
        self.queries.lock().unwrap().push(query);
        match &self.behaviour {
            Behaviour::Succeed(rows) => Ok(rows.clone()),
            Behaviour::Fail(message) => Err(QueryError::Backend(message.clone())),
            Behaviour::Block => {
                ctx.cancelled().await;
                Err(QueryError::Canceled)
            }
        }
    }
}

pub struct StubRunner {
    behaviour: Behaviour<Vec<u8>>,
    pub calls: Calls,
    pub invocations: Mutex<Vec<(String, Vec<String>)>>,
}

impl StubRunner {
    pub fn new(behaviour: Behaviour<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: Calls::default(),
            invocations: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CommandRunner for StubRunner {
    async fn run(
        &self,
        ctx: &RequestContext,
        program: &str,
        args: &[String],
    ) -> Result<Vec<u8>, ExecError> {
        self.calls.record(ctx);
        self.invocations
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        match &self.behaviour {
            Behaviour::Succeed(out) => Ok(out.clone()),
            Behaviour::Fail(status) => Err(ExecError::Failed {
                program: program.to_string(),
                status: status.clone(),
                stderr: String::new(),
            }),
            Behaviour::Block => {
                ctx.cancelled().await;
                Err(ExecError::Canceled {
                    program: program.to_string(),
                })
            }
        }
    }
}

pub fn rows(value: serde_json::Value) -> RowSet {
    let rows: Vec<Row> = value
        .as_array()
        .expect("rows fixture must be an array")
        .iter()
        .map(|row| row.as_object().cloned().expect("row fixture must be an object"))
        .collect();
    RowSet::new(rows)
}

pub struct App {
    pub router: Router,
    pub scope: CancellationToken,
}

pub struct AppBuilder {
    executor: Option<Arc<StubExecutor>>,
    runner: Arc<StubRunner>,
    options: RouteOptions,
    timeout: Duration,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            executor: None,
            runner: StubRunner::new(Behaviour::Succeed(Vec::new())),
            options: RouteOptions {
                version_file: PathBuf::from("/nonexistent/ami_version"),
                health: HealthPolicy {
                    pooler_port: 0,
                    enhanced_check: false,
                    check_agent: false,
                },
                debug_endpoints: false,
            },
            timeout: Duration::from_secs(10),
        }
    }

    pub fn executor(mut self, executor: Arc<StubExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn runner(mut self, runner: Arc<StubRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn health(mut self, health: HealthPolicy) -> Self {
        self.options.health = health;
        self
    }

    pub fn version_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.version_file = path.into();
        self
    }

    pub fn debug_endpoints(mut self, enabled: bool) -> Self {
        self.options.debug_endpoints = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> App {
        let executor = self.executor.map(|e| e as Arc<dyn QueryExecutor>);
        let collaborators = Collaborators::new(executor, self.runner);
        let scope = CancellationToken::new();

        let mut builder = RegistryBuilder::new(self.timeout);
        register_all(&mut builder, &self.options);
        let registry = builder.build(collaborators, scope.clone());

        App {
            router: server::router(registry),
            scope,
        }
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

pub async fn send(app: &Router, method: Method, uri: &str) -> Reply {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    Reply {
        status,
        headers,
        body: body.to_vec(),
    }
}

pub async fn get(app: &Router, uri: &str) -> Reply {
    send(app, Method::GET, uri).await
}
