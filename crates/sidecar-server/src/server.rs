//! Axum router setup and the serve loop with bounded graceful shutdown.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, Uri};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::registry::Registry;

/// Wraps the registry in an Axum router with request tracing.
pub fn router(registry: Registry) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    Router::new()
        .fallback(dispatch)
        .layer(trace_layer)
        .with_state(Arc::new(registry))
}

async fn dispatch(State(registry): State<Arc<Registry>>, method: Method, uri: Uri) -> Response {
    registry.dispatch(&method, uri.path()).await
}

/// Serves `app` until `signal` resolves, then stops accepting connections and
/// waits up to `grace` for in-flight requests.
///
/// If the grace period runs out, `requests` is cancelled, which aborts every
/// producer still running, and the server task is dropped.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    requests: CancellationToken,
    grace: Duration,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let stop_accepting = CancellationToken::new();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(stop_accepting.clone().cancelled_owned());
    let mut running = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut running => return flatten(joined),
        () = signal => {
            info!(grace = ?grace, "shutdown signal received, draining in-flight requests");
        }
    }
    stop_accepting.cancel();

    match tokio::time::timeout(grace, &mut running).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            warn!(grace = ?grace, "in-flight requests did not finish in time, forcing shutdown");
            requests.cancel();
            running.abort();
            Ok(())
        }
    }
}

fn flatten(joined: Result<io::Result<()>, JoinError>) -> io::Result<()> {
    joined.map_err(io::Error::other)?
}
