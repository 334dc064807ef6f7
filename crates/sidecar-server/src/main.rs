//! Sidecar entry point.
//!
//! Parses configuration, connects to PGBouncer, registers routes and serves
//! until SIGINT/SIGTERM.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sidecar_config::Config;
use sidecar_core::{Collaborators, ProcessRunner, QueryExecutor};
use sidecar_pgbouncer::AdminClient;
use sidecar_server::{register_all, server, shutdown, RegistryBuilder, RouteOptions};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = Config::parse();
    config.validate().context("Could not process configuration")?;

    let admin = AdminClient::connect(&config.connstr, config.db_pool_size)
        .await
        .context("PGBouncer is unavailable")?;

    let executor: Arc<dyn QueryExecutor> = Arc::new(admin.clone());
    let collaborators = Collaborators::new(Some(executor), Arc::new(ProcessRunner));
    let requests = CancellationToken::new();

    let mut builder = RegistryBuilder::new(config.request_timeout());
    register_all(&mut builder, &RouteOptions::from(&config));
    let registry = builder.build(collaborators, requests.clone());
    info!("Registered {} routes", registry.len());

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;
    info!("Listening on port {}", config.port);

    server::serve(
        listener,
        server::router(registry),
        shutdown::wait_for_shutdown(),
        requests,
        config.shutdown_grace(),
    )
    .await
    .context("error while serving connections")?;

    admin.close().await;
    info!("Shutdown complete");
    Ok(())
}
