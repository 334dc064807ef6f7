//! Client for the PGBouncer admin console.
//!
//! [`AdminClient`] owns a small `sqlx` connection pool and implements
//! [`QueryExecutor`] by running `SHOW ...;` commands over the simple query
//! protocol.

mod convert;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgPool};
use thiserror::Error;
use tracing::{debug, info};

use sidecar_core::{QueryError, QueryExecutor, RequestContext, RowSet, StatusQuery};

/// Startup failures talking to PGBouncer.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("connection string is invalid: {0}")]
    InvalidConnstr(#[source] sqlx::Error),

    #[error("could not connect to database: {0}")]
    Connect(#[source] sqlx::Error),
}

/// Pooled connection to the PGBouncer admin database.
#[derive(Debug, Clone)]
pub struct AdminClient {
    pool: PgPool,
}

impl AdminClient {
    /// Parses `connstr`, opens the pool and verifies the connection.
    pub async fn connect(connstr: &str, max_connections: u32) -> Result<Self, AdminError> {
        // The admin console rejects prepared statements and any startup
        // parameter outside its ignore list.
        let options = PgConnectOptions::from_str(connstr)
            .map_err(AdminError::InvalidConnstr)?
            .statement_cache_capacity(0)
            .extra_float_digits(None);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(AdminError::Connect)?;

        let client = Self { pool };
        client.ping().await?;
        info!(max_connections, "Connected to PGBouncer database");
        Ok(client)
    }

    pub async fn ping(&self) -> Result<(), AdminError> {
        let mut conn = self.pool.acquire().await.map_err(AdminError::Connect)?;
        conn.ping().await.map_err(AdminError::Connect)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QueryExecutor for AdminClient {
    async fn fetch(&self, ctx: &RequestContext, query: StatusQuery) -> Result<RowSet, QueryError> {
        let command = query.command();
        debug!(command, remaining = ?ctx.remaining(), "querying admin console");

        let rows = tokio::select! {
            rows = sqlx::raw_sql(command).fetch_all(&self.pool) => {
                rows.map_err(|e| QueryError::Backend(e.to_string()))?
            }
            () = ctx.cancelled() => return Err(QueryError::Canceled),
        };

        rows.iter()
            .map(convert::row_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(RowSet::from)
    }
}
