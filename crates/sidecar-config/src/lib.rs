//! Process configuration for the sidecar.
//!
//! Every setting can be given as a flag or through its environment variable
//! (`--port` / `PORT`, and so on). The configuration is parsed once at
//! startup and is read-only afterwards.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;

/// Configuration validation errors.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("port must be non-zero")]
    ZeroPort,

    #[error("request timeout must be at least one second")]
    ZeroTimeout,

    #[error("database pool size must be at least 1")]
    ZeroPoolSize,

    #[error("connection string must not be empty")]
    EmptyConnstr,

    #[error("connection string must start with postgres:// or postgresql://, got {0:?}")]
    UnsupportedScheme(String),
}

/// Sidecar settings.
#[derive(Debug, Clone, Parser)]
#[command(name = "pgbouncer-sidecar", version, about = "HTTP monitoring sidecar for PGBouncer")]
pub struct Config {
    /// Port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Connection string for the PGBouncer admin console.
    #[arg(
        long,
        env = "CONNSTR",
        default_value = "postgres://pgbouncer@127.0.0.1:6432/pgbouncer",
        hide_env_values = true
    )]
    pub connstr: String,

    /// Local port probed by the basic health check.
    #[arg(long, env = "PGBOUNCER_PORT", default_value_t = 6432)]
    pub pgbouncer_port: u16,

    /// Health check runs an authenticated query instead of a port probe.
    #[arg(long, env = "ENHANCED_CHECK", value_parser = BoolishValueParser::new())]
    pub enhanced_check: bool,

    /// Health check also asks the Datadog agent for its health.
    #[arg(
        long = "check-dd-agent",
        env = "CHECK_DD_AGENT",
        value_parser = BoolishValueParser::new()
    )]
    pub check_dd_agent: bool,

    /// Register the /debug endpoints.
    #[arg(long, env = "ENABLE_DEBUG_ENDPOINTS", value_parser = BoolishValueParser::new())]
    pub enable_debug_endpoints: bool,

    /// Deadline applied to every request, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Time in-flight requests get to finish after a shutdown signal, in seconds.
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 10)]
    pub shutdown_grace_secs: u64,

    /// File served by /ami-version.
    #[arg(long, env = "AMI_VERSION_FILE", default_value = "/etc/ami_version")]
    pub version_file: PathBuf,

    /// Maximum number of admin console connections.
    #[arg(long, env = "DB_POOL_SIZE", default_value_t = 4)]
    pub db_pool_size: u32,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.db_pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize);
        }
        let connstr = self.connstr.trim();
        if connstr.is_empty() {
            return Err(ConfigError::EmptyConnstr);
        }
        if !(connstr.starts_with("postgres://") || connstr.starts_with("postgresql://")) {
            let scheme = connstr.split("://").next().unwrap_or_default();
            return Err(ConfigError::UnsupportedScheme(scheme.to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
