//! The sidecar's route table.

use std::path::PathBuf;

use sidecar_config::Config;
use sidecar_core::{HealthEvaluator, HealthPolicy, Producer, StatusQuery};
use tracing::info;

use crate::registry::RegistryBuilder;

const MEMINFO_FILE: &str = "/proc/meminfo";

/// Inputs that decide which routes exist and what they read.
#[derive(Debug, Clone)]
pub struct RouteOptions {
    pub version_file: PathBuf,
    pub health: HealthPolicy,
    pub debug_endpoints: bool,
}

impl From<&Config> for RouteOptions {
    fn from(config: &Config) -> Self {
        Self {
            version_file: config.version_file.clone(),
            health: HealthPolicy {
                pooler_port: config.pgbouncer_port,
                enhanced_check: config.enhanced_check,
                check_agent: config.check_dd_agent,
            },
            debug_endpoints: config.enable_debug_endpoints,
        }
    }
}

pub fn register_all(builder: &mut RegistryBuilder, options: &RouteOptions) {
    builder
        .get("/", Producer::Static)
        .get("/ami-version", Producer::file("version info", &options.version_file))
        .get("/health", Producer::Health(HealthEvaluator::new(options.health)));

    for query in StatusQuery::ALL {
        builder.get(query.path(), Producer::Query(query));
    }

    if options.debug_endpoints {
        info!("Enabling debug endpoints");
        register_debug(builder);
    }
}

fn register_debug(builder: &mut RegistryBuilder) {
    builder
        .get(
            "/debug/dmesg",
            Producer::command("kernel logs", "dmesg", Vec::<String>::new()),
        )
        .get(
            "/debug/processes",
            Producer::command(
                "process list",
                "ps",
                ["-eo", "user,pid,ppid,c,stime,tty,%cpu,%mem,vsz,rsz,cmd"],
            ),
        )
        .get(
            "/debug/logs",
            Producer::command(
                "logs",
                "journalctl",
                ["--reverse", "-b", "--no-pager", "-n", "50"],
            ),
        )
        .get("/debug/meminfo", Producer::file("memory data", MEMINFO_FILE));
}
