//! Named status queries against the PGBouncer admin console and their results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One result row: column name to value, in column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The rows returned by a status query, serialized as a JSON array of objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowSet(Vec<Row>);

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self(rows)
    }

    pub fn rows(&self) -> &[Row] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self(rows)
    }
}

/// The admin console views exposed under `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusQuery {
    Users,
    Configs,
    Databases,
    Pools,
    Clients,
    Servers,
    Memory,
    Stats,
}

impl StatusQuery {
    pub const ALL: [StatusQuery; 8] = [
        StatusQuery::Users,
        StatusQuery::Configs,
        StatusQuery::Databases,
        StatusQuery::Pools,
        StatusQuery::Clients,
        StatusQuery::Servers,
        StatusQuery::Memory,
        StatusQuery::Stats,
    ];

    /// Admin console command run for this view.
    pub fn command(self) -> &'static str {
        match self {
            StatusQuery::Users => "SHOW USERS;",
            StatusQuery::Configs => "SHOW CONFIG;",
            StatusQuery::Databases => "SHOW DATABASES;",
            StatusQuery::Pools => "SHOW POOLS;",
            StatusQuery::Clients => "SHOW CLIENTS;",
            StatusQuery::Servers => "SHOW SERVERS;",
            StatusQuery::Memory => "SHOW MEM;",
            StatusQuery::Stats => "SHOW STATS;",
        }
    }

    /// Human-readable name used in error messages.
    pub fn resource(self) -> &'static str {
        match self {
            StatusQuery::Users => "users",
            StatusQuery::Configs => "configs",
            StatusQuery::Databases => "databases",
            StatusQuery::Pools => "pools",
            StatusQuery::Clients => "clients",
            StatusQuery::Servers => "servers",
            StatusQuery::Memory => "mems",
            StatusQuery::Stats => "stats",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            StatusQuery::Users => "/status/users",
            StatusQuery::Configs => "/status/configs",
            StatusQuery::Databases => "/status/databases",
            StatusQuery::Pools => "/status/pools",
            StatusQuery::Clients => "/status/clients",
            StatusQuery::Servers => "/status/servers",
            StatusQuery::Memory => "/status/memory",
            StatusQuery::Stats => "/status/stats",
        }
    }
}

impl fmt::Display for StatusQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource())
    }
}
