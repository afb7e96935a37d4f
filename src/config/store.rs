use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Transaction store settings. The connection string itself lives at the top
/// level (`database_url`) so the plain `DATABASE_URL` variable can set it.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long a request waits for a pooled connection before failing.
    pub acquire_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::Postgres,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

/// Available store backends, selected with `store.backend` in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    /// Volatile store for local runs and tests; nothing survives a restart.
    Memory,
}
