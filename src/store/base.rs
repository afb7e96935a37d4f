use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use super::{memory_store::MemoryStore, postgres_store::PostgresStore};
use crate::config::{Config, StoreBackend};
use crate::models::{Page, Transaction};

/// Failures talking to the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("row decode failed: {0}")]
    Decode(String),
}

/// Connection counts read from the pool. Reading these never performs I/O.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub max_open: u32,
    pub open: u32,
    pub in_use: u32,
    pub idle: u32,
}

/// Validated input for a new row; `id`, `status` and `created_at` are assigned
/// by the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewTransaction {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// The TransactionStore trait abstracts persistence of ledger entries.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a row with status `completed` and returns it as persisted.
    async fn insert(&self, txn: NewTransaction) -> Result<Transaction, StoreError>;
    /// Newest first. Rows that cannot be decoded are skipped, not reported.
    async fn list(&self, page: Page) -> Result<Vec<Transaction>, StoreError>;
    async fn get(&self, id: i64) -> Result<Option<Transaction>, StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
    fn pool_stats(&self) -> PoolStats;
}

/// Creates the store selected by `store.backend`. For Postgres this connects
/// and creates the schema, so an error here means the service cannot run.
pub async fn create_store(config: &Config) -> Result<Arc<dyn TransactionStore>, StoreError> {
    match config.store.backend {
        StoreBackend::Postgres => {
            let store = PostgresStore::connect(
                &config.database_url,
                config.store.max_connections,
                Duration::from_secs(config.store.acquire_timeout_secs),
            )
            .await?;
            store.ensure_schema().await?;
            info!("Connected to PostgreSQL store.");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Using in-memory transaction store; data will not survive a restart.");
            Ok(Arc::new(MemoryStore::new(config.store.max_connections)))
        }
    }
}
