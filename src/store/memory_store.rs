use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{NewTransaction, PoolStats, StoreError, TransactionStore};
use crate::models::{Page, Transaction, TransactionStatus};

/// A volatile `TransactionStore` kept in process memory.
///
/// It has no connection pool; `pool_stats` reports the configured maximum and
/// zero connections. `set_reachable(false)` makes every operation fail, which
/// mimics a database outage.
pub struct MemoryStore {
    rows: RwLock<Vec<Transaction>>,
    next_id: AtomicI64,
    reachable: AtomicBool,
    max_connections: u32,
}

impl MemoryStore {
    pub fn new(max_connections: u32) -> Self {
        MemoryStore {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            reachable: AtomicBool::new(true),
            max_connections,
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store marked unreachable".into()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert(&self, txn: NewTransaction) -> Result<Transaction, StoreError> {
        self.check_reachable()?;
        let mut rows = self.rows.write().await;
        let row = Transaction {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            value: txn.value,
            timestamp: txn.timestamp,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list(&self, page: Page) -> Result<Vec<Transaction>, StoreError> {
        self.check_reachable()?;
        let rows = self.rows.read().await;
        let mut sorted: Vec<&Transaction> = rows.iter().collect();
        sorted.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(sorted
            .into_iter()
            .skip(usize::try_from(page.offset).unwrap_or(0))
            .take(usize::try_from(page.limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Transaction>, StoreError> {
        self.check_reachable()?;
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|t| t.id == id).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()
    }

    fn pool_stats(&self) -> PoolStats {
        PoolStats {
            max_open: self.max_connections,
            ..PoolStats::default()
        }
    }
}
