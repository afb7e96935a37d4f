use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::{Stream, TryStreamExt};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Connection, Row};
use tracing::{debug, info, warn};

use super::{NewTransaction, PoolStats, StoreError, TransactionStore};
use crate::models::{Page, Transaction};
use crate::utils::log_throttle::LogThrottle;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id SERIAL PRIMARY KEY,
        value DECIMAL(15,2) NOT NULL,
        timestamp TIMESTAMP NOT NULL,
        status VARCHAR(50) DEFAULT 'completed',
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )"#;

// Columns are cast so the Rust side decodes fixed types regardless of how
// the table was originally created (SERIAL vs BIGSERIAL, DECIMAL precision).
const INSERT: &str = r#"
    INSERT INTO transactions (value, timestamp, status, created_at)
    VALUES ($1::FLOAT8, $2, 'completed', NOW() AT TIME ZONE 'UTC')
    RETURNING id::BIGINT AS id, value::FLOAT8 AS value, timestamp, status, created_at"#;

const LIST: &str = r#"
    SELECT id::BIGINT AS id, value::FLOAT8 AS value, timestamp, status, created_at
    FROM transactions
    ORDER BY created_at DESC, id DESC
    LIMIT $1 OFFSET $2"#;

const GET: &str = r#"
    SELECT id::BIGINT AS id, value::FLOAT8 AS value, timestamp, status, created_at
    FROM transactions
    WHERE id = $1"#;

const DECODE_LOG_WINDOW: Duration = Duration::from_secs(60);

/// A `TransactionStore` backed by a PostgreSQL connection pool.
///
/// Timestamps are stored in `TIMESTAMP` columns as UTC wall-clock values.
pub struct PostgresStore {
    pool: PgPool,
    decode_log: LogThrottle,
}

impl PostgresStore {
    /// Opens the pool. At least one connection is established, so an
    /// unreachable database fails here rather than on the first request.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        info!(max_connections, "Connecting to PostgreSQL");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        PostgresStore {
            pool,
            decode_log: LogThrottle::new(DECODE_LOG_WINDOW),
        }
    }

    /// Creates the `transactions` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        debug!("transactions table ensured");
        Ok(())
    }

    fn skip_row(&self, err: &StoreError) {
        if let Some(suppressed) = self.decode_log.should_emit("list_transactions.decode") {
            warn!(
                error = %err,
                suppressed,
                "Skipping transaction row that failed to decode"
            );
        }
    }
}

fn decode_row(row: &PgRow) -> Result<Transaction, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Decode(e.to_string());

    let status: String = row.try_get("status").map_err(decode)?;
    let timestamp: NaiveDateTime = row.try_get("timestamp").map_err(decode)?;
    let created_at: NaiveDateTime = row.try_get("created_at").map_err(decode)?;

    Ok(Transaction {
        id: row.try_get("id").map_err(decode)?,
        value: row.try_get("value").map_err(decode)?,
        timestamp: timestamp.and_utc(),
        status: status.parse().map_err(StoreError::Decode)?,
        created_at: created_at.and_utc(),
    })
}

/// Drains `rows`, keeping what `decode` accepts. A fetch error aborts the
/// listing; a row that fails to decode goes to `on_skip` and is dropped.
async fn collect_decoded<S, T, D, K>(
    mut rows: S,
    decode: D,
    mut on_skip: K,
) -> Result<Vec<Transaction>, StoreError>
where
    S: Stream<Item = Result<T, sqlx::Error>> + Unpin,
    D: Fn(&T) -> Result<Transaction, StoreError>,
    K: FnMut(&StoreError),
{
    let mut transactions = Vec::new();
    while let Some(row) = rows.try_next().await? {
        match decode(&row) {
            Ok(txn) => transactions.push(txn),
            Err(e) => on_skip(&e),
        }
    }
    Ok(transactions)
}

#[async_trait]
impl TransactionStore for PostgresStore {
    async fn insert(&self, txn: NewTransaction) -> Result<Transaction, StoreError> {
        let row = sqlx::query(INSERT)
            .bind(txn.value)
            .bind(txn.timestamp.naive_utc())
            .fetch_one(&self.pool)
            .await?;
        decode_row(&row)
    }

    async fn list(&self, page: Page) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query(LIST)
            .bind(page.limit)
            .bind(page.offset)
            .fetch(&self.pool);

        collect_decoded(rows, decode_row, |e| self.skip_row(e)).await
    }

    async fn get(&self, id: i64) -> Result<Option<Transaction>, StoreError> {
        let row = sqlx::query(GET)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    fn pool_stats(&self) -> PoolStats {
        let open = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX);
        PoolStats {
            max_open: self.pool.options().get_max_connections(),
            open,
            in_use: open.saturating_sub(idle),
            idle,
        }
    }
}
