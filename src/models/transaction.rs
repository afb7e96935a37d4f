use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted ledger entry. Rows are immutable once written.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a transaction. Only `completed` is produced today.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(TransactionStatus::Completed),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

/// Body of `POST /transactions`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRequest {
    /// Whether the value may be written to the store.
    pub fn has_positive_value(&self) -> bool {
        self.value > 0.0
    }
}
