pub mod base;
pub mod memory_store;
pub mod postgres_store;

// Re-export the primary Store items so code outside can do
// "use crate::store::{TransactionStore, create_store};"
pub use base::{create_store, NewTransaction, PoolStats, StoreError, TransactionStore};
pub use memory_store::MemoryStore;
pub use postgres_store::PostgresStore;
