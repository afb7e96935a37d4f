//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! configuration, the transaction store and the metrics registry.

use crate::config::Config;
use crate::metrics::Metrics;
use crate::store::TransactionStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request handler; every field is a handle to
/// the single instance built at startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup. The router takes its
    /// body limit from here and `startup::serve` the sampler interval.
    pub config: Arc<Config>,
    /// Persistence for ledger entries.
    pub store: Arc<dyn TransactionStore>,
    /// Metrics registry shared with the middleware and the pool sampler.
    pub metrics: Metrics,
}
