//! Metrics collection and exposition for Prometheus.
//!
//! This module provides the metrics registry, the HTTP instrumentation
//! middleware and the connection-pool sampler.

mod body;
mod middleware;
mod recorder;
mod sampler;

pub use body::CountingBody;
pub use middleware::track_http;
pub use recorder::{Metrics, MetricsRecorder};
pub use sampler::{sample_pool, spawn_pool_sampler};
