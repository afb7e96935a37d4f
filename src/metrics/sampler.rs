//! Background task mirroring connection-pool statistics into gauges.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::recorder::MetricsRecorder;
use crate::store::TransactionStore;

/// Reads the pool counters once and writes them to the recorder.
pub fn sample_pool<R: MetricsRecorder>(store: &dyn TransactionStore, recorder: &R) {
    let stats = store.pool_stats();
    debug!(?stats, "sampled connection pool");
    recorder.record_pool_stats(&stats);
}

/// Spawns the pool sampler.
///
/// It samples immediately, then once per `period`, until `shutdown` changes
/// or its sender is dropped. Sampling never blocks on the database.
pub fn spawn_pool_sampler<R: MetricsRecorder>(
    store: Arc<dyn TransactionStore>,
    recorder: R,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        info!(period_secs = period.as_secs_f64(), "Connection-pool sampler started");

        loop {
            sample_pool(store.as_ref(), &recorder);
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Connection-pool sampler stopped");
    })
}
