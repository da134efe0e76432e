//! Collection loop — polls the daemon and refreshes the instruments.
//!
//! One tick is fetch config, fetch stats, project. Ticks run strictly one
//! after another with a fixed sleep in between; a slow tick delays the next
//! one instead of overlapping it.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use exporter_rpc::{SnapshotSource, SourceError};

use crate::projector::TransmissionMetrics;

/// Drives a [`SnapshotSource`] into [`TransmissionMetrics`] on a fixed interval.
pub struct Collector<S> {
    source: S,
    metrics: TransmissionMetrics,
    interval: Duration,
}

impl<S: SnapshotSource> Collector<S> {
    pub fn new(source: S, metrics: TransmissionMetrics, interval: Duration) -> Self {
        Self {
            source,
            metrics,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one fetch-and-project cycle.
    ///
    /// Both snapshots are fetched before any instrument is touched, so a
    /// failed fetch leaves every exposed value as it was.
    pub async fn tick(&self) -> Result<(), SourceError> {
        let config = self.source.fetch_config().await?;
        let stats = self.source.fetch_stats().await?;
        self.metrics.project(&config, &stats);
        Ok(())
    }

    /// Tick immediately, then once per interval, until shutdown.
    ///
    /// Fetch failures are logged and the tick is skipped; the interval is
    /// the only retry delay. Dropping the shutdown sender also stops the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "metrics collector started"
        );

        loop {
            match self.tick().await {
                Ok(()) => debug!("metrics refreshed"),
                Err(e) => warn!(error = %e, "metrics refresh failed, keeping previous values"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    info!("metrics collector shutting down");
                    break;
                }
            }
        }
    }
}
