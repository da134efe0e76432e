use std::future::Future;

use exporter_core::{SessionConfig, SessionStats};

use crate::SourceError;

/// Produces fresh snapshots of the daemon's state on demand.
pub trait SnapshotSource: Send + Sync {
    fn fetch_config(&self) -> impl Future<Output = Result<SessionConfig, SourceError>> + Send;

    fn fetch_stats(&self) -> impl Future<Output = Result<SessionStats, SourceError>> + Send;
}
