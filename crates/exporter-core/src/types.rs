//! Snapshot types shared across the exporter crates.
//!
//! A snapshot is an owned, point-in-time copy of the daemon's state. It is
//! fetched fresh for every collection tick and dropped after projection.

/// A value paired with the flag that says whether the daemon enforces it.
///
/// The value is always present, even when the feature is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gated<T> {
    pub value: T,
    pub enabled: bool,
}

impl<T> Gated<T> {
    pub fn new(value: T, enabled: bool) -> Self {
        Self { value, enabled }
    }

    /// The `enabled` label value for this pair: `"1"` or `"0"`.
    pub fn label(&self) -> &'static str {
        enabled_label(self.enabled)
    }
}

/// Render an enabled flag as a metric label value.
pub fn enabled_label(enabled: bool) -> &'static str {
    if enabled { "1" } else { "0" }
}

/// Alternative ("turtle") speed limits in kB/s. Both directions share one flag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AltSpeed {
    pub down: f64,
    pub up: f64,
}

// ── Session configuration ──────────────────────────────────────────

/// Session configuration as reported by `session-get`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionConfig {
    /// Global download limit in kB/s.
    pub speed_limit_down: Gated<f64>,
    /// Global upload limit in kB/s.
    pub speed_limit_up: Gated<f64>,
    /// Scheduled alternative speed limits.
    pub alt_speed: Gated<AltSpeed>,
    pub seed_ratio_limit: Gated<f64>,
    /// Max torrents downloading at once.
    pub download_queue: Gated<f64>,
    /// Max torrents seeding at once.
    pub seed_queue: Gated<f64>,
    pub peer_limit_global: f64,
    pub peer_limit_per_torrent: f64,
    /// Disk cache size in MB.
    pub cache_size_mb: f64,
}

// ── Session statistics ─────────────────────────────────────────────

/// Which statistics window a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsKind {
    /// Since the daemon was first used.
    Cumulative,
    /// Since the daemon process started. Resets on restart.
    Current,
}

impl StatsKind {
    pub const ALL: [StatsKind; 2] = [StatsKind::Cumulative, StatsKind::Current];

    /// The `type` label value.
    pub fn label(&self) -> &'static str {
        match self {
            StatsKind::Cumulative => "cumulative",
            StatsKind::Current => "current",
        }
    }
}

/// Counters for one statistics window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsWindow {
    pub seconds_active: u64,
    pub downloaded_bytes: u64,
    pub uploaded_bytes: u64,
    pub files_added: u64,
    pub session_count: u64,
}

/// Session statistics as reported by `session-stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Bytes per second.
    pub download_speed: u64,
    /// Bytes per second.
    pub upload_speed: u64,
    pub active_torrent_count: u64,
    pub paused_torrent_count: u64,
    pub torrent_count: u64,
    pub cumulative: StatsWindow,
    pub current: StatsWindow,
}

impl SessionStats {
    pub fn window(&self, kind: StatsKind) -> &StatsWindow {
        match kind {
            StatsKind::Cumulative => &self.cumulative,
            StatsKind::Current => &self.current,
        }
    }
}
