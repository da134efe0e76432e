//! Projection of daemon snapshots onto Prometheus instruments.
//!
//! Three shapes of instrument:
//!
//! - plain gauges, overwritten every tick;
//! - `enabled`-labelled gauges for gated values, which always expose exactly
//!   one series whose label matches the current flag;
//! - `type`-labelled gauges carrying both the `cumulative` and `current`
//!   statistics windows side by side.

use prometheus::{Gauge, GaugeVec, Opts};

use exporter_core::{SessionConfig, SessionStats, StatsKind, enabled_label};

use crate::registry::{MetricsRegistry, MetricsResult};

/// Speed limits are reported in kB/s and exposed in B/s.
pub const SPEED_LIMIT_SCALE: f64 = 1_000.0;
/// The disk cache size is reported in MB and exposed in bytes.
pub const CACHE_SIZE_SCALE: f64 = 1_000_000.0;

const ENABLED_LABEL: &str = "enabled";
const TYPE_LABEL: &str = "type";

/// Every instrument the exporter publishes.
#[derive(Clone)]
pub struct TransmissionMetrics {
    download_speed: Gauge,
    upload_speed: Gauge,
    speed_limit_down: GaugeVec,
    speed_limit_up: GaugeVec,
    alt_speed_down: GaugeVec,
    alt_speed_up: GaugeVec,
    torrents_active: Gauge,
    torrents_paused: Gauge,
    torrents_total: Gauge,
    down_queue_size: GaugeVec,
    up_queue_size: GaugeVec,
    downloaded_bytes: GaugeVec,
    uploaded_bytes: GaugeVec,
    global_peer_limit: Gauge,
    torrent_peer_limit: Gauge,
    sessions: GaugeVec,
    active: GaugeVec,
    seed_ratio_limit: GaugeVec,
    cache_size_bytes: Gauge,
    files_added: GaugeVec,
}

impl TransmissionMetrics {
    /// Declare all instruments under `prefix` and register them.
    ///
    /// # Errors
    ///
    /// Fails if the prefix yields an invalid metric name or a name is
    /// already registered.
    pub fn new(registry: &MetricsRegistry, prefix: &str) -> MetricsResult<Self> {
        let r = Builder { registry, prefix };

        Ok(Self {
            download_speed: r.gauge(
                "session_stats_download_speed_bytes",
                "Current download speed in bytes",
            )?,
            upload_speed: r.gauge(
                "session_stats_upload_speed_bytes",
                "Current upload speed in bytes",
            )?,
            speed_limit_down: r.gauge_vec(
                "speed_limit_down_bytes",
                "Max global download speed",
                ENABLED_LABEL,
            )?,
            speed_limit_up: r.gauge_vec(
                "speed_limit_up_bytes",
                "Max global upload speed",
                ENABLED_LABEL,
            )?,
            alt_speed_down: r.gauge_vec(
                "alt_speed_down",
                "Alternative max global download speed",
                ENABLED_LABEL,
            )?,
            alt_speed_up: r.gauge_vec(
                "alt_speed_up",
                "Alternative max global upload speed",
                ENABLED_LABEL,
            )?,
            torrents_active: r.gauge(
                "session_stats_torrents_active",
                "The number of active torrents",
            )?,
            torrents_paused: r.gauge(
                "session_stats_torrents_paused",
                "The number of paused torrents",
            )?,
            torrents_total: r.gauge(
                "session_stats_torrents_total",
                "The total number of torrents",
            )?,
            down_queue_size: r.gauge_vec(
                "down_queue_size",
                "Max number of torrents to download at once",
                ENABLED_LABEL,
            )?,
            up_queue_size: r.gauge_vec(
                "up_queue_size",
                "Max number of torrents to upload at once",
                ENABLED_LABEL,
            )?,
            downloaded_bytes: r.gauge_vec(
                "session_stats_downloaded_bytes",
                "The number of downloaded bytes",
                TYPE_LABEL,
            )?,
            uploaded_bytes: r.gauge_vec(
                "session_stats_uploaded_bytes",
                "The number of uploaded bytes",
                TYPE_LABEL,
            )?,
            global_peer_limit: r.gauge("global_peer_limit", "Maximum global number of peers")?,
            torrent_peer_limit: r.gauge(
                "torrent_peer_limit",
                "Maximum number of peers for a single torrent",
            )?,
            sessions: r.gauge_vec(
                "session_stats_sessions",
                "Count of the times transmission started",
                TYPE_LABEL,
            )?,
            active: r.gauge_vec(
                "session_stats_active",
                "The time transmission is active since",
                TYPE_LABEL,
            )?,
            seed_ratio_limit: r.gauge_vec(
                "seed_ratio_limit",
                "The default seed ratio for torrents to use",
                ENABLED_LABEL,
            )?,
            cache_size_bytes: r.gauge("cache_size_bytes", "Maximum size of the disk cache")?,
            files_added: r.gauge_vec(
                "session_stats_files_added",
                "The number of files added",
                TYPE_LABEL,
            )?,
        })
    }

    /// Re-derive every instrument from one pair of snapshots.
    ///
    /// Idempotent: projecting the same snapshots twice exposes the same
    /// values. Each instrument is updated atomically on its own, but the set
    /// as a whole is not, so a concurrent scrape may see a mix of two ticks.
    pub fn project(&self, config: &SessionConfig, stats: &SessionStats) {
        self.download_speed.set(stats.download_speed as f64);
        self.upload_speed.set(stats.upload_speed as f64);
        self.torrents_active.set(stats.active_torrent_count as f64);
        self.torrents_paused.set(stats.paused_torrent_count as f64);
        self.torrents_total.set(stats.torrent_count as f64);
        let cache_size = config.cache_size_mb * CACHE_SIZE_SCALE;
        self.cache_size_bytes.set(cache_size);
        self.global_peer_limit.set(config.peer_limit_global);
        self.torrent_peer_limit.set(config.peer_limit_per_torrent);

        for kind in StatsKind::ALL {
            let window = stats.window(kind);
            let label = [kind.label()];
            self.active
                .with_label_values(&label)
                .set(window.seconds_active as f64);
            self.downloaded_bytes
                .with_label_values(&label)
                .set(window.downloaded_bytes as f64);
            self.uploaded_bytes
                .with_label_values(&label)
                .set(window.uploaded_bytes as f64);
            self.files_added
                .with_label_values(&label)
                .set(window.files_added as f64);
            self.sessions
                .with_label_values(&label)
                .set(window.session_count as f64);
        }

        let limit_down = config.speed_limit_down.value * SPEED_LIMIT_SCALE;
        let limit_up = config.speed_limit_up.value * SPEED_LIMIT_SCALE;
        let alt_down = config.alt_speed.value.down * SPEED_LIMIT_SCALE;
        let alt_up = config.alt_speed.value.up * SPEED_LIMIT_SCALE;

        project_gated(
            &[(&self.speed_limit_down, limit_down)],
            config.speed_limit_down.enabled,
        );
        project_gated(
            &[(&self.speed_limit_up, limit_up)],
            config.speed_limit_up.enabled,
        );
        // One flag governs both directions.
        project_gated(
            &[
                (&self.alt_speed_down, alt_down),
                (&self.alt_speed_up, alt_up),
            ],
            config.alt_speed.enabled,
        );
        project_gated(
            &[(&self.seed_ratio_limit, config.seed_ratio_limit.value)],
            config.seed_ratio_limit.enabled,
        );
        project_gated(
            &[(&self.down_queue_size, config.download_queue.value)],
            config.download_queue.enabled,
        );
        project_gated(
            &[(&self.up_queue_size, config.seed_queue.value)],
            config.seed_queue.enabled,
        );
    }
}

/// Set gated instruments sharing one flag.
///
/// The series for the opposite flag value is dropped from every instrument
/// first, then each instrument gets its single `enabled` series. The label
/// domain is `{0, 1}`, so this leaves exactly one series per instrument. The
/// surviving series is overwritten in place when the flag did not change.
fn project_gated(instruments: &[(&GaugeVec, f64)], enabled: bool) {
    let stale = [enabled_label(!enabled)];
    for (gauge, _) in instruments {
        // Absent when the flag did not flip.
        let _ = gauge.remove_label_values(&stale);
    }

    let live = [enabled_label(enabled)];
    for (gauge, value) in instruments {
        gauge.with_label_values(&live).set(*value);
    }
}

/// Declares instruments under a shared prefix.
struct Builder<'a> {
    registry: &'a MetricsRegistry,
    prefix: &'a str,
}

impl Builder<'_> {
    fn name(&self, suffix: &str) -> String {
        format!("{}_{}", self.prefix, suffix)
    }

    fn gauge(&self, suffix: &str, help: &str) -> MetricsResult<Gauge> {
        let gauge = Gauge::with_opts(Opts::new(self.name(suffix), help))?;
        self.registry
            .prometheus_registry()
            .register(Box::new(gauge.clone()))?;
        Ok(gauge)
    }

    fn gauge_vec(&self, suffix: &str, help: &str, label: &str) -> MetricsResult<GaugeVec> {
        let gauge = GaugeVec::new(Opts::new(self.name(suffix), help), &[label])?;
        self.registry
            .prometheus_registry()
            .register(Box::new(gauge.clone()))?;
        Ok(gauge)
    }
}
