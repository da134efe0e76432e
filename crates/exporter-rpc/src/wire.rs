//! JSON shapes of the Transmission RPC protocol.

use serde::Deserialize;

use exporter_core::{AltSpeed, Gated, SessionConfig, SessionStats, StatsWindow};

pub(crate) const SESSION_GET: &str = "session-get";
pub(crate) const SESSION_STATS: &str = "session-stats";

/// Fields requested from `session-get`.
pub(crate) const SESSION_FIELDS: &[&str] = &[
    "speed-limit-down",
    "speed-limit-down-enabled",
    "speed-limit-up",
    "speed-limit-up-enabled",
    "alt-speed-down",
    "alt-speed-up",
    "alt-speed-time-enabled",
    "seedRatioLimit",
    "seedRatioLimited",
    "download-queue-size",
    "download-queue-enabled",
    "seed-queue-size",
    "seed-queue-enabled",
    "peer-limit-global",
    "peer-limit-per-torrent",
    "cache-size-mb",
];

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    pub result: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionGet {
    #[serde(rename = "speed-limit-down")]
    speed_limit_down: f64,
    #[serde(rename = "speed-limit-down-enabled")]
    speed_limit_down_enabled: bool,
    #[serde(rename = "speed-limit-up")]
    speed_limit_up: f64,
    #[serde(rename = "speed-limit-up-enabled")]
    speed_limit_up_enabled: bool,
    #[serde(rename = "alt-speed-down")]
    alt_speed_down: f64,
    #[serde(rename = "alt-speed-up")]
    alt_speed_up: f64,
    #[serde(rename = "alt-speed-time-enabled")]
    alt_speed_time_enabled: bool,
    #[serde(rename = "seedRatioLimit")]
    seed_ratio_limit: f64,
    #[serde(rename = "seedRatioLimited")]
    seed_ratio_limited: bool,
    #[serde(rename = "download-queue-size")]
    download_queue_size: f64,
    #[serde(rename = "download-queue-enabled")]
    download_queue_enabled: bool,
    #[serde(rename = "seed-queue-size")]
    seed_queue_size: f64,
    #[serde(rename = "seed-queue-enabled")]
    seed_queue_enabled: bool,
    #[serde(rename = "peer-limit-global")]
    peer_limit_global: f64,
    #[serde(rename = "peer-limit-per-torrent")]
    peer_limit_per_torrent: f64,
    #[serde(rename = "cache-size-mb")]
    cache_size_mb: f64,
}

impl From<SessionGet> for SessionConfig {
    fn from(s: SessionGet) -> Self {
        SessionConfig {
            speed_limit_down: Gated::new(s.speed_limit_down, s.speed_limit_down_enabled),
            speed_limit_up: Gated::new(s.speed_limit_up, s.speed_limit_up_enabled),
            alt_speed: Gated::new(
                AltSpeed {
                    down: s.alt_speed_down,
                    up: s.alt_speed_up,
                },
                s.alt_speed_time_enabled,
            ),
            seed_ratio_limit: Gated::new(s.seed_ratio_limit, s.seed_ratio_limited),
            download_queue: Gated::new(s.download_queue_size, s.download_queue_enabled),
            seed_queue: Gated::new(s.seed_queue_size, s.seed_queue_enabled),
            peer_limit_global: s.peer_limit_global,
            peer_limit_per_torrent: s.peer_limit_per_torrent,
            cache_size_mb: s.cache_size_mb,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireStatsWindow {
    seconds_active: u64,
    downloaded_bytes: u64,
    uploaded_bytes: u64,
    files_added: u64,
    session_count: u64,
}

impl From<WireStatsWindow> for StatsWindow {
    fn from(w: WireStatsWindow) -> Self {
        StatsWindow {
            seconds_active: w.seconds_active,
            downloaded_bytes: w.downloaded_bytes,
            uploaded_bytes: w.uploaded_bytes,
            files_added: w.files_added,
            session_count: w.session_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionStatsReply {
    download_speed: u64,
    upload_speed: u64,
    active_torrent_count: u64,
    paused_torrent_count: u64,
    torrent_count: u64,
    #[serde(rename = "cumulative-stats")]
    cumulative_stats: WireStatsWindow,
    #[serde(rename = "current-stats")]
    current_stats: WireStatsWindow,
}

impl From<SessionStatsReply> for SessionStats {
    fn from(s: SessionStatsReply) -> Self {
        SessionStats {
            download_speed: s.download_speed,
            upload_speed: s.upload_speed,
            active_torrent_count: s.active_torrent_count,
            paused_torrent_count: s.paused_torrent_count,
            torrent_count: s.torrent_count,
            cumulative: s.cumulative_stats.into(),
            current: s.current_stats.into(),
        }
    }
}
