//! exporter-metrics — Transmission instruments and the collection loop.
//!
//! Owns the fixed set of Prometheus instruments, projects daemon snapshots
//! onto them, and runs the periodic refresh.
//!
//! # Architecture
//!
//! ```text
//! MetricsRegistry (owned by the process root)
//!   └── encode_text() → text/plain for /metrics endpoint
//!
//! TransmissionMetrics
//!   ├── new(&registry, prefix) ← declares and registers every instrument
//!   └── project(config, stats) ← full re-derivation each tick
//!
//! Collector
//!   ├── tick() → fetch config + stats, then project
//!   └── run()  → periodic loop until shutdown signal
//! ```

pub mod collector;
pub mod projector;
pub mod registry;

pub use collector::Collector;
pub use projector::TransmissionMetrics;
pub use registry::{GaugeSample, MetricsError, MetricsRegistry, MetricsResult};
