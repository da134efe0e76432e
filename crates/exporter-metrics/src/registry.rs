//! Process-wide metrics registry.
//!
//! Owned by the process root and handed to the projector at construction.
//! It starts empty: no process or runtime collectors are registered, so the
//! exposition only ever contains the exporter's own instruments.

use std::collections::BTreeMap;

use prometheus::{Encoder, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// One exposed series of a gauge family.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeSample {
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

/// Wrapper around a dedicated Prometheus registry.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    pub fn prometheus_registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode every registered family in the text exposition format.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    /// Current series of the gauge family `name`, in exposition order.
    ///
    /// Returns an empty list for unknown names or families with no series.
    pub fn gauge_samples(&self, name: &str) -> Vec<GaugeSample> {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == name)
            .flat_map(|family| family.get_metric().iter())
            .map(|metric| GaugeSample {
                labels: metric
                    .get_label()
                    .iter()
                    .map(|pair| (pair.get_name().to_string(), pair.get_value().to_string()))
                    .collect(),
                value: metric.get_gauge().get_value(),
            })
            .collect()
    }
}
