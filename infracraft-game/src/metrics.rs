//! Metric identifiers and the aggregate snapshot computed for a layout.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics a requirement or component modifier can target.
///
/// `Tps` and `Latency` are backed by dedicated fields on [`LayoutMetrics`];
/// every other metric lives in the open [`MetricMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricType {
    /// Transactions per second
    Tps,
    /// Request latency in milliseconds
    Latency,
    /// Bandwidth in Mbps
    Bandwidth,
    /// Error rate as a fraction (0.01 == 1%)
    ErrorRate,
}

impl MetricType {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Tps => "tps",
            Self::Latency => "latency",
            Self::Bandwidth => "bandwidth",
            Self::ErrorRate => "errorRate",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Open mapping from metric to value. Ordered so snapshots compare and
/// serialize deterministically.
pub type MetricMap = BTreeMap<MetricType, f64>;

/// Snapshot of a layout's aggregate metrics.
///
/// `average_latency` is a running total of the baseline plus every latency
/// delta, not a statistical mean.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    pub total_throughput: f64,
    pub average_latency: f64,
    #[serde(default)]
    pub modifiers: MetricMap,
}

impl LayoutMetrics {
    /// Build a snapshot seeded with the given baseline. The modifier map is
    /// copied so the caller's baseline is never aliased.
    #[must_use]
    pub fn from_baseline(throughput: f64, latency: f64, modifiers: &MetricMap) -> Self {
        Self {
            total_throughput: throughput,
            average_latency: latency,
            modifiers: modifiers.clone(),
        }
    }

    /// Observed value for `metric`; open metrics default to 0 when absent.
    #[must_use]
    pub fn value(&self, metric: MetricType) -> f64 {
        match metric {
            MetricType::Tps => self.total_throughput,
            MetricType::Latency => self.average_latency,
            other => self.modifiers.get(&other).copied().unwrap_or(0.0),
        }
    }

    /// Add `delta` to `metric`, routing `tps` and `latency` to their
    /// dedicated fields.
    pub fn add(&mut self, metric: MetricType, delta: f64) {
        match metric {
            MetricType::Tps => self.total_throughput += delta,
            MetricType::Latency => self.average_latency += delta,
            other => *self.modifiers.entry(other).or_insert(0.0) += delta,
        }
    }
}
