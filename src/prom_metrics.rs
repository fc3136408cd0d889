//! # Prometheus Metrics — Exposition for Container Orchestration
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `skyline_illuminations_total` | Counter | `model` | Successful lights (`window` / `building`) |
//! | `skyline_rejections_total` | Counter | `reason` | Requests refused by validation or the store |
//! | `skyline_resets_total` | Counter | — | Global resets |
//! | `skyline_lit_windows` | Gauge | — | Lit windows, refreshed on scrape |
//! | `skyline_lit_buildings` | Gauge | — | Lit buildings, refreshed on scrape |
//! | `skyline_http_request_duration_seconds` | Histogram | `method`, `path` | Request latency |

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct ModelLabel {
    pub model: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct ReasonLabel {
    pub reason: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct HttpLabel {
    pub method: String,
    pub path: String,
}

type HistogramFamily = Family<HttpLabel, Histogram, fn() -> Histogram>;

fn latency_histogram() -> Histogram {
    Histogram::new(exponential_buckets(0.001, 2.0, 14))
}

/// Thread-safe metrics registry. All metric handles are atomics and may be
/// updated from any task.
pub struct Metrics {
    pub registry: Registry,
    pub illuminations: Family<ModelLabel, Counter>,
    pub rejections: Family<ReasonLabel, Counter>,
    pub resets: Counter,
    pub lit_windows: Gauge,
    pub lit_buildings: Gauge,
    pub http_request_duration: HistogramFamily,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let illuminations = Family::<ModelLabel, Counter>::default();
        registry.register(
            "skyline_illuminations",
            "Successful illuminations by model",
            illuminations.clone(),
        );

        let rejections = Family::<ReasonLabel, Counter>::default();
        registry.register(
            "skyline_rejections",
            "Rejected illumination requests by reason",
            rejections.clone(),
        );

        let resets = Counter::default();
        registry.register("skyline_resets", "Global skyline resets", resets.clone());

        let lit_windows = Gauge::default();
        registry.register(
            "skyline_lit_windows",
            "Number of currently lit windows",
            lit_windows.clone(),
        );

        let lit_buildings = Gauge::default();
        registry.register(
            "skyline_lit_buildings",
            "Number of currently lit buildings",
            lit_buildings.clone(),
        );

        let http_request_duration: HistogramFamily =
            Family::new_with_constructor(latency_histogram as fn() -> Histogram);
        registry.register(
            "skyline_http_request_duration_seconds",
            "HTTP request latency by method and normalized path",
            http_request_duration.clone(),
        );

        Self {
            registry,
            illuminations,
            rejections,
            resets,
            lit_windows,
            lit_buildings,
            http_request_duration,
        }
    }

    pub fn record_illumination(&self, model: &str) {
        self.illuminations
            .get_or_create(&ModelLabel {
                model: model.to_string(),
            })
            .inc();
    }

    pub fn record_rejection(&self, reason: &str) {
        self.rejections
            .get_or_create(&ReasonLabel {
                reason: reason.to_string(),
            })
            .inc();
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        // Writing into a String cannot fail
        let _ = encode(&mut buf, &self.registry);
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_encode_returns_valid_text() {
        let m = Metrics::new();
        m.lit_windows.set(5);
        m.record_illumination("window");
        m.record_rejection("validation");

        let output = m.encode();
        assert!(output.contains("skyline_lit_windows 5"));
        assert!(output.contains("skyline_illuminations_total{model=\"window\"} 1"));
        assert!(output.contains("reason=\"validation\""));
    }

    #[test]
    fn metrics_default_values_are_zero() {
        let output = Metrics::new().encode();
        assert!(output.contains("skyline_resets_total 0"));
        assert!(output.contains("skyline_lit_buildings 0"));
    }

    #[test]
    fn per_model_counters_independent() {
        let m = Metrics::new();
        for _ in 0..3 {
            m.record_illumination("window");
        }
        m.record_illumination("building");

        let output = m.encode();
        assert!(output.contains("skyline_illuminations_total{model=\"window\"} 3"));
        assert!(output.contains("skyline_illuminations_total{model=\"building\"} 1"));
    }

    #[test]
    fn latency_histogram_is_registered() {
        let m = Metrics::new();
        m.http_request_duration
            .get_or_create(&HttpLabel {
                method: "GET".into(),
                path: "/api/stats".into(),
            })
            .observe(0.004);
        assert!(m.encode().contains("skyline_http_request_duration_seconds_bucket"));
    }
}
