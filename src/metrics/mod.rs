//! Engine metrics (feature `metrics`).
//!
//! Counters are recorded by the engine through [`EngineMetricsRecorder`],
//! read back as an [`EngineMetricsSnapshot`], and published with a
//! [`MetricsExporter`] such as [`PrometheusTextExporter`].

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use exporter::PrometheusTextExporter;
pub use metrics_impl::EngineMetrics;
pub use snapshot::EngineMetricsSnapshot;
pub use traits::{
    EngineMetricsRecorder, MetricsExporter, MetricsReset, MetricsSnapshotProvider,
};
