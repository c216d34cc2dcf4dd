use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::EngineMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for engine metrics snapshots.
///
/// This exporter writes in the Prometheus text exposition format so it can be
/// scraped by Prometheus or forwarded to an OpenTelemetry collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send + Sync> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send + Sync> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, suffix: &str, value: u64) {
        let name = self.metric_name(suffix);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send + Sync> MetricsExporter<EngineMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &EngineMetricsSnapshot) {
        let counters = [
            ("select_calls_total", snapshot.select_calls),
            ("select_found_total", snapshot.select_found),
            ("select_empty_total", snapshot.select_empty),
            ("stale_skips_total", snapshot.stale_skips),
            ("feedback_calls_total", snapshot.feedback_calls),
            ("feedback_not_found_total", snapshot.feedback_not_found),
            ("add_calls_total", snapshot.add_calls),
            ("add_duplicates_total", snapshot.add_duplicates),
            ("remove_calls_total", snapshot.remove_calls),
            ("remove_found_total", snapshot.remove_found),
            ("reweights_total", snapshot.reweights),
            ("invalid_weights_total", snapshot.invalid_weights),
            ("compactions_total", snapshot.compactions),
            ("compacted_entries_total", snapshot.compacted_entries),
        ];
        for (suffix, value) in counters {
            self.write_metric("counter", suffix, value);
        }
        self.write_metric("gauge", "items", snapshot.items as u64);
        self.write_metric("gauge", "queued", snapshot.queued as u64);
        self.write_metric("gauge", "store_len", snapshot.store_len as u64);
    }
}
