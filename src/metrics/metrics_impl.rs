use crate::metrics::snapshot::EngineMetricsSnapshot;
use crate::metrics::traits::{EngineMetricsRecorder, MetricsReset};

#[derive(Debug, Default, Clone)]
pub struct EngineMetrics {
    pub select_calls: u64,
    pub select_found: u64,
    pub select_empty: u64,
    pub stale_skips: u64,
    pub feedback_calls: u64,
    pub feedback_not_found: u64,
    pub add_calls: u64,
    pub add_duplicates: u64,
    pub remove_calls: u64,
    pub remove_found: u64,
    pub reweights: u64,
    pub invalid_weights: u64,
    pub compactions: u64,
    pub compacted_entries: u64,
}

impl EngineMetrics {
    pub fn new() -> EngineMetrics {
        Self::default()
    }

    /// Copies counters and attaches gauges read by the caller.
    pub fn snapshot_with(&self, items: usize, queued: usize, store_len: usize) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            select_calls: self.select_calls,
            select_found: self.select_found,
            select_empty: self.select_empty,
            stale_skips: self.stale_skips,
            feedback_calls: self.feedback_calls,
            feedback_not_found: self.feedback_not_found,
            add_calls: self.add_calls,
            add_duplicates: self.add_duplicates,
            remove_calls: self.remove_calls,
            remove_found: self.remove_found,
            reweights: self.reweights,
            invalid_weights: self.invalid_weights,
            compactions: self.compactions,
            compacted_entries: self.compacted_entries,
            items,
            queued,
            store_len,
        }
    }
}

impl EngineMetricsRecorder for EngineMetrics {
    fn record_select_call(&mut self) {
        self.select_calls += 1;
    }

    fn record_select_found(&mut self) {
        self.select_found += 1;
    }

    fn record_select_empty(&mut self) {
        self.select_empty += 1;
    }

    fn record_stale_skip(&mut self) {
        self.stale_skips += 1;
    }

    fn record_feedback_call(&mut self) {
        self.feedback_calls += 1;
    }

    fn record_feedback_not_found(&mut self) {
        self.feedback_not_found += 1;
    }

    fn record_add_call(&mut self) {
        self.add_calls += 1;
    }

    fn record_add_duplicate(&mut self) {
        self.add_duplicates += 1;
    }

    fn record_remove_call(&mut self) {
        self.remove_calls += 1;
    }

    fn record_remove_found(&mut self) {
        self.remove_found += 1;
    }

    fn record_reweight(&mut self) {
        self.reweights += 1;
    }

    fn record_invalid_weight(&mut self) {
        self.invalid_weights += 1;
    }

    fn record_compaction(&mut self, discarded: usize) {
        self.compactions += 1;
        self.compacted_entries += discarded as u64;
    }
}

impl MetricsReset for EngineMetrics {
    fn reset_metrics(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_reset() {
        let mut metrics = EngineMetrics::new();
        metrics.record_select_call();
        metrics.record_select_found();
        metrics.record_stale_skip();
        metrics.record_stale_skip();
        metrics.record_compaction(5);

        let snapshot = metrics.snapshot_with(3, 2, 4);
        assert_eq!(snapshot.select_calls, 1);
        assert_eq!(snapshot.stale_skips, 2);
        assert_eq!(snapshot.compacted_entries, 5);
        assert_eq!((snapshot.items, snapshot.queued, snapshot.store_len), (3, 2, 4));

        metrics.reset_metrics();
        assert_eq!(metrics.snapshot_with(0, 0, 0), EngineMetricsSnapshot::default());
    }
}
