//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting and export are separate responsibilities so the
//! engine only ever writes counters and never knows who reads them.
//!
//! ## Architecture
//!
//! ```text
//!                     ┌─────────────────────────────┐
//!                     │    EngineMetricsRecorder    │
//!                     │  select/stale/feedback/add  │
//!                     │  remove/compact/invalid     │
//!                     └──────────────┬──────────────┘
//!                                    │
//!                                    ▼
//!                            ┌──────────────┐
//!                            │ EngineMetrics│
//!                            └──────┬───────┘
//!                                   │
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters for the selection engine.
pub trait EngineMetricsRecorder {
    fn record_select_call(&mut self);
    fn record_select_found(&mut self);
    fn record_select_empty(&mut self);
    fn record_stale_skip(&mut self);
    fn record_feedback_call(&mut self);
    fn record_feedback_not_found(&mut self);
    fn record_add_call(&mut self);
    fn record_add_duplicate(&mut self);
    fn record_remove_call(&mut self);
    fn record_remove_found(&mut self);
    fn record_reweight(&mut self);
    fn record_invalid_weight(&mut self);
    fn record_compaction(&mut self, discarded: usize);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&mut self);
}

/// Publish snapshots to a monitoring backend.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
