#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineMetricsSnapshot {
    pub select_calls: u64,
    pub select_found: u64,
    pub select_empty: u64,
    pub stale_skips: u64, // popped entries superseded or belonging to removed items

    pub feedback_calls: u64,
    pub feedback_not_found: u64,

    pub add_calls: u64,
    pub add_duplicates: u64,

    pub remove_calls: u64,
    pub remove_found: u64,

    pub reweights: u64, // entries pushed, including initial weights
    pub invalid_weights: u64,

    pub compactions: u64,
    pub compacted_entries: u64,

    // gauges captured at snapshot time
    pub items: usize,
    pub queued: usize,
    pub store_len: usize,
}
