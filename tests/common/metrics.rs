use std::sync::{Arc, Mutex};

use shard_pbft::pbft::metrics::{BlockMetrics, MetricsSink};

/// A metrics sink that keeps every row it receives. Clones share the same rows, so a test can keep
/// one clone while the replica owns another.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink(Arc<Mutex<Vec<BlockMetrics>>>);

impl RecordingSink {
    pub(crate) fn rows(&self) -> Vec<BlockMetrics> {
        self.0.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingSink {
    fn record(&mut self, metrics: &BlockMetrics) {
        self.0.lock().unwrap().push(metrics.clone())
    }
}
