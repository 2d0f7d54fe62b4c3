/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Per-block metrics reported by a shard's leader after it commits a block.

use crate::{
    logging::METRICS_TARGET,
    types::{data_types::Timestamp, transaction::Transaction},
};

/// Column names of a metrics row, in the order of [`BlockMetrics::values`].
pub const METRIC_NAMES: [&str; 12] = [
    "Block Height",
    "EpochID of this block",
    "TxPool Size",
    "# of all Txs in this block",
    "# of Inner-shard Txs in this block",
    "# of Relay1 Txs in this block",
    "# of Relay2 Txs in this block",
    "TimeStamp - Propose (unixMill)",
    "TimeStamp - Commit (unixMill)",
    "SUM of confirm latency (ms, All Txs)",
    "SUM of confirm latency (ms, Relay1 Txs)",
    "SUM of confirm latency (ms, Relay2 Txs)",
];

/// Figures describing one committed block.
///
/// "Relay1" transactions are the block's outgoing transactions, "Relay2" transactions are the
/// incoming transactions that completed their second hop in this block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockMetrics {
    pub block_height: u64,
    pub epoch: u64,
    /// Transactions still waiting in the pool after the block was committed.
    pub tx_pool_size: u64,
    pub all_txs: u64,
    pub inner_shard_txs: u64,
    pub relay1_txs: u64,
    pub relay2_txs: u64,
    pub propose_time: Timestamp,
    pub commit_time: Timestamp,
    pub latency_sum_all: i64,
    pub latency_sum_relay1: i64,
    pub latency_sum_relay2: i64,
}

impl BlockMetrics {
    /// The figures as strings, in the order of [`METRIC_NAMES`].
    pub fn values(&self) -> [String; 12] {
        [
            self.block_height.to_string(),
            self.epoch.to_string(),
            self.tx_pool_size.to_string(),
            self.all_txs.to_string(),
            self.inner_shard_txs.to_string(),
            self.relay1_txs.to_string(),
            self.relay2_txs.to_string(),
            self.propose_time.unix_millis().to_string(),
            self.commit_time.unix_millis().to_string(),
            self.latency_sum_all.to_string(),
            self.latency_sum_relay1.to_string(),
            self.latency_sum_relay2.to_string(),
        ]
    }
}

/// Sum over `txs` of the milliseconds between each transaction's creation and `commit_time`.
/// Zero for an empty set.
pub fn confirm_latency_sum<'a>(
    txs: impl IntoIterator<Item = &'a Transaction>,
    commit_time: Timestamp,
) -> i64 {
    txs.into_iter()
        .map(|tx| commit_time.millis_since(tx.time))
        .sum()
}

/// Destination of per-block metrics.
pub trait MetricsSink: Send {
    fn record(&mut self, metrics: &BlockMetrics);
}

/// Logs metrics as CSV rows on the [`METRICS_TARGET`] log target: a header row before the first
/// block, then one row per block.
#[derive(Default)]
pub struct LogMetricsSink {
    header_logged: bool,
}

impl LogMetricsSink {
    pub fn new() -> LogMetricsSink {
        LogMetricsSink::default()
    }
}

impl MetricsSink for LogMetricsSink {
    fn record(&mut self, metrics: &BlockMetrics) {
        if !self.header_logged {
            log::info!(target: METRICS_TARGET, "{}", METRIC_NAMES.join(","));
            self.header_logged = true;
        }
        log::info!(target: METRICS_TARGET, "{}", metrics.values().join(","));
    }
}
