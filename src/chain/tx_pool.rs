/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The transaction pool shared between a replica's chain and its relay dispatcher.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::types::{data_types::ShardID, transaction::Transaction};

/// Transactions waiting to be packed into a block, plus the transactions a leader has committed
/// and still has to relay to other shards.
///
/// The relay pool only ever holds the outgoing transactions of the most recently committed block:
/// the relay dispatcher [clears](Self::clear_relay_pool) it before classifying a block and again
/// after the block's relay messages have been sent.
#[derive(Default)]
pub struct TxPool {
    tx_queue: VecDeque<Transaction>,
    relay_pool: BTreeMap<ShardID, Vec<Transaction>>,
}

impl TxPool {
    pub fn new() -> TxPool {
        TxPool::default()
    }

    /// Append `txs` to the back of the queue.
    pub fn add_txs(&mut self, txs: impl IntoIterator<Item = Transaction>) {
        self.tx_queue.extend(txs)
    }

    /// Remove and return up to `max` transactions from the front of the queue.
    pub fn pack_txs(&mut self, max: usize) -> Vec<Transaction> {
        let count = max.min(self.tx_queue.len());
        self.tx_queue.drain(..count).collect()
    }

    /// Number of transactions waiting in the queue.
    pub fn size(&self) -> usize {
        self.tx_queue.len()
    }

    /// Queue `tx` for relay to `destination`.
    pub fn add_relay_tx(&mut self, tx: Transaction, destination: ShardID) {
        self.relay_pool.entry(destination).or_default().push(tx)
    }

    /// Transactions queued for relay to `destination`, in commit order.
    pub fn relay_txs(&self, destination: ShardID) -> &[Transaction] {
        self.relay_pool
            .get(&destination)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate through the destinations that have at least one transaction queued for relay.
    pub fn relay_destinations(&self) -> impl Iterator<Item = ShardID> + '_ {
        self.relay_pool
            .iter()
            .filter(|(_, txs)| !txs.is_empty())
            .map(|(shard, _)| *shard)
    }

    pub fn clear_relay_pool(&mut self) {
        self.relay_pool.clear()
    }
}

/// Cloneable handle to a [`TxPool`] behind a mutex.
///
/// Every access goes through [`lock`](Self::lock), whose guard releases the pool when dropped,
/// including on early returns and error paths.
#[derive(Clone, Default)]
pub struct SharedTxPool(Arc<Mutex<TxPool>>);

impl SharedTxPool {
    pub fn new(pool: TxPool) -> SharedTxPool {
        SharedTxPool(Arc::new(Mutex::new(pool)))
    }

    /// Acquire exclusive access to the pool.
    ///
    /// A pool whose previous holder panicked is still handed out: the pool has no invariants that a
    /// partially-completed operation could break.
    pub fn lock(&self) -> MutexGuard<'_, TxPool> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
