/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Cross-shard relay of committed transactions, and per-block reporting.
//!
//! After the leader of a shard commits a block, [`dispatch`] turns the block into:
//! 1. Relay traffic: every transaction whose recipient lives in another shard is marked `relayed`
//!    and sent to the leader of the recipient's shard, which will commit it a second time.
//! 2. A [`BlockInfo`] report for the supervisor.
//! 3. A [`BlockMetrics`] row for the replica's [`MetricsSink`](super::metrics::MetricsSink).
//!
//! ## Classification
//!
//! Every transaction in a committed block is exactly one of:
//! - [`Outgoing`](RelayClass::Outgoing) ("Relay1"): its recipient lives in another shard.
//! - [`IncomingExecuted`](RelayClass::IncomingExecuted) ("Relay2"): it was relayed here from its
//!   sender's shard and its recipient lives in this shard.
//! - [`Local`](RelayClass::Local) ("inner-shard"): both its sender and its recipient live in this
//!   shard.
//!
//! Before classifying, the committing shard's ownership rules are checked: an unrelayed transaction
//! must have its sender in this shard, and a relayed one must have its recipient in this shard. A
//! transaction that breaks either rule is an [`InvariantViolation`].
//!
//! ## Non-blocking sends
//!
//! Relay messages and the supervisor report are sent on threads of their own, so that commit never
//! waits on other shards. Failed deliveries are not retried here.

use std::collections::HashMap;

use crate::{
    chain::Chain,
    networking::network::Network,
    types::{
        block::Block,
        data_types::{CryptoHash, ShardID, Timestamp},
        merkle::MerkleProof,
        request::Request,
        transaction::Transaction,
    },
};

use super::{
    config::RelayMode,
    context::NodeContext,
    messages::{BlockInfo, Relay, RelayWithProof},
    metrics::{confirm_latency_sum, BlockMetrics},
    protocol::{InvariantViolation, PbftError},
};

/// Epoch reported for every block. Epochs are not tracked by this protocol.
const EPOCH: u64 = 0;

/// The category of a committed transaction. See the [module docs](self#classification).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayClass {
    Local,
    Outgoing { destination: ShardID },
    IncomingExecuted,
}

/// Classify `tx`, committed by `committing_shard`.
pub fn classify_transaction<C: Chain>(
    chain: &C,
    committing_shard: ShardID,
    tx: &Transaction,
) -> Result<RelayClass, InvariantViolation> {
    let sender_shard = chain.partition_map(&tx.sender);
    let recipient_shard = chain.partition_map(&tx.recipient);

    if !tx.relayed && sender_shard != committing_shard {
        return Err(InvariantViolation::SenderOutsideShard {
            tx: tx.hash,
            sender_shard,
            committing_shard,
        });
    }
    if tx.relayed && recipient_shard != committing_shard {
        return Err(InvariantViolation::RecipientOutsideShard {
            tx: tx.hash,
            recipient_shard,
            committing_shard,
        });
    }

    if recipient_shard != committing_shard {
        Ok(RelayClass::Outgoing {
            destination: recipient_shard,
        })
    } else if tx.relayed {
        Ok(RelayClass::IncomingExecuted)
    } else {
        Ok(RelayClass::Local)
    }
}

/// A committed block's body, split into the three relay categories.
///
/// Outgoing transactions already have `relayed` set. Transactions keep their body order within
/// each category.
#[derive(Clone, Debug, Default)]
pub struct Classification {
    pub inner_shard: Vec<Transaction>,
    pub relay1: Vec<(ShardID, Transaction)>,
    pub relay2: Vec<Transaction>,
}

impl Classification {
    pub fn relay1_txs(&self) -> impl Iterator<Item = &Transaction> {
        self.relay1.iter().map(|(_, tx)| tx)
    }
}

/// Classify every transaction in `body`, stopping at the first invariant violation.
pub fn classify_block<C: Chain>(
    chain: &C,
    committing_shard: ShardID,
    body: &[Transaction],
) -> Result<Classification, InvariantViolation> {
    let mut classification = Classification::default();
    for tx in body {
        match classify_transaction(chain, committing_shard, tx)? {
            RelayClass::Local => classification.inner_shard.push(tx.clone()),
            RelayClass::Outgoing { destination } => {
                let mut tx = tx.clone();
                tx.relayed = true;
                classification.relay1.push((destination, tx));
            }
            RelayClass::IncomingExecuted => classification.relay2.push(tx.clone()),
        }
    }
    Ok(classification)
}

/// Relay the outgoing transactions of `block`, which was just committed from `request`, and report
/// the block to the supervisor and to the metrics sink.
pub(crate) fn dispatch<C: Chain, N: Network>(
    ctx: &mut NodeContext<C, N>,
    block: &Block,
    request: &Request,
) -> Result<(), PbftError> {
    let tag = ctx.tag();
    let shard_id = ctx.shard_id();
    if ctx.config.log_events {
        log::info!("{}: sending relay txs at height {}", tag, block.height());
    }

    // 1. Reset the relay pool, classify, and queue this block's outgoing transactions.
    let classification = {
        let mut pool = ctx.chain.tx_pool().lock();
        pool.clear_relay_pool();
        let classification = match classify_block(&ctx.chain, shard_id, &block.body) {
            Ok(classification) => classification,
            Err(violation) => {
                log::error!("{}: incorrect tx at height {}: {}", tag, block.height(), violation);
                return Err(violation.into());
            }
        };
        for (destination, tx) in &classification.relay1 {
            pool.add_relay_tx(tx.clone(), *destination);
        }
        classification
    };

    // 2. Send the queued transactions to every other shard.
    match ctx.config.relay_mode {
        RelayMode::Plain => send_relays(ctx),
        RelayMode::WithMerkleProof => send_relays_with_proof(ctx, block),
    }

    // 3. Report the block to the supervisor.
    let commit_time = Timestamp::now();
    let block_info = BlockInfo {
        block_body_length: block.body.len() as u64,
        inner_shard_txs: classification.inner_shard.clone(),
        epoch: EPOCH,
        relay1_txs: classification.relay1_txs().cloned().collect(),
        relay2_txs: classification.relay2.clone(),
        sender_shard: shard_id,
        propose_time: request.propose_time,
        commit_time,
    };
    let supervisor = ctx.config.supervisor_shard;
    match ctx.node_table.shard_endpoints(supervisor).first() {
        Some(endpoint) => {
            ctx.sender().send_detached(endpoint.clone(), block_info);
            if ctx.config.log_events {
                log::info!("{}: sent executed txs", tag);
            }
        }
        None => log::warn!("{}: no endpoint for supervisor shard {}", tag, supervisor),
    }

    // 4. Record metrics. The pool stays locked until the sink returns, so the row reflects a single
    //    state of the pool.
    let pool = ctx.chain.tx_pool().lock();
    let metrics = BlockMetrics {
        block_height: block.height().int(),
        epoch: EPOCH,
        tx_pool_size: pool.size() as u64,
        all_txs: block.body.len() as u64,
        inner_shard_txs: classification.inner_shard.len() as u64,
        relay1_txs: classification.relay1.len() as u64,
        relay2_txs: classification.relay2.len() as u64,
        propose_time: request.propose_time,
        commit_time,
        latency_sum_all: confirm_latency_sum(&block.body, commit_time),
        latency_sum_relay1: confirm_latency_sum(classification.relay1_txs(), commit_time),
        latency_sum_relay2: confirm_latency_sum(&classification.relay2, commit_time),
    };
    ctx.metrics.record(&metrics);
    drop(pool);

    Ok(())
}

/// Shards that relay messages go to: every shard except this one.
fn destinations<C: Chain, N: Network>(ctx: &NodeContext<C, N>) -> impl Iterator<Item = ShardID> {
    let shard_id = ctx.shard_id();
    (0..ctx.config.shard_count)
        .map(ShardID::new)
        .filter(move |shard| *shard != shard_id)
}

fn send_relays<C: Chain, N: Network>(ctx: &NodeContext<C, N>) {
    let sender = ctx.sender();
    let mut pool = ctx.chain.tx_pool().lock();
    for destination in destinations(ctx) {
        let relay = Relay {
            txs: pool.relay_txs(destination).to_vec(),
            sender_shard: ctx.shard_id(),
            sender_seq: ctx.sequence_id,
        };
        match ctx.node_table.endpoint(destination, ctx.config.leader_id) {
            Some(endpoint) => {
                sender.send_detached(endpoint.clone(), relay);
            }
            None => log::warn!("{}: no endpoint for shard {}", ctx.tag(), destination),
        }
    }
    pool.clear_relay_pool();
}

fn send_relays_with_proof<C: Chain, N: Network>(ctx: &NodeContext<C, N>, block: &Block) {
    let sender = ctx.sender();
    let tree = Block::tx_tree(&block.body);
    let mut positions: HashMap<CryptoHash, usize> = HashMap::new();
    for (index, tx) in block.body.iter().enumerate() {
        positions.entry(tx.hash).or_insert(index);
    }

    let mut pool = ctx.chain.tx_pool().lock();
    for destination in destinations(ctx) {
        let (txs, proofs): (Vec<Transaction>, Vec<MerkleProof>) = pool
            .relay_txs(destination)
            .iter()
            .filter_map(|tx| {
                let proof = positions.get(&tx.hash).and_then(|index| tree.proof(*index))?;
                Some((tx.clone(), proof))
            })
            .unzip();
        let relay = RelayWithProof {
            txs,
            proofs,
            tx_root: block.header.tx_root,
            sender_shard: ctx.shard_id(),
            sender_seq: ctx.sequence_id,
        };
        match ctx.node_table.endpoint(destination, ctx.config.leader_id) {
            Some(endpoint) => {
                sender.send_detached(endpoint.clone(), relay);
            }
            None => log::warn!("{}: no endpoint for shard {}", ctx.tag(), destination),
        }
    }
    pool.clear_relay_pool();
}
