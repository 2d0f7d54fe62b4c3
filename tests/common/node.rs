//! Fixtures for building replicas, accounts, and transactions in tests.

use std::sync::mpsc::Receiver;

use rand::Rng;
use shard_pbft::{
    networking::{
        messages::Message,
        network::{Endpoint, NodeTable},
    },
    pbft::{
        config::PbftConfiguration,
        context::NodeContext,
        protocol::ConsensusVariant,
        replica::Replica,
    },
    types::{
        block::Block,
        data_types::{AccountID, BlockHeight, CryptoHash, NodeID, ShardID, Timestamp},
        request::Request,
        transaction::Transaction,
    },
};

use super::{
    mem_chain::MemChain,
    metrics::RecordingSink,
    network::{mock_network, NetworkStub},
};

pub(crate) const NODES_PER_SHARD: u64 = 4;

pub(crate) fn endpoint(shard: u64, node: u64) -> Endpoint {
    Endpoint::new(format!("s{}n{}", shard, node))
}

pub(crate) fn supervisor_endpoint() -> Endpoint {
    Endpoint::new("supervisor")
}

/// A node table with [`NODES_PER_SHARD`] replicas in each of `shard_count` shards, plus the
/// supervisor.
pub(crate) fn node_table(shard_count: u64) -> NodeTable {
    let mut table = NodeTable::new();
    for shard in 0..shard_count {
        table.insert(
            ShardID::new(shard),
            (0..NODES_PER_SHARD).map(|node| endpoint(shard, node)).collect(),
        );
    }
    table.insert(ShardID::SUPERVISOR, vec![supervisor_endpoint()]);
    table
}

/// Configuration of node `node` in shard `shard` with every optional setting at its default.
pub(crate) fn default_config(shard: u64, node: u64, shard_count: u64) -> PbftConfiguration {
    PbftConfiguration::builder()
        .shard_id(ShardID::new(shard))
        .node_id(NodeID::new(node))
        .shard_count(shard_count)
        .build()
}

/// A replica under test, with handles onto everything it sends and records.
pub(crate) struct TestNode {
    pub(crate) replica: Replica<MemChain, NetworkStub>,
    pub(crate) sent: Receiver<(Endpoint, Message)>,
    pub(crate) metrics: RecordingSink,
}

impl TestNode {
    /// Build a replica over `chain` whose sequence cursor expects height `next_height`.
    pub(crate) fn new(
        variant: ConsensusVariant,
        config: PbftConfiguration,
        chain: MemChain,
        next_height: u64,
    ) -> TestNode {
        let (network, sent) = mock_network();
        let metrics = RecordingSink::default();
        let context = NodeContext::builder()
            .node_table(node_table(config.shard_count))
            .config(config)
            .chain(chain)
            .network(network)
            .metrics(Box::new(metrics.clone()))
            .sequence_id(BlockHeight::new(next_height))
            .build();
        TestNode {
            replica: Replica::new(variant, context),
            sent,
            metrics,
        }
    }

    pub(crate) fn chain(&self) -> &MemChain {
        &self.replica.context().chain
    }

    pub(crate) fn chain_mut(&mut self) -> &mut MemChain {
        &mut self.replica.context_mut().chain
    }

    pub(crate) fn sequence_id(&self) -> BlockHeight {
        self.replica.context().sequence_id
    }
}

/// An account with a random, practically unique address.
pub(crate) fn random_account() -> AccountID {
    let address: u64 = rand::thread_rng().gen();
    AccountID::new(format!("{:016x}", address))
}

/// A fresh, unrelayed transaction created `age_millis` milliseconds ago.
pub(crate) fn transaction(sender: &AccountID, recipient: &AccountID, age_millis: u64) -> Transaction {
    let time = Timestamp::from_millis(Timestamp::now().unix_millis() - age_millis);
    Transaction::new(
        sender.clone(),
        recipient.clone(),
        rand::thread_rng().gen(),
        rand::thread_rng().gen_range(1u128, 1_000u128),
        time,
    )
}

/// A block proposal for a block at `height` that no chain has seen, containing `body`.
pub(crate) fn proposal_at(height: u64, body: Vec<Transaction>) -> Request {
    let block = Block::new(
        BlockHeight::new(height),
        CryptoHash::default(),
        NodeID::new(0),
        Timestamp::now(),
        body,
    );
    Request::block_proposal(&block, Timestamp::now()).unwrap()
}
