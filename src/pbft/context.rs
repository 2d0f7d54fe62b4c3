/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Per-replica state and collaborators, passed into every phase callback.

use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use typed_builder::TypedBuilder;

use crate::{
    chain::Chain,
    networking::{
        network::{Network, NodeTable},
        sending::SenderHandle,
    },
    types::{
        data_types::{BlockHeight, CryptoHash, NodeID, ShardID},
        request::Request,
    },
};

use super::{config::PbftConfiguration, metrics::MetricsSink};

/// Everything a phase callback may read or change on behalf of one replica.
///
/// Identities live here rather than in globals, so that several simulated replicas (of one shard
/// or of many) can run side by side in the same process.
///
/// ## Building a context
///
/// ```ignore
/// let context = NodeContext::builder()
///     .config(configuration)
///     .chain(chain)
///     .network(network)
///     .node_table(node_table)
///     .metrics(Box::new(LogMetricsSink::new()))
///     .build();
/// ```
///
/// `request_pool` and `sequence_id` start empty and at height 0 unless set.
#[derive(TypedBuilder)]
pub struct NodeContext<C: Chain, N: Network> {
    pub config: PbftConfiguration,
    pub chain: C,
    network: N,
    pub node_table: NodeTable,
    pub metrics: Box<dyn MetricsSink>,

    /// Requests accepted in pre-prepare, keyed by digest, awaiting commit.
    #[builder(default)]
    pub request_pool: HashMap<CryptoHash, Request>,

    /// The sequence cursor: the height of the next block this replica expects to accept.
    #[builder(default)]
    pub sequence_id: BlockHeight,
}

impl<C: Chain, N: Network> NodeContext<C, N> {
    pub fn shard_id(&self) -> ShardID {
        self.config.shard_id
    }

    pub fn node_id(&self) -> NodeID {
        self.config.node_id
    }

    pub fn is_leader(&self) -> bool {
        self.config.is_leader()
    }

    pub(crate) fn sender(&self) -> SenderHandle<N> {
        SenderHandle::new(self.network.clone())
    }

    /// Identity prefix for log lines.
    pub(crate) fn tag(&self) -> ReplicaTag {
        ReplicaTag {
            shard: self.config.shard_id,
            node: self.config.node_id,
        }
    }
}

/// Displays as `S{shard}N{node}`.
#[derive(Clone, Copy)]
pub(crate) struct ReplicaTag {
    shard: ShardID,
    node: NodeID,
}

impl Display for ReplicaTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "S{}N{}", self.shard, self.node)
    }
}
