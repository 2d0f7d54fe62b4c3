/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! User-defined parameters of a replica.
//!
//! The configuration is defined using the builder pattern, for example:
//!
//! ```ignore
//! let configuration =
//!     PbftConfiguration::builder()
//!     .shard_id(ShardID::new(1))
//!     .node_id(NodeID::new(0))
//!     .shard_count(4)
//!     .relay_mode(RelayMode::WithMerkleProof)
//!     .build();
//! ```

use typed_builder::TypedBuilder;

use crate::types::data_types::{NodeID, ShardID};

/// Stores the user-defined parameters of a replica, that is:
/// 1. Its identity: the shard it replicates and its index in that shard's replica group.
/// 2. The index of the shard's fixed leader, which proposes every block.
/// 3. The number of shards, which determines the shards that a leader sends relay messages to.
/// 4. How relayed transactions are sent to other shards ([`RelayMode`]).
/// 5. Which replicas validate blocks in the pre-prepare phase ([`PrePrepareValidation`]).
/// 6. The pseudo-shard under which the supervisor is registered in the node table.
/// 7. The "Log Events" flag: if `false`, per-phase progress lines are not logged. Rejections and
///    invariant breaches are logged regardless.
#[derive(Clone, Debug, TypedBuilder)]
pub struct PbftConfiguration {
    pub shard_id: ShardID,
    pub node_id: NodeID,
    #[builder(default = NodeID::new(0))]
    pub leader_id: NodeID,
    pub shard_count: u64,
    #[builder(default = RelayMode::Plain)]
    pub relay_mode: RelayMode,
    #[builder(default = PrePrepareValidation::LeaderOnly)]
    pub pre_prepare_validation: PrePrepareValidation,
    #[builder(default = ShardID::SUPERVISOR)]
    pub supervisor_shard: ShardID,
    #[builder(default = true)]
    pub log_events: bool,
}

impl PbftConfiguration {
    /// Whether this replica is its shard's fixed leader.
    pub fn is_leader(&self) -> bool {
        self.node_id == self.leader_id
    }
}

/// How a leader sends committed cross-shard transactions to their destination shards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayMode {
    /// One [`Relay`](super::messages::Relay) per destination shard, carrying the transactions only.
    Plain,

    /// One [`RelayWithProof`](super::messages::RelayWithProof) per destination shard, carrying a
    /// Merkle inclusion proof for every transaction, for destinations that verify provenance instead
    /// of trusting the sending shard.
    WithMerkleProof,
}

/// Which replicas check a proposed block with [`Chain::is_valid_block`](crate::chain::Chain::is_valid_block)
/// before accepting a pre-prepare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrePrepareValidation {
    /// Only the leader validates; every other replica trusts the leader for block content. This is
    /// what the two-phase variant does by default.
    LeaderOnly,

    /// Every replica validates independently.
    AllReplicas,
}
