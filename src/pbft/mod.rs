//! Consensus-phase behavior of a shard replica.
//!
//! ## Components
//!
//! - [Phase handlers](protocol::PhaseHandler): how a replica reacts at each phase of PBFT. Two
//!   variants are provided: the reduced [two-phase](two_phase) protocol, in which the prepare phase
//!   is a no-op, and the full [three-phase](three_phase) protocol.
//! - [Relay dispatcher](relay): on the leader, classifies every committed transaction, relays the
//!   cross-shard ones to their destination shards, and reports the block.
//! - [Catch-up](catch_up): lets a replica that fell behind replay a contiguous range of blocks its
//!   shard already agreed on.
//!
//! A [`Replica`](replica::Replica) ties a variant's handler to the replica's
//! [`NodeContext`](context::NodeContext).
//!
//! ## Sequence cursor
//!
//! Every replica tracks the height of the next block it expects, its
//! [`sequence_id`](context::NodeContext::sequence_id). A live commit moves it forward by exactly
//! one; a replayed range `seq_start..=seq_end` moves it to `seq_end + 1`. Nothing else moves it.

pub mod catch_up;

pub mod config;

pub mod context;

pub mod messages;

pub mod metrics;

pub mod protocol;

pub mod relay;

pub mod replica;

pub mod three_phase;

pub mod two_phase;
