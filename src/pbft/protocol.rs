/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The callback contract between a PBFT engine and the protocol variant it runs.
//!
//! A PBFT engine moves each request through `propose → pre-prepare → prepare → commit`, counting
//! quorums and handling view changes on its own. At every step it calls the matching method of a
//! [`PhaseHandler`], which decides whether the replica proceeds and performs the step's side
//! effects on the replica's [`NodeContext`]. Out of band, the engine also calls the handler when a
//! lagging replica asks for, or receives, a range of historical requests.
//!
//! ## Outcomes
//!
//! Every callback returns `Result<_, PbftError>`:
//! - `Ok(true)`: proceed.
//! - `Ok(false)`: rejected. The replica's chain is unchanged, and the engine applies its own retry
//!   or view-change policy.
//! - `Err(PbftError::ProtocolInvariantViolation(..))`: the proposal pipeline produced something
//!   internally inconsistent. Continuing risks the replica silently diverging from its shard, so the
//!   host should halt the replica.
//! - Any other `Err`: a collaborator failed, see [`PbftError`].

use std::fmt::{self, Display, Formatter};

use crate::{
    chain::{Chain, ChainError},
    networking::network::Network,
    types::{
        data_types::{BlockHeight, CryptoHash, ShardID},
        request::Request,
    },
};

use super::{
    context::NodeContext,
    messages::{Commit, PrePrepare, Prepare, RequestOldSeq, SendOldSeq},
    three_phase::ThreePhaseHandler,
    two_phase::TwoPhaseHandler,
};

/// Reactions of one protocol variant to each phase of consensus.
///
/// The engine calls at most one method at a time for a given replica, in phase order. `on_prepare`
/// and `on_old_sequence_request` only get a shared reference to the context: they never change the
/// replica's chain.
pub trait PhaseHandler<C: Chain, N: Network>: Send {
    /// Called on the leader to produce the request to put through consensus.
    fn on_propose(&self, ctx: &mut NodeContext<C, N>) -> Result<Request, PbftError>;

    /// Decide whether to accept a proposal.
    fn on_pre_prepare(&self, ctx: &mut NodeContext<C, N>, msg: &PrePrepare)
        -> Result<bool, PbftError>;

    fn on_prepare(&self, ctx: &NodeContext<C, N>, msg: &Prepare) -> Result<bool, PbftError>;

    /// Append the block of the committed request to the chain.
    fn on_commit(&self, ctx: &mut NodeContext<C, N>, msg: &Commit) -> Result<bool, PbftError>;

    /// Acknowledge a peer's request for historical requests.
    fn on_old_sequence_request(
        &self,
        ctx: &NodeContext<C, N>,
        msg: &RequestOldSeq,
    ) -> Result<bool, PbftError>;

    /// Replay a contiguous range of historical requests.
    fn on_old_sequence_reply(
        &self,
        ctx: &mut NodeContext<C, N>,
        msg: &SendOldSeq,
    ) -> Result<bool, PbftError>;
}

/// The protocol variants that this crate provides [`PhaseHandler`]s for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsensusVariant {
    /// See [`TwoPhaseHandler`].
    TwoPhase,

    /// See [`ThreePhaseHandler`].
    ThreePhase,
}

impl ConsensusVariant {
    pub fn handler<C: Chain, N: Network>(self) -> Box<dyn PhaseHandler<C, N>> {
        match self {
            ConsensusVariant::TwoPhase => Box::new(TwoPhaseHandler),
            ConsensusVariant::ThreePhase => Box::new(ThreePhaseHandler),
        }
    }
}

/// Errors that a [`PhaseHandler`] callback may return.
#[derive(Debug)]
pub enum PbftError {
    /// See [`InvariantViolation`].
    ProtocolInvariantViolation(InvariantViolation),

    /// The [`Chain`] could not produce, or could not store, a block.
    ChainError(ChainError),

    /// A block or request could not be serialized.
    EncodingError(std::io::Error),
}

impl PbftError {
    /// Whether this error is a protocol invariant breach, after which the replica should halt.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, PbftError::ProtocolInvariantViolation(_))
    }
}

impl From<InvariantViolation> for PbftError {
    fn from(value: InvariantViolation) -> Self {
        PbftError::ProtocolInvariantViolation(value)
    }
}

impl From<ChainError> for PbftError {
    fn from(value: ChainError) -> Self {
        PbftError::ChainError(value)
    }
}

impl From<std::io::Error> for PbftError {
    fn from(value: std::io::Error) -> Self {
        PbftError::EncodingError(value)
    }
}

impl Display for PbftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PbftError::ProtocolInvariantViolation(violation) => {
                write!(f, "protocol invariant violation: {}", violation)
            }
            PbftError::ChainError(err) => write!(f, "chain error: {}", err),
            PbftError::EncodingError(err) => write!(f, "encoding error: {}", err),
        }
    }
}

/// Inconsistencies that can only come about if the replica's own proposal pipeline is broken,
/// since by commit time every block has passed pre-prepare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A commit referenced a digest with no pending request.
    MissingRequest { digest: CryptoHash },

    /// The payload of a committed request is not a decodable block.
    UndecodableCommittedBlock { digest: CryptoHash },

    /// A committed transaction that has not been relayed yet belongs to a sender of another shard.
    SenderOutsideShard {
        tx: CryptoHash,
        sender_shard: ShardID,
        committing_shard: ShardID,
    },

    /// A committed transaction that has already been relayed belongs to a recipient of another shard.
    RecipientOutsideShard {
        tx: CryptoHash,
        recipient_shard: ShardID,
        committing_shard: ShardID,
    },

    /// The chain failed to store a replayed block after `applied` earlier blocks of the same range
    /// were stored.
    PartialReplay {
        failed_height: BlockHeight,
        applied: u64,
        reason: ChainError,
    },
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::MissingRequest { digest } => {
                write!(f, "no pending request with digest {}", digest)
            }
            InvariantViolation::UndecodableCommittedBlock { digest } => {
                write!(f, "committed request {} does not hold a block", digest)
            }
            InvariantViolation::SenderOutsideShard {
                tx,
                sender_shard,
                committing_shard,
            } => write!(
                f,
                "unrelayed tx {} has its sender in shard {}, not in shard {}",
                tx, sender_shard, committing_shard
            ),
            InvariantViolation::RecipientOutsideShard {
                tx,
                recipient_shard,
                committing_shard,
            } => write!(
                f,
                "relayed tx {} has its recipient in shard {}, not in shard {}",
                tx, recipient_shard, committing_shard
            ),
            InvariantViolation::PartialReplay {
                failed_height,
                applied,
                reason,
            } => write!(
                f,
                "replay stopped at height {} after {} blocks were stored: {}",
                failed_height, applied, reason
            ),
        }
    }
}
