/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The engine-facing side of a replica.
//!
//! A [`Replica`] pairs a replica's [`NodeContext`] with the [`PhaseHandler`] of the protocol variant
//! it runs, and performs the bookkeeping that surrounds each callback: attaching digests and
//! sequence numbers to proposals, and remembering accepted requests until they commit. Quorum
//! counting, message authentication, and view changes belong to the engine that drives it.
//!
//! ## Example
//!
//! ```ignore
//! let mut leader = Replica::new(ConsensusVariant::TwoPhase, leader_context);
//! let mut follower = Replica::new(ConsensusVariant::TwoPhase, follower_context);
//!
//! let pre_prepare = leader.propose()?;
//! assert!(leader.on_pre_prepare(&pre_prepare)?);
//! assert!(follower.on_pre_prepare(&pre_prepare)?);
//!
//! let commit = Commit { digest: pre_prepare.digest, seq_id: pre_prepare.seq_id, sender: NodeID::new(0) };
//! leader.handle_message(commit.clone().into())?;
//! follower.handle_message(commit.into())?;
//! ```

use crate::{chain::Chain, networking::network::Network};

use super::{
    context::NodeContext,
    messages::{PbftMessage, PrePrepare},
    protocol::{ConsensusVariant, PbftError, PhaseHandler},
};

pub struct Replica<C: Chain, N: Network> {
    handler: Box<dyn PhaseHandler<C, N>>,
    context: NodeContext<C, N>,
}

impl<C: Chain, N: Network> Replica<C, N> {
    /// Create a replica that runs one of the built-in protocol variants.
    pub fn new(variant: ConsensusVariant, context: NodeContext<C, N>) -> Self {
        Self::with_handler(variant.handler(), context)
    }

    /// Create a replica that runs a custom protocol variant.
    pub fn with_handler(handler: Box<dyn PhaseHandler<C, N>>, context: NodeContext<C, N>) -> Self {
        Self { handler, context }
    }

    pub fn context(&self) -> &NodeContext<C, N> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut NodeContext<C, N> {
        &mut self.context
    }

    /// Propose a new request, at the current sequence cursor.
    pub fn propose(&mut self) -> Result<PrePrepare, PbftError> {
        let request = self.handler.on_propose(&mut self.context)?;
        let digest = request.digest()?;
        Ok(PrePrepare {
            request,
            digest,
            seq_id: self.context.sequence_id,
        })
    }

    /// Decide whether to accept `msg`. Accepted requests are kept until they are committed.
    ///
    /// A pre-prepare whose digest does not match its request is rejected without consulting the
    /// handler.
    pub fn on_pre_prepare(&mut self, msg: &PrePrepare) -> Result<bool, PbftError> {
        if msg.request.digest()? != msg.digest {
            log::warn!(
                "{}: pre-prepare digest {} does not match its request",
                self.context.tag(),
                msg.digest
            );
            return Ok(false);
        }

        let accepted = self.handler.on_pre_prepare(&mut self.context, msg)?;
        if accepted {
            self.context
                .request_pool
                .insert(msg.digest, msg.request.clone());
        }
        Ok(accepted)
    }

    /// Route `msg` to the matching callback.
    pub fn handle_message(&mut self, msg: PbftMessage) -> Result<bool, PbftError> {
        match msg {
            PbftMessage::PrePrepare(pre_prepare) => self.on_pre_prepare(&pre_prepare),
            PbftMessage::Prepare(prepare) => self.handler.on_prepare(&self.context, &prepare),
            PbftMessage::Commit(commit) => self.handler.on_commit(&mut self.context, &commit),
            PbftMessage::RequestOldSeq(request) => self
                .handler
                .on_old_sequence_request(&self.context, &request),
            PbftMessage::SendOldSeq(reply) => self
                .handler
                .on_old_sequence_reply(&mut self.context, &reply),
        }
    }
}
