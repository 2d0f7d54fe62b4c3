/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The full, three-phase variant of PBFT.
//!
//! Differs from the [two-phase variant](super::two_phase) in pre-prepare and prepare only:
//! - Every replica checks proposed blocks in pre-prepare, regardless of
//!   [`PrePrepareValidation`](super::config::PrePrepareValidation).
//! - A prepare is accepted only if it refers to a request this replica accepted in pre-prepare.
//!
//! Commit, relay, and catch-up behave the same in both variants.

use crate::{chain::Chain, networking::network::Network, types::request::Request};

use super::{
    catch_up,
    context::NodeContext,
    messages::{Commit, PrePrepare, Prepare, RequestOldSeq, SendOldSeq},
    protocol::{PbftError, PhaseHandler},
    two_phase,
};

/// [`PhaseHandler`] of the full, three-phase protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreePhaseHandler;

impl<C: Chain, N: Network> PhaseHandler<C, N> for ThreePhaseHandler {
    fn on_propose(&self, ctx: &mut NodeContext<C, N>) -> Result<Request, PbftError> {
        two_phase::propose(ctx)
    }

    fn on_pre_prepare(
        &self,
        ctx: &mut NodeContext<C, N>,
        msg: &PrePrepare,
    ) -> Result<bool, PbftError> {
        if !two_phase::is_valid_proposal(ctx, &msg.request) {
            return Ok(false);
        }

        if ctx.config.log_events {
            log::info!("{}: accepted proposal {}", ctx.tag(), msg.digest);
        }
        Ok(true)
    }

    fn on_prepare(&self, ctx: &NodeContext<C, N>, msg: &Prepare) -> Result<bool, PbftError> {
        if !ctx.request_pool.contains_key(&msg.digest) {
            log::warn!(
                "{}: prepare from N{} for unknown request {}",
                ctx.tag(),
                msg.sender,
                msg.digest
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn on_commit(&self, ctx: &mut NodeContext<C, N>, msg: &Commit) -> Result<bool, PbftError> {
        two_phase::commit(ctx, msg)
    }

    fn on_old_sequence_request(
        &self,
        ctx: &NodeContext<C, N>,
        msg: &RequestOldSeq,
    ) -> Result<bool, PbftError> {
        catch_up::acknowledge(ctx, msg)
    }

    fn on_old_sequence_reply(
        &self,
        ctx: &mut NodeContext<C, N>,
        msg: &SendOldSeq,
    ) -> Result<bool, PbftError> {
        catch_up::replay(ctx, msg)
    }
}
