/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The reduced, two-phase variant of PBFT.
//!
//! Requests move through `Idle → Proposed → PrePrepared → Prepared → Committed`, but the prepare
//! phase carries no meaning: [`TwoPhaseHandler::on_prepare`] accepts every message and changes
//! nothing. Collapsing it saves a round trip per block, which is only safe because the shard's fixed
//! leader is trusted for block content. By default, only the leader checks proposed blocks in
//! pre-prepare, and every other replica accepts whatever the leader proposes. Setting
//! [`PrePrepareValidation::AllReplicas`] makes every replica check.
//!
//! On commit, every replica appends the block. The leader additionally relays the block's
//! cross-shard transactions and reports the block (see [`relay`](super::relay)).

use crate::{
    chain::Chain,
    networking::network::Network,
    types::{data_types::Timestamp, request::Request},
};

use super::{
    catch_up,
    config::PrePrepareValidation,
    context::NodeContext,
    messages::{Commit, PrePrepare, Prepare, RequestOldSeq, SendOldSeq},
    protocol::{InvariantViolation, PbftError, PhaseHandler},
    relay,
};

/// [`PhaseHandler`] of the reduced, two-phase protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct TwoPhaseHandler;

impl<C: Chain, N: Network> PhaseHandler<C, N> for TwoPhaseHandler {
    fn on_propose(&self, ctx: &mut NodeContext<C, N>) -> Result<Request, PbftError> {
        propose(ctx)
    }

    fn on_pre_prepare(
        &self,
        ctx: &mut NodeContext<C, N>,
        msg: &PrePrepare,
    ) -> Result<bool, PbftError> {
        let validates = ctx.is_leader()
            || ctx.config.pre_prepare_validation == PrePrepareValidation::AllReplicas;
        if validates && !is_valid_proposal(ctx, &msg.request) {
            return Ok(false);
        }

        if ctx.config.log_events {
            log::info!("{}: accepted proposal {}", ctx.tag(), msg.digest);
        }
        Ok(true)
    }

    fn on_prepare(&self, _ctx: &NodeContext<C, N>, _msg: &Prepare) -> Result<bool, PbftError> {
        Ok(true)
    }

    fn on_commit(&self, ctx: &mut NodeContext<C, N>, msg: &Commit) -> Result<bool, PbftError> {
        commit(ctx, msg)
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

/// Generate the next block and wrap it in a request stamped with the current time.
pub(crate) fn propose<C: Chain, N: Network>(
    ctx: &mut NodeContext<C, N>,
) -> Result<Request, PbftError> {
    let block = match ctx.chain.generate_block(ctx.node_id()) {
        Ok(block) => block,
        Err(err) => {
            log::error!("{}: could not generate a block: {}", ctx.tag(), err);
            return Err(err.into());
        }
    };
    let request = Request::block_proposal(&block, Timestamp::now())?;

    if ctx.config.log_events {
        log::info!(
            "{}: proposing block {} with {} txs",
            ctx.tag(),
            block.height(),
            block.body.len()
        );
    }
    Ok(request)
}

/// Decode the block proposed in `request` and check it against the chain. Logs the reason for any
/// rejection.
pub(crate) fn is_valid_proposal<C: Chain, N: Network>(
    ctx: &NodeContext<C, N>,
    request: &Request,
) -> bool {
    match request.block() {
        Some(Ok(block)) => match ctx.chain.is_valid_block(&block) {
            Ok(()) => true,
            Err(err) => {
                log::warn!(
                    "{}: invalid block {}: {}",
                    ctx.tag(),
                    block.height(),
                    err
                );
                false
            }
        },
        Some(Err(err)) => {
            log::warn!("{}: undecodable block proposal: {}", ctx.tag(), err);
            false
        }
        None => true,
    }
}

/// Append the block of the pending request that `msg` refers to. If this replica is the leader,
/// relay the block's cross-shard transactions. On success, the sequence cursor moves forward by one.
///
/// The request leaves the request pool as soon as it is looked up, so a second commit for the same
/// digest is a [`MissingRequest`](InvariantViolation::MissingRequest).
pub(crate) fn commit<C: Chain, N: Network>(
    ctx: &mut NodeContext<C, N>,
    msg: &Commit,
) -> Result<bool, PbftError> {
    let request = match ctx.request_pool.remove(&msg.digest) {
        Some(request) => request,
        None => {
            let violation = InvariantViolation::MissingRequest { digest: msg.digest };
            log::error!("{}: {}", ctx.tag(), violation);
            return Err(violation.into());
        }
    };
    let block = match request.block() {
        Some(Ok(block)) => block,
        Some(Err(_)) | None => {
            let violation = InvariantViolation::UndecodableCommittedBlock { digest: msg.digest };
            log::error!("{}: {}", ctx.tag(), violation);
            return Err(violation.into());
        }
    };

    if ctx.config.log_events {
        log::info!("{}: adding block {}", ctx.tag(), block.height());
    }
    ctx.chain.add_block(block.clone())?;

    if ctx.is_leader() {
        relay::dispatch(ctx, &block, &request)?;
    }

    ctx.sequence_id += 1;
    Ok(true)
}
