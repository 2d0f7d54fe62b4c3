/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Catching up on missed blocks by replaying requests that a peer already agreed on.
//!
//! A replica that finds itself behind sends a [`RequestOldSeq`] for a height range to a peer, which
//! answers with a [`SendOldSeq`] carrying the requests agreed on at every height in the range.
//! Assembling the answer is the storage layer's job; the handler only acknowledges the request.
//!
//! ## Replay
//!
//! A reply is applied all-or-nothing. It is rejected without touching the chain if:
//! 1. It does not carry exactly one request per height in `seq_start..=seq_end`, or
//! 2. One of its block proposals cannot be decoded.
//!
//! Otherwise every block is appended in ascending height order, and the sequence cursor jumps to
//! `seq_end + 1`. Blocks are not re-validated: they were validated when their shard first committed
//! them. Requests that are not block proposals take up a height but append nothing.
//!
//! If the chain fails to store one of the blocks, the blocks before it stay appended and the cursor
//! does not move. The replica's chain then holds part of a range, so replay reports this as an
//! [`InvariantViolation::PartialReplay`] and the host should halt the replica.

use crate::{chain::Chain, networking::network::Network, types::data_types::BlockHeight};

use super::{
    context::NodeContext,
    messages::{RequestOldSeq, SendOldSeq},
    protocol::{InvariantViolation, PbftError},
};

pub(crate) fn acknowledge<C: Chain, N: Network>(
    ctx: &NodeContext<C, N>,
    msg: &RequestOldSeq,
) -> Result<bool, PbftError> {
    if ctx.config.log_events {
        log::info!(
            "{}: N{} requested old requests {}..={}",
            ctx.tag(),
            msg.sender,
            msg.seq_start,
            msg.seq_end
        );
    }
    Ok(true)
}

pub(crate) fn replay<C: Chain, N: Network>(
    ctx: &mut NodeContext<C, N>,
    msg: &SendOldSeq,
) -> Result<bool, PbftError> {
    let expected_len = range_len(msg.seq_start, msg.seq_end);
    if expected_len != Some(msg.old_requests.len() as u64) {
        log::warn!(
            "{}: incomplete SendOldSeq, {} requests for heights {}..={}",
            ctx.tag(),
            msg.old_requests.len(),
            msg.seq_start,
            msg.seq_end
        );
        return Ok(false);
    }

    let mut blocks = Vec::with_capacity(msg.old_requests.len());
    for (offset, request) in msg.old_requests.iter().enumerate() {
        match request.block() {
            Some(Ok(block)) => blocks.push(block),
            Some(Err(err)) => {
                log::warn!(
                    "{}: undecodable block in SendOldSeq at height {}: {}",
                    ctx.tag(),
                    msg.seq_start + offset as u64,
                    err
                );
                return Ok(false);
            }
            None => (),
        }
    }

    for (applied, block) in blocks.into_iter().enumerate() {
        let height = block.height();
        if let Err(err) = ctx.chain.add_block(block) {
            let violation = InvariantViolation::PartialReplay {
                failed_height: height,
                applied: applied as u64,
                reason: err,
            };
            log::error!("{}: {}", ctx.tag(), violation);
            return Err(violation.into());
        }
    }
    ctx.sequence_id = msg.seq_end + 1;

    if ctx.config.log_events {
        log::info!(
            "{}: replayed heights {}..={}, next sequence {}",
            ctx.tag(),
            msg.seq_start,
            msg.seq_end,
            ctx.sequence_id
        );
    }
    log::debug!("{}: {}", ctx.tag(), ctx.chain.print_block_chain());
    Ok(true)
}

/// Number of heights in `start..=end`, or `None` if the range is inverted by more than one.
fn range_len(start: BlockHeight, end: BlockHeight) -> Option<u64> {
    end.int().checked_add(1)?.checked_sub(start.int())
}
