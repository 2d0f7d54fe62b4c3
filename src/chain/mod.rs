/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Pluggable chain: block production, validation, persistence, and the shard partition map.
//!
//! The phase handlers never touch storage directly. Everything they need from the replica's local
//! copy of its shard's chain goes through the [`Chain`] trait, which library users implement on top
//! of their own block store and partitioning scheme.

pub mod tx_pool;

use std::fmt::{self, Display, Formatter};

use crate::types::{
    block::Block,
    data_types::{AccountID, NodeID, ShardID},
};

use self::tx_pool::SharedTxPool;

pub trait Chain: Send + 'static {
    /// Produce the next block on top of the current chain head, packing transactions from the
    /// [pool](Self::tx_pool). `producer` is recorded as the block's miner.
    fn generate_block(&mut self, producer: NodeID) -> Result<Block, ChainError>;

    /// Structural and business-rule checks of a proposed block against the current chain head.
    fn is_valid_block(&self, block: &Block) -> Result<(), ChainError>;

    /// Append `block` to the chain.
    ///
    /// Catch-up calls this once per block of a replayed range. An error partway through leaves the
    /// earlier blocks of the range appended, which replay reports as a protocol invariant violation.
    fn add_block(&mut self, block: Block) -> Result<(), ChainError>;

    /// Get the shard that owns `account`.
    fn partition_map(&self, account: &AccountID) -> ShardID;

    fn tx_pool(&self) -> &SharedTxPool;

    /// Human-readable dump of the chain, logged after catch-up for auditing.
    fn print_block_chain(&self) -> String;
}

/// Errors that a [`Chain`] implementation may report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The block failed validation.
    InvalidBlock { reason: String },

    /// No block could be produced, e.g., because the parent block is missing.
    CannotGenerateBlock { reason: String },

    /// The underlying block store failed.
    Storage { reason: String },
}

impl Display for ChainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::InvalidBlock { reason } => write!(f, "invalid block: {}", reason),
            ChainError::CannotGenerateBlock { reason } => {
                write!(f, "cannot generate block: {}", reason)
            }
            ChainError::Storage { reason } => write!(f, "storage error: {}", reason),
        }
    }
}
