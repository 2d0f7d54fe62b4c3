//! A simple, volatile, in-memory implementation of [`Chain`].

use std::collections::HashMap;

use shard_pbft::{
    chain::{tx_pool::SharedTxPool, Chain, ChainError},
    types::{
        block::Block,
        data_types::{AccountID, BlockHeight, CryptoHash, NodeID, ShardID, Timestamp},
    },
};

/// An in-memory chain whose partition map is a fixed account-to-shard table.
///
/// Accounts missing from the table belong to shard 0.
pub(crate) struct MemChain {
    blocks: Vec<Block>,
    partition: HashMap<AccountID, ShardID>,
    tx_pool: SharedTxPool,
    block_size: usize,
    fail_generation: bool,
    fail_storage_at: Option<BlockHeight>,
}

impl MemChain {
    pub(crate) fn new(partition: HashMap<AccountID, ShardID>) -> MemChain {
        MemChain {
            blocks: Vec::new(),
            partition,
            tx_pool: SharedTxPool::default(),
            block_size: 100,
            fail_generation: false,
            fail_storage_at: None,
        }
    }

    /// Make every subsequent call to `generate_block` fail.
    pub(crate) fn fail_generation(&mut self) {
        self.fail_generation = true
    }

    /// Make `add_block` fail for the block at `height`.
    pub(crate) fn fail_storage_at(&mut self, height: BlockHeight) {
        self.fail_storage_at = Some(height)
    }

    pub(crate) fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Height of the newest block, 0 if the chain is empty.
    pub(crate) fn height(&self) -> BlockHeight {
        self.blocks
            .last()
            .map(|block| block.height())
            .unwrap_or_default()
    }

    fn head_hash(&self) -> CryptoHash {
        self.blocks
            .last()
            .map(|block| block.hash().unwrap())
            .unwrap_or_default()
    }
}

impl Chain for MemChain {
    fn generate_block(&mut self, producer: NodeID) -> Result<Block, ChainError> {
        if self.fail_generation {
            return Err(ChainError::CannotGenerateBlock {
                reason: String::from("generation disabled"),
            });
        }
        let body = self.tx_pool.lock().pack_txs(self.block_size);
        Ok(Block::new(
            self.height() + 1,
            self.head_hash(),
            producer,
            Timestamp::now(),
            body,
        ))
    }

    fn is_valid_block(&self, block: &Block) -> Result<(), ChainError> {
        if !block.is_correct() {
            return Err(ChainError::InvalidBlock {
                reason: String::from("tx root does not match body"),
            });
        }
        if block.height() != self.height() + 1 {
            return Err(ChainError::InvalidBlock {
                reason: format!("expected height {}", self.height() + 1),
            });
        }
        if block.header.parent_hash != self.head_hash() {
            return Err(ChainError::InvalidBlock {
                reason: String::from("unknown parent"),
            });
        }
        Ok(())
    }

    fn add_block(&mut self, block: Block) -> Result<(), ChainError> {
        if self.fail_storage_at == Some(block.height()) {
            return Err(ChainError::Storage {
                reason: format!("cannot store block {}", block.height()),
            });
        }
        self.blocks.push(block);
        Ok(())
    }

    fn partition_map(&self, account: &AccountID) -> ShardID {
        self.partition
            .get(account)
            .copied()
            .unwrap_or(ShardID::new(0))
    }

    fn tx_pool(&self) -> &SharedTxPool {
        &self.tx_pool
    }

    fn print_block_chain(&self) -> String {
        self.blocks
            .iter()
            .map(|block| format!("#{} ({} txs)", block.height(), block.body.len()))
            .collect::<Vec<_>>()
            .join(" <- ")
    }
}
