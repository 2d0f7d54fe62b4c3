/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for the 'block' type and its associated methods.

use borsh::{BorshDeserialize, BorshSerialize};

use super::{
    crypto_primitives::hash_borsh,
    data_types::{BlockHeight, CryptoHash, NodeID, Timestamp},
    merkle::MerkleTree,
    transaction::Transaction,
};

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BlockHeader {
    pub number: BlockHeight,
    pub parent_hash: CryptoHash,
    /// Root of the [`MerkleTree`] over the hashes of the block's body.
    pub tx_root: CryptoHash,
    /// The replica that produced the block.
    pub miner: NodeID,
    pub time: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub body: Vec<Transaction>,
}

impl Block {
    pub fn new(
        number: BlockHeight,
        parent_hash: CryptoHash,
        miner: NodeID,
        time: Timestamp,
        body: Vec<Transaction>,
    ) -> Block {
        Block {
            header: BlockHeader {
                number,
                parent_hash,
                tx_root: Block::tx_tree(&body).root(),
                miner,
                time,
            },
            body,
        }
    }

    pub fn height(&self) -> BlockHeight {
        self.header.number
    }

    /// Hash of the block's header. The body is covered through `tx_root`.
    pub fn hash(&self) -> Result<CryptoHash, std::io::Error> {
        hash_borsh(&self.header)
    }

    /// Build the Merkle tree over the hashes of `body`, in order.
    pub fn tx_tree(body: &[Transaction]) -> MerkleTree {
        MerkleTree::new(body.iter().map(|tx| tx.hash).collect())
    }

    /// Checks that `tx_root` commits to the body and every transaction hash is well-formed.
    pub fn is_correct(&self) -> bool {
        self.header.tx_root == Block::tx_tree(&self.body).root()
            && self.body.iter().all(Transaction::is_correct)
    }

    pub fn encode(&self) -> Result<Vec<u8>, std::io::Error> {
        self.try_to_vec()
    }

    pub fn decode(bytes: &[u8]) -> Result<Block, std::io::Error> {
        Block::try_from_slice(bytes)
    }
}
