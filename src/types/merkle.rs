/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Binary Merkle trees over transaction hashes.
//!
//! Every block header commits to its body through a `tx_root`. When a leader relays a transaction to
//! another shard with proofs enabled, it attaches a [`MerkleProof`] that lets the destination check
//! the transaction was included in a block with that root, without trusting the sending shard's
//! leader for anything but the root itself.
//!
//! ## Tree shape
//!
//! Leaves are the transactions' [hashes](super::transaction::Transaction::hash), in body order. Each
//! level pairs adjacent nodes left-to-right and hashes every pair with
//! [`hash_pair`](super::crypto_primitives::hash_pair). A node left without a partner at the end of a
//! level is carried up unchanged. The root of an empty tree is the all-zeros hash.

use borsh::{BorshDeserialize, BorshSerialize};

use super::{crypto_primitives::hash_pair, data_types::CryptoHash};

/// A Merkle tree with all of its levels materialized, `levels[0]` being the leaves.
pub struct MerkleTree {
    levels: Vec<Vec<CryptoHash>>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<CryptoHash>) -> MerkleTree {
        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let next = levels[levels.len() - 1]
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair(left, right),
                    [single] => *single,
                    _ => unreachable!(),
                })
                .collect();
            levels.push(next);
        }
        MerkleTree { levels }
    }

    pub fn root(&self) -> CryptoHash {
        self.levels
            .last()
            .and_then(|top| top.first().copied())
            .unwrap_or_default()
    }

    /// Get the inclusion proof of the leaf at `index`, or `None` if there is no such leaf.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.levels[0].len() {
            return None;
        }

        let mut steps = Vec::new();
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = position ^ 1;
            if sibling < level.len() {
                let side = if sibling < position {
                    Side::Left
                } else {
                    Side::Right
                };
                steps.push(ProofStep {
                    sibling: level[sibling],
                    side,
                });
            }
            position /= 2;
        }

        Some(MerkleProof { steps })
    }
}

/// Which side of the running hash a [`ProofStep`]'s sibling sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProofStep {
    pub sibling: CryptoHash,
    pub side: Side,
}

/// Path of sibling hashes from a leaf up to the root of a [`MerkleTree`].
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MerkleProof {
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Checks whether this proof links `leaf` to `root`.
    pub fn verify(&self, leaf: &CryptoHash, root: &CryptoHash) -> bool {
        let computed = self.steps.iter().fold(*leaf, |acc, step| match step.side {
            Side::Left => hash_pair(&step.sibling, &acc),
            Side::Right => hash_pair(&acc, &step.sibling),
        });
        computed == *root
    }
}
