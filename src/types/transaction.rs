/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for the 'transaction' type and its associated methods.

use borsh::{BorshDeserialize, BorshSerialize};

use super::{
    crypto_primitives::{CryptoHasher, Digest},
    data_types::{AccountID, CryptoHash, Timestamp},
};

/// A transfer of `value` from `sender` to `recipient`.
///
/// # Relaying
///
/// A transaction whose recipient lives in another shard is committed twice: first in the sender's
/// shard, after which it is relayed to the recipient's shard with `relayed` set to `true`, and then
/// in the recipient's shard. Consequently:
/// - A transaction with `relayed == false` must have its sender in the committing shard.
/// - A transaction with `relayed == true` must have its recipient in the committing shard.
///
/// # Identity
///
/// `hash` covers every field except `relayed`, so a transaction keeps its identity (and its leaf in
/// its block's transaction Merkle tree) across both hops.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Transaction {
    pub sender: AccountID,
    pub recipient: AccountID,
    pub nonce: u64,
    pub value: u128,
    /// When the transaction was created. Confirmation latency is measured from here.
    pub time: Timestamp,
    pub hash: CryptoHash,
    pub relayed: bool,
}

impl Transaction {
    pub fn new(
        sender: AccountID,
        recipient: AccountID,
        nonce: u64,
        value: u128,
        time: Timestamp,
    ) -> Transaction {
        Transaction {
            hash: Transaction::hash(&sender, &recipient, nonce, value, time),
            sender,
            recipient,
            nonce,
            value,
            time,
            relayed: false,
        }
    }

    pub fn hash(
        sender: &AccountID,
        recipient: &AccountID,
        nonce: u64,
        value: u128,
        time: Timestamp,
    ) -> CryptoHash {
        let mut hasher = CryptoHasher::new();
        hasher.update(sender.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(recipient.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(nonce.to_le_bytes());
        hasher.update(value.to_le_bytes());
        hasher.update(time.unix_millis().to_le_bytes());
        CryptoHash::new(hasher.finalize().into())
    }

    /// Checks that `hash` matches the transaction's contents.
    pub fn is_correct(&self) -> bool {
        self.hash
            == Transaction::hash(
                &self.sender,
                &self.recipient,
                self.nonce,
                self.value,
                self.time,
            )
    }
}
