/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for the messages exchanged by replicas within a shard, between shard leaders, and
//! between shard leaders and the supervisor.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::{
    data_types::{BlockHeight, CryptoHash, NodeID, ShardID, Timestamp},
    merkle::MerkleProof,
    request::Request,
    transaction::Transaction,
};

/// Messages that drive a request through consensus inside one shard, plus the messages of the
/// catch-up protocol.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum PbftMessage {
    PrePrepare(PrePrepare),
    Prepare(Prepare),
    Commit(Commit),
    RequestOldSeq(RequestOldSeq),
    SendOldSeq(SendOldSeq),
}

impl From<PrePrepare> for PbftMessage {
    fn from(value: PrePrepare) -> Self {
        PbftMessage::PrePrepare(value)
    }
}

impl From<Prepare> for PbftMessage {
    fn from(value: Prepare) -> Self {
        PbftMessage::Prepare(value)
    }
}

impl From<Commit> for PbftMessage {
    fn from(value: Commit) -> Self {
        PbftMessage::Commit(value)
    }
}

impl From<RequestOldSeq> for PbftMessage {
    fn from(value: RequestOldSeq) -> Self {
        PbftMessage::RequestOldSeq(value)
    }
}

impl From<SendOldSeq> for PbftMessage {
    fn from(value: SendOldSeq) -> Self {
        PbftMessage::SendOldSeq(value)
    }
}

/// Broadcast by the leader to start consensus on `request`.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct PrePrepare {
    pub request: Request,
    pub digest: CryptoHash,
    pub seq_id: BlockHeight,
}

#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct Prepare {
    pub digest: CryptoHash,
    pub seq_id: BlockHeight,
    pub sender: NodeID,
}

#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct Commit {
    pub digest: CryptoHash,
    pub seq_id: BlockHeight,
    pub sender: NodeID,
}

/// Sent by a lagging replica to `server` to ask for the requests agreed on at heights
/// `seq_start..=seq_end`.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct RequestOldSeq {
    pub seq_start: BlockHeight,
    pub seq_end: BlockHeight,
    pub server: NodeID,
    pub sender: NodeID,
}

/// Reply to a [`RequestOldSeq`]. `old_requests[i]` is the request agreed on at `seq_start + i`.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct SendOldSeq {
    pub seq_start: BlockHeight,
    pub seq_end: BlockHeight,
    pub old_requests: Vec<Request>,
    pub sender: NodeID,
}

/// Transactions relayed from the shard that committed them to the shard of their recipients.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum RelayMessage {
    Relay(Relay),
    RelayWithProof(RelayWithProof),
}

#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct Relay {
    pub txs: Vec<Transaction>,
    pub sender_shard: ShardID,
    /// The sending replica's sequence cursor when the relay was sent.
    pub sender_seq: BlockHeight,
}

/// Like [`Relay`], but every transaction comes with a proof of its inclusion in a block whose
/// transaction root is `tx_root`.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct RelayWithProof {
    pub txs: Vec<Transaction>,
    pub proofs: Vec<MerkleProof>,
    pub tx_root: CryptoHash,
    pub sender_shard: ShardID,
    pub sender_seq: BlockHeight,
}

impl RelayWithProof {
    /// Checks that every transaction is well-formed and has a proof linking it to `tx_root`.
    pub fn verify(&self) -> bool {
        self.txs.len() == self.proofs.len()
            && self
                .txs
                .iter()
                .zip(&self.proofs)
                .all(|(tx, proof)| tx.is_correct() && proof.verify(&tx.hash, &self.tx_root))
    }
}

/// Per-block report sent by a shard leader to the supervisor after commit.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct BlockInfo {
    pub block_body_length: u64,
    pub inner_shard_txs: Vec<Transaction>,
    pub epoch: u64,
    pub relay1_txs: Vec<Transaction>,
    pub relay2_txs: Vec<Transaction>,
    pub sender_shard: ShardID,
    pub propose_time: Timestamp,
    pub commit_time: Timestamp,
}
