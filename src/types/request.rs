/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Units of consensus work.

use borsh::{BorshDeserialize, BorshSerialize};

use super::{
    block::Block,
    crypto_primitives::hash_borsh,
    data_types::{CryptoHash, Timestamp},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum RequestKind {
    /// The payload is an encoded [`Block`].
    BlockProposal,
}

/// A request that replicas agree on through consensus.
///
/// Requests are created by the leader when it proposes, and are immutable from then on. Replicas
/// key pending requests by their [digest](Self::digest) so that commit messages, which only carry
/// the digest, can be matched back to the request.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Request {
    pub kind: RequestKind,
    pub payload: Vec<u8>,
    pub propose_time: Timestamp,
}

impl Request {
    /// Wrap `block` into a block proposal stamped with `propose_time`.
    pub fn block_proposal(block: &Block, propose_time: Timestamp) -> Result<Request, std::io::Error> {
        Ok(Request {
            kind: RequestKind::BlockProposal,
            payload: block.encode()?,
            propose_time,
        })
    }

    /// SHA256 hash of the request's borsh serialization.
    pub fn digest(&self) -> Result<CryptoHash, std::io::Error> {
        hash_borsh(self)
    }

    /// Decode the payload as a block, or `None` if this request is not a block proposal.
    pub fn block(&self) -> Option<Result<Block, std::io::Error>> {
        match self.kind {
            RequestKind::BlockProposal => Some(Block::decode(&self.payload)),
        }
    }
}
