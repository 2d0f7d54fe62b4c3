//! Exhaustive enumerations around every message variant sent through a [`Network`](super::network::Network).

use borsh::{BorshDeserialize, BorshSerialize};

use crate::pbft::messages::{
    BlockInfo, Commit, PbftMessage, PrePrepare, Prepare, Relay, RelayMessage, RelayWithProof,
    RequestOldSeq, SendOldSeq,
};

/// All message variants.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum Message {
    /// See: [`PbftMessage`].
    PbftMessage(PbftMessage),

    /// See: [`RelayMessage`].
    RelayMessage(RelayMessage),

    /// See: [`BlockInfo`].
    BlockInfo(BlockInfo),
}

impl From<PbftMessage> for Message {
    fn from(value: PbftMessage) -> Self {
        Message::PbftMessage(value)
    }
}

impl From<PrePrepare> for Message {
    fn from(value: PrePrepare) -> Self {
        Message::PbftMessage(PbftMessage::PrePrepare(value))
    }
}

impl From<Prepare> for Message {
    fn from(value: Prepare) -> Self {
        Message::PbftMessage(PbftMessage::Prepare(value))
    }
}

impl From<Commit> for Message {
    fn from(value: Commit) -> Self {
        Message::PbftMessage(PbftMessage::Commit(value))
    }
}

impl From<RequestOldSeq> for Message {
    fn from(value: RequestOldSeq) -> Self {
        Message::PbftMessage(PbftMessage::RequestOldSeq(value))
    }
}

impl From<SendOldSeq> for Message {
    fn from(value: SendOldSeq) -> Self {
        Message::PbftMessage(PbftMessage::SendOldSeq(value))
    }
}

impl From<Relay> for Message {
    fn from(value: Relay) -> Self {
        Message::RelayMessage(RelayMessage::Relay(value))
    }
}

impl From<RelayWithProof> for Message {
    fn from(value: RelayWithProof) -> Self {
        Message::RelayMessage(RelayMessage::RelayWithProof(value))
    }
}

impl From<BlockInfo> for Message {
    fn from(value: BlockInfo) -> Self {
        Message::BlockInfo(value)
    }
}
