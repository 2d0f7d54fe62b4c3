use std::collections::HashMap;

use log::LevelFilter;
use shard_pbft::{
    chain::Chain,
    pbft::{
        config::{PbftConfiguration, PrePrepareValidation},
        messages::{Commit, PbftMessage, RequestOldSeq, SendOldSeq},
        protocol::{ConsensusVariant, InvariantViolation, PbftError},
    },
    types::{
        data_types::{BlockHeight, NodeID, ShardID, Timestamp},
        request::{Request, RequestKind},
        transaction::Transaction,
    },
};

mod common;

use crate::common::{
    logging::setup_logger,
    mem_chain::MemChain,
    node::{default_config, proposal_at, random_account, transaction, TestNode},
};

fn lagging_replica(variant: ConsensusVariant, next_height: u64) -> TestNode {
    TestNode::new(
        variant,
        default_config(0, 1, 1),
        MemChain::new(HashMap::new()),
        next_height,
    )
}

fn send_old_seq(start: u64, end: u64, old_requests: Vec<Request>) -> PbftMessage {
    PbftMessage::SendOldSeq(SendOldSeq {
        seq_start: BlockHeight::new(start),
        seq_end: BlockHeight::new(end),
        old_requests,
        sender: NodeID::new(0),
    })
}

fn some_txs(count: usize) -> Vec<Transaction> {
    (0..count)
        .map(|_| transaction(&random_account(), &random_account(), 10))
        .collect()
}

#[test]
fn incomplete_reply_rejected_test() {
    setup_logger(LevelFilter::Trace);

    let mut replica = lagging_replica(ConsensusVariant::TwoPhase, 10);
    let reply = send_old_seq(
        10,
        12,
        vec![proposal_at(10, some_txs(1)), proposal_at(11, some_txs(1))],
    );

    assert!(!replica.replica.handle_message(reply).unwrap());
    assert_eq!(replica.sequence_id(), BlockHeight::new(10));
    assert_eq!(replica.chain().height(), BlockHeight::new(0));
}

#[test]
fn complete_reply_replayed_in_order_test() {
    setup_logger(LevelFilter::Trace);

    let mut replica = lagging_replica(ConsensusVariant::TwoPhase, 10);
    let reply = send_old_seq(
        10,
        11,
        vec![proposal_at(10, some_txs(2)), proposal_at(11, some_txs(3))],
    );

    assert!(replica.replica.handle_message(reply).unwrap());
    assert_eq!(replica.sequence_id(), BlockHeight::new(12));

    let heights: Vec<BlockHeight> = replica.chain().blocks().iter().map(|b| b.height()).collect();
    assert_eq!(heights, vec![BlockHeight::new(10), BlockHeight::new(11)]);
    assert_eq!(replica.chain().blocks()[1].body.len(), 3);

    // Replay sends nothing and records nothing.
    assert!(replica.sent.try_recv().is_err());
    assert!(replica.metrics.rows().is_empty());
}

#[test]
fn undecodable_request_rejects_whole_reply_test() {
    setup_logger(LevelFilter::Trace);

    let mut replica = lagging_replica(ConsensusVariant::TwoPhase, 10);
    let garbage = Request {
        kind: RequestKind::BlockProposal,
        payload: vec![1, 2, 3],
        propose_time: Timestamp::now(),
    };
    let reply = send_old_seq(10, 11, vec![proposal_at(10, some_txs(1)), garbage]);

    assert!(!replica.replica.handle_message(reply).unwrap());
    assert_eq!(replica.sequence_id(), BlockHeight::new(10));
    assert!(replica.chain().blocks().is_empty());
}

#[test]
fn storage_failure_mid_replay_is_invariant_violation_test() {
    setup_logger(LevelFilter::Trace);

    let mut replica = lagging_replica(ConsensusVariant::TwoPhase, 10);
    replica.chain_mut().fail_storage_at(BlockHeight::new(11));
    let reply = send_old_seq(
        10,
        12,
        vec![
            proposal_at(10, some_txs(1)),
            proposal_at(11, some_txs(1)),
            proposal_at(12, some_txs(1)),
        ],
    );

    match replica.replica.handle_message(reply) {
        Err(PbftError::ProtocolInvariantViolation(InvariantViolation::PartialReplay {
            failed_height,
            applied,
            ..
        })) => {
            assert_eq!(failed_height, BlockHeight::new(11));
            assert_eq!(applied, 1);
        }
        other => panic!("expected a partial replay, got {:?}", other),
    }

    // The block before the failure stays appended and the cursor does not move.
    assert_eq!(replica.chain().height(), BlockHeight::new(10));
    assert_eq!(replica.chain().blocks().len(), 1);
    assert_eq!(replica.sequence_id(), BlockHeight::new(10));
}

#[test]
fn inverted_range_test() {
    setup_logger(LevelFilter::Trace);

    let mut replica = lagging_replica(ConsensusVariant::TwoPhase, 10);
    assert!(!replica
        .replica
        .handle_message(send_old_seq(12, 10, vec![]))
        .unwrap());
    assert!(!replica
        .replica
        .handle_message(send_old_seq(12, 10, vec![proposal_at(10, vec![])]))
        .unwrap());
    assert_eq!(replica.sequence_id(), BlockHeight::new(10));

    // `start == end + 1` is an empty range: nothing to replay, and the cursor lands on `start`.
    assert!(replica
        .replica
        .handle_message(send_old_seq(11, 10, vec![]))
        .unwrap());
    assert_eq!(replica.sequence_id(), BlockHeight::new(11));
    assert!(replica.chain().blocks().is_empty());
}

#[test]
fn old_sequence_request_acknowledged_test() {
    setup_logger(LevelFilter::Trace);

    for variant in [ConsensusVariant::TwoPhase, ConsensusVariant::ThreePhase] {
        let mut replica = lagging_replica(variant, 3);
        let request = PbftMessage::RequestOldSeq(RequestOldSeq {
            seq_start: BlockHeight::new(1),
            seq_end: BlockHeight::new(2),
            server: NodeID::new(1),
            sender: NodeID::new(2),
        });

        assert!(replica.replica.handle_message(request).unwrap());
        assert_eq!(replica.sequence_id(), BlockHeight::new(3));
        assert!(replica.chain().blocks().is_empty());
    }
}

#[test]
fn replayed_replica_rejoins_live_consensus_test() {
    setup_logger(LevelFilter::Trace);

    // Every replica checks proposals, so the rejoining replica's replayed chain must line up with
    // the leader's.
    let config = |node| {
        PbftConfiguration::builder()
            .shard_id(ShardID::new(0))
            .node_id(NodeID::new(node))
            .shard_count(1)
            .pre_prepare_validation(PrePrepareValidation::AllReplicas)
            .build()
    };
    let mut leader = TestNode::new(
        ConsensusVariant::TwoPhase,
        config(0),
        MemChain::new(HashMap::new()),
        1,
    );
    let mut lagging = TestNode::new(
        ConsensusVariant::TwoPhase,
        config(1),
        MemChain::new(HashMap::new()),
        1,
    );

    // 1. The leader commits heights 1 and 2 without the lagging replica.
    let mut history = Vec::new();
    for _ in 0..2 {
        leader.chain().tx_pool().lock().add_txs(some_txs(2));
        let pre_prepare = leader.replica.propose().unwrap();
        assert!(leader.replica.on_pre_prepare(&pre_prepare).unwrap());
        leader
            .replica
            .handle_message(
                Commit {
                    digest: pre_prepare.digest,
                    seq_id: pre_prepare.seq_id,
                    sender: NodeID::new(0),
                }
                .into(),
            )
            .unwrap();
        history.push(pre_prepare.request);
    }

    // 2. The lagging replica replays them.
    assert!(lagging
        .replica
        .handle_message(send_old_seq(1, 2, history))
        .unwrap());
    assert_eq!(lagging.sequence_id(), BlockHeight::new(3));
    assert_eq!(lagging.chain().blocks(), leader.chain().blocks());

    // 3. Both take part in height 3.
    leader.chain().tx_pool().lock().add_txs(some_txs(1));
    let pre_prepare = leader.replica.propose().unwrap();
    assert_eq!(pre_prepare.seq_id, BlockHeight::new(3));
    assert!(leader.replica.on_pre_prepare(&pre_prepare).unwrap());
    assert!(lagging.replica.on_pre_prepare(&pre_prepare).unwrap());

    let commit = Commit {
        digest: pre_prepare.digest,
        seq_id: pre_prepare.seq_id,
        sender: NodeID::new(0),
    };
    assert!(leader.replica.handle_message(commit.clone().into()).unwrap());
    assert!(lagging.replica.handle_message(commit.into()).unwrap());

    assert_eq!(lagging.sequence_id(), BlockHeight::new(4));
    assert_eq!(lagging.chain().blocks(), leader.chain().blocks());
}

#[test]
fn live_commit_after_replay_advances_by_one_test() {
    setup_logger(LevelFilter::Trace);

    let mut replica = lagging_replica(ConsensusVariant::ThreePhase, 10);
    let reply = send_old_seq(
        10,
        11,
        vec![proposal_at(10, some_txs(1)), proposal_at(11, some_txs(1))],
    );
    assert!(replica.replica.handle_message(reply).unwrap());
    assert_eq!(replica.sequence_id(), BlockHeight::new(12));

    let request = proposal_at(12, some_txs(1));
    let digest = request.digest().unwrap();
    replica
        .replica
        .context_mut()
        .request_pool
        .insert(digest, request);
    assert!(replica
        .replica
        .handle_message(
            Commit {
                digest,
                seq_id: BlockHeight::new(12),
                sender: NodeID::new(0),
            }
            .into(),
        )
        .unwrap());

    assert_eq!(replica.sequence_id(), BlockHeight::new(13));
    assert_eq!(replica.chain().height(), BlockHeight::new(12));
}
