/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Shard-PBFT implements the consensus-phase behavior of a replica in a sharded blockchain, where
//! every shard runs its own PBFT replica group. It offers:
//! 1. [Phase handlers](pbft::protocol::PhaseHandler) for a reduced two-phase PBFT and for full
//!    three-phase PBFT, pluggable into a generic PBFT engine,
//! 2. A [relay dispatcher](pbft::relay) that forwards every committed cross-shard transaction to its
//!    destination shard exactly once, optionally with Merkle inclusion proofs,
//! 3. [Catch-up](pbft::catch_up) through all-or-nothing replay of historical requests,
//! 4. Pluggable [chain](chain) storage and [networking], and structured [logging].

pub mod chain;

pub mod logging;

pub mod networking;

pub mod pbft;

pub mod types;
