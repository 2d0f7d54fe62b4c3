use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
};

use crate::types::data_types::{NodeID, ShardID};

use super::messages::Message;

/// Pluggable transport.
///
/// Implementations decide how messages are serialized onto the wire (all message types implement
/// borsh's `BorshSerialize`) and how connections are managed. Callers never learn whether a send
/// succeeded: retrying, if any, is up to the implementation.
pub trait Network: Clone + Send + 'static {
    /// Send a message to the replica (or supervisor) listening on `endpoint`.
    ///
    /// This may block until the message is handed to the operating system. Callers that must not
    /// wait use [`SenderHandle::send_detached`](super::sending::SenderHandle::send_detached).
    fn send(&mut self, endpoint: &Endpoint, message: Message);
}

/// Network address of a replica or of the supervisor, e.g., `"127.0.0.1:32217"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The endpoints of every replica in every shard, indexed by [`NodeID`].
///
/// The supervisor is registered under [`ShardID::SUPERVISOR`] with a single endpoint.
#[derive(Clone, Debug, Default)]
pub struct NodeTable(BTreeMap<ShardID, Vec<Endpoint>>);

impl NodeTable {
    pub fn new() -> NodeTable {
        NodeTable::default()
    }

    /// Register the endpoints of `shard`'s replicas. `endpoints[i]` belongs to `NodeID::new(i)`.
    pub fn insert(&mut self, shard: ShardID, endpoints: Vec<Endpoint>) {
        self.0.insert(shard, endpoints);
    }

    pub fn endpoint(&self, shard: ShardID, node: NodeID) -> Option<&Endpoint> {
        self.0
            .get(&shard)
            .and_then(|endpoints| endpoints.get(node.int() as usize))
    }

    /// The endpoints of all of `shard`'s replicas.
    pub fn shard_endpoints(&self, shard: ShardID) -> &[Endpoint] {
        self.0.get(&shard).map(Vec::as_slice).unwrap_or(&[])
    }
}
