//! Functions and types for sending messages to the network.

use std::thread;

use super::{
    messages::Message,
    network::{Endpoint, Network},
};

/// Handle for sending messages to the [`Network`].
///
/// It can be used to send instances of any type that implement the [`Into<Message>`] trait.
#[derive(Clone)]
pub(crate) struct SenderHandle<N: Network> {
    network: N,
}

impl<N: Network> SenderHandle<N> {
    pub(crate) fn new(network: N) -> Self {
        Self { network }
    }

    /// Send `msg` from a new thread, so that the caller never waits on delivery.
    pub(crate) fn send_detached<S: Into<Message>>(&self, endpoint: Endpoint, msg: S) {
        let mut network = self.network.clone();
        let msg = msg.into();
        thread::spawn(move || network.send(&endpoint, msg));
    }
}
