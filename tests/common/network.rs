use std::{
    sync::mpsc::{self, Receiver, Sender},
    time::Duration,
};

use shard_pbft::networking::{
    messages::Message,
    network::{Endpoint, Network},
};

/// A mock network stub that hands every sent message, with its destination, to a channel.
#[derive(Clone)]
pub(crate) struct NetworkStub {
    outbox: Sender<(Endpoint, Message)>,
}

impl Network for NetworkStub {
    fn send(&mut self, endpoint: &Endpoint, message: Message) {
        let _ = self.outbox.send((endpoint.clone(), message));
    }
}

pub(crate) fn mock_network() -> (NetworkStub, Receiver<(Endpoint, Message)>) {
    let (outbox, sent) = mpsc::channel();
    (NetworkStub { outbox }, sent)
}

/// Wait for exactly `count` messages to be sent, sorted by destination. Panics if they do not
/// arrive within a few seconds.
pub(crate) fn expect_sent(
    sent: &Receiver<(Endpoint, Message)>,
    count: usize,
) -> Vec<(Endpoint, Message)> {
    let mut messages: Vec<(Endpoint, Message)> = (0..count)
        .map(|_| {
            sent.recv_timeout(Duration::from_secs(5))
                .expect("expected message was not sent")
        })
        .collect();
    messages.sort_by(|(a, _), (b, _)| a.cmp(b));
    messages
}
