//! Per-node mailboxes.
//!
//! Every node owns one bounded multi-producer/single-consumer queue. Any
//! neighbor may push into it through an [`Outbox`]; only the owner drains it
//! through its [`Mailbox`]. Neither side ever waits: sends fail fast when the
//! queue is full and draining stops at the first empty poll.

use std::sync::Arc;

use pushsum_core::{CoreError, Message, NodeId};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::error::{GossipError, Result};

/// Shared sending side of every mailbox in the network.
#[derive(Debug)]
pub struct MailboxNetwork {
    /// Sender channel for each node, indexed by node id.
    senders: Vec<mpsc::Sender<Message>>,
    capacity: usize,
}

impl MailboxNetwork {
    /// Create mailboxes for `node_count` nodes.
    ///
    /// Returns the shared network together with each node's receiving
    /// mailbox, indexed by node id.
    pub fn new(node_count: usize, capacity: usize) -> (Arc<Self>, Vec<Mailbox>) {
        // tokio panics on a zero-capacity channel
        let capacity = capacity.max(1);
        let mut senders = Vec::with_capacity(node_count);
        let mut mailboxes = Vec::with_capacity(node_count);

        for owner in NodeId::all(node_count) {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            mailboxes.push(Mailbox {
                owner,
                receiver: rx,
            });
        }

        (Arc::new(Self { senders, capacity }), mailboxes)
    }

    /// Capacity of each mailbox.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of mailboxes.
    pub fn node_count(&self) -> usize {
        self.senders.len()
    }

    /// Sending handle for node `from`.
    pub fn outbox(self: &Arc<Self>, from: NodeId) -> Outbox {
        Outbox {
            from,
            network: Arc::clone(self),
        }
    }

    fn try_deliver(&self, to: NodeId, message: Message) -> Result<()> {
        let sender = self
            .senders
            .get(to.index())
            .ok_or(CoreError::NodeOutOfRange {
                node: to,
                node_count: self.senders.len(),
            })?;

        sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => GossipError::MailboxFull {
                node: to,
                capacity: self.capacity,
            },
            TrySendError::Closed(_) => GossipError::MailboxClosed(to),
        })
    }
}

/// A node's handle for sending into its neighbors' mailboxes.
#[derive(Debug, Clone)]
pub struct Outbox {
    from: NodeId,
    network: Arc<MailboxNetwork>,
}

impl Outbox {
    /// The sending node.
    pub fn sender(&self) -> NodeId {
        self.from
    }

    /// Enqueue a message for `to` without waiting.
    pub fn send(&self, to: NodeId, message: Message) -> Result<()> {
        let result = self.network.try_deliver(to, message);
        if let Err(e) = &result {
            tracing::error!(from = %self.from, to = %to, error = %e, "Send failed");
        }
        result
    }
}

/// The receiving side of one node's mailbox. Owned by that node alone.
#[derive(Debug)]
pub struct Mailbox {
    owner: NodeId,
    receiver: mpsc::Receiver<Message>,
}

impl Mailbox {
    /// The node this mailbox belongs to.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Remove and return every message currently queued.
    ///
    /// Never waits; returns an empty vector when nothing is pending.
    pub fn drain_all(&mut self) -> Vec<Message> {
        let mut drained = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(message) => drained.push(message),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empty_returns_immediately() {
        let (_network, mut mailboxes) = MailboxNetwork::new(2, 4);
        assert!(mailboxes[0].drain_all().is_empty());
        assert!(mailboxes[0].drain_all().is_empty());
    }

    #[test]
    fn test_send_then_drain_in_order() {
        let (network, mut mailboxes) = MailboxNetwork::new(3, 6);
        let from_0 = network.outbox(NodeId(0));
        let from_2 = network.outbox(NodeId(2));

        from_0.send(NodeId(1), Message::new(1.0, 0.5)).unwrap();
        from_2.send(NodeId(1), Message::new(2.0, 0.25)).unwrap();

        let drained = mailboxes[1].drain_all();
        assert_eq!(
            drained,
            vec![Message::new(1.0, 0.5), Message::new(2.0, 0.25)]
        );
        assert!(mailboxes[1].drain_all().is_empty());
        assert!(mailboxes[0].drain_all().is_empty());
    }

    #[test]
    fn test_overflow_is_mailbox_full() {
        let (network, _mailboxes) = MailboxNetwork::new(2, 2);
        let outbox = network.outbox(NodeId(0));

        outbox.send(NodeId(1), Message::new(1.0, 1.0)).unwrap();
        outbox.send(NodeId(1), Message::new(1.0, 1.0)).unwrap();
        let err = outbox.send(NodeId(1), Message::new(1.0, 1.0)).unwrap_err();

        assert!(matches!(
            err,
            GossipError::MailboxFull {
                node: NodeId(1),
                capacity: 2
            }
        ));
    }

    #[test]
    fn test_send_to_dropped_mailbox_is_closed() {
        let (network, mut mailboxes) = MailboxNetwork::new(2, 2);
        drop(mailboxes.remove(1));

        let err = network
            .outbox(NodeId(0))
            .send(NodeId(1), Message::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, GossipError::MailboxClosed(NodeId(1))));
    }

    #[test]
    fn test_send_out_of_range() {
        let (network, _mailboxes) = MailboxNetwork::new(2, 2);
        let err = network
            .outbox(NodeId(0))
            .send(NodeId(5), Message::new(0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, GossipError::Core(_)));
    }

    #[tokio::test]
    async fn test_concurrent_senders() {
        let (network, mut mailboxes) = MailboxNetwork::new(4, 8);

        let mut handles = Vec::new();
        for from in 1..4 {
            let outbox = network.outbox(NodeId(from));
            handles.push(tokio::spawn(async move {
                outbox.send(NodeId(0), Message::new(from as f64, 0.5))?;
                outbox.send(NodeId(0), Message::new(from as f64, 0.5))
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let drained = mailboxes[0].drain_all();
        assert_eq!(drained.len(), 6);
        assert_eq!(drained.iter().map(|m| m.sum).sum::<f64>(), 12.0);
    }
}
