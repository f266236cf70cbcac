//! Error types for the gossip runtime.

use pushsum_core::{CoreError, NodeId};
use thiserror::Error;

/// Errors that abort a gossip run.
#[derive(Debug, Error)]
pub enum GossipError {
    /// A send exceeded the receiver's mailbox capacity.
    ///
    /// Dropping the message would break sum conservation, so this is fatal.
    #[error("mailbox of node {node} is full (capacity {capacity})")]
    MailboxFull { node: NodeId, capacity: usize },

    /// The receiving mailbox no longer exists.
    #[error("mailbox of node {0} is closed")]
    MailboxClosed(NodeId),

    /// A node was spawned without anyone to gossip with.
    #[error("node {0} has no neighbors")]
    NoNeighbors(NodeId),

    /// Invalid input or topology.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A node task panicked or was cancelled.
    #[error("node task failed: {0}")]
    TaskFailed(String),
}

/// Result type for gossip operations.
pub type Result<T> = std::result::Result<T, GossipError>;
