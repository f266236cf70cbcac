//! # Push-Sum Gossip
//!
//! Concurrent runtime for push-sum averaging: mailboxes, gossip nodes, and
//! convergence monitoring.
//!
//! ## Overview
//!
//! Every node runs as its own task. Nodes talk only through bounded mailboxes
//! and publish their estimates into a shared monitoring table that a single
//! monitor task samples on a fixed period.
//!
//! ## Key Properties
//!
//! - **Non-blocking**: sends fail fast, drains never wait
//! - **Unsynchronized**: rounds on different nodes are fully independent
//! - **Lossless**: a full mailbox aborts the run instead of dropping a share
//! - **Graceful**: shutdown is observed between rounds, never inside one
//!
//! ## Data Flow
//!
//! ```text
//!  Node A                    Node B                    Monitor
//!    |---- Message --------->|                            |
//!    |<--------- Message ----|                            |
//!    |---- record(estimate) ------------------------------>|
//!    |                       |---- record(estimate) ------>|
//!    |                       |                      snapshot / report
//!    |<============== shutdown (once max_error < eps) =====|
//! ```

pub mod convergence;
pub mod error;
pub mod mailbox;
pub mod monitor;
pub mod node;

pub use convergence::{ConvergenceMonitor, ConvergenceResult, MonitorConfig};
pub use error::{GossipError, Result};
pub use mailbox::{Mailbox, MailboxNetwork, Outbox};
pub use monitor::{
    ChannelReporter, MonitorState, Observation, Reporter, Snapshot, TracingReporter,
};
pub use node::{GossipNode, NodeConfig, NodeExit, MIN_ROUND_PACING};
