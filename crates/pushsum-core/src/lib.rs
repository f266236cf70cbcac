//! # Push-Sum Core
//!
//! Pure primitives for push-sum gossip averaging: messages, node state, and
//! topologies.
//!
//! This crate contains no I/O, no async, no shared state. It is pure
//! computation over (sum, weight) pairs and neighbor graphs.
//!
//! ## Key Types
//!
//! - [`PushSumState`] - A node's accumulated (sum, weight) pair
//! - [`Message`] - A share of (sum, weight) in transit between nodes
//! - [`NodeId`] - Identifier of a node in `0..node_count`
//! - [`TopologyKind`] / [`Topology`] - Who may gossip with whom

pub mod error;
pub mod state;
pub mod topology;
pub mod types;

pub use error::{CoreError, Result};
pub use state::PushSumState;
pub use topology::{neighbors, validate_node_count, Topology, TopologyKind, MIN_NODE_COUNT};
pub use types::{mean, validate_values, Message, NodeId};
