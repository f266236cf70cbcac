//! # Push-Sum
//!
//! Simulation of the push-sum gossip protocol for distributed averaging.
//!
//! ## Overview
//!
//! A set of peers, each holding a private value, repeatedly hand half of
//! their accumulated (sum, weight) pair to a random neighbor. Each peer's
//! estimate `sum / weight` converges to the global average without any peer
//! seeing the full data set and without a coordinator.
//!
//! ## Key Concepts
//!
//! - **Round**: split, pick a neighbor, send, wait, drain the mailbox, report.
//! - **Topology**: ring, line, star, or complete graph of allowed peers.
//! - **Monitor**: samples every node's error once per period and stops the
//!   run when the largest error falls below epsilon.
//! - **Conservation**: total sum and total weight never change; only their
//!   distribution across nodes does.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pushsum::{Simulation, SimulationConfig, TopologyKind, TracingReporter};
//!
//! async fn example() {
//!     let simulation = Simulation::new(
//!         vec![10.0, 0.0, 4.0, 6.0],
//!         TopologyKind::Ring,
//!         SimulationConfig::default(),
//!     )
//!     .unwrap();
//!
//!     let report = simulation.run(&TracingReporter).await.unwrap();
//!     println!("converged after {} periods", report.periods());
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `pushsum::core` - Node state, messages, topologies
//! - `pushsum::gossip` - Mailboxes, gossip nodes, convergence monitoring

pub mod error;
pub mod simulation;

// Re-export component crates
pub use pushsum_core as core;
pub use pushsum_gossip as gossip;

// Re-export main types for convenience
pub use error::{Result, SimulationError};
pub use simulation::{NodeSummary, Simulation, SimulationConfig, SimulationReport};

// Re-export commonly used component types
pub use pushsum_core::{CoreError, Message, NodeId, PushSumState, Topology, TopologyKind};
pub use pushsum_gossip::{ChannelReporter, GossipError, Reporter, Snapshot, TracingReporter};
