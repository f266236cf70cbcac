//! # Push-Sum Testkit
//!
//! Testing utilities for push-sum.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known neighbor lists every topology builder must reproduce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A deterministic lock-step network, scenarios, and fast configs
//!
//! ## Golden Vectors
//!
//! ```rust
//! use pushsum_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, derived) in verify_all_vectors() {
//!     assert!(matches, "{name}: {derived:?}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use pushsum_testkit::{LockstepNetwork, NetworkParams};
//!
//! proptest! {
//!     #[test]
//!     fn conserves_mass(params: NetworkParams) {
//!         let mut net = LockstepNetwork::new(&params.initial_values, params.kind, params.seed).unwrap();
//!         net.round();
//!         let total: f64 = params.initial_values.iter().sum();
//!         prop_assert!((net.total_sum() - total).abs() < 1e-6);
//!     }
//! }
//! ```
//!
//! ## Lock-step Network
//!
//! ```rust
//! use pushsum_core::TopologyKind;
//! use pushsum_testkit::LockstepNetwork;
//!
//! let mut network = LockstepNetwork::new(&[10.0, 0.0], TopologyKind::Ring, 7).unwrap();
//! network.round();
//! assert_eq!(network.estimates(), vec![5.0, 5.0]);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fast_config, small_scenarios, two_node_scenarios, LockstepNetwork, Scenario};
pub use generators::{initial_values, node_count, topology_kind, NetworkParams};
pub use vectors::{all_vectors, verify_all_vectors, vectors_json, GoldenVector};
