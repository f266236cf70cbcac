//! Strong type definitions for push-sum.
//!
//! Node identifiers are newtypes to prevent mixing them up with counts
//! and indices at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Identifier of a gossip node, `0 <= id < node_count`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Create a new NodeId from a raw index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw index.
    pub const fn index(&self) -> usize {
        self.0
    }

    /// Iterate every node id of a network of `node_count` nodes.
    pub fn all(node_count: usize) -> impl Iterator<Item = NodeId> {
        (0..node_count).map(NodeId)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// A fractional share of one node's (sum, weight) pair in transit to a peer.
///
/// Created by the sender at split time, merged and discarded by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Share of the sender's accumulated sum.
    pub sum: f64,
    /// Share of the sender's accumulated weight.
    pub weight: f64,
}

impl Message {
    /// Create a new message.
    pub const fn new(sum: f64, weight: f64) -> Self {
        Self { sum, weight }
    }
}

/// Arithmetic mean of a set of values.
///
/// Each value is scaled before summing, so finite inputs never produce an
/// infinite mean. Returns `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    Some(values.iter().map(|v| v / n).sum())
}

/// Check that every value is finite and that no node's sum can overflow.
///
/// A node's sum is a convex share of the initial values, bounded by their
/// absolute total.
pub fn validate_values(values: &[f64]) -> Result<()> {
    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(CoreError::InvalidValue {
            node: NodeId(index),
            value,
        });
    }
    if !values.iter().map(|v| v.abs()).sum::<f64>().is_finite() {
        return Err(CoreError::TotalOverflow);
    }
    Ok(())
}
