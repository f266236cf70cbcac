//! Error types for the push-sum core.

use thiserror::Error;

use crate::types::NodeId;

/// Errors raised while validating simulation inputs or building topologies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid node count: {0} (at least 2 nodes are required)")]
    InvalidNodeCount(usize),

    #[error("invalid topology selector: {0:?}")]
    InvalidTopology(String),

    #[error("node {node} is out of range for a network of {node_count} nodes")]
    NodeOutOfRange { node: NodeId, node_count: usize },

    #[error("initial value of node {node} is not finite: {value}")]
    InvalidValue { node: NodeId, value: f64 },

    #[error("initial values are too large: their absolute total overflows f64")]
    TotalOverflow,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
