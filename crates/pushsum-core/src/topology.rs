//! Topology builder: which nodes may gossip with which.
//!
//! Neighbor lists are a pure function of `(node_count, kind, node)`. There is
//! no randomness, so any party can re-derive a node's neighbors from the
//! network parameters alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::types::NodeId;

/// Minimum number of nodes a push-sum network needs.
pub const MIN_NODE_COUNT: usize = 2;

/// Closed set of supported topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyKind {
    /// Each node talks to its predecessor and successor, wrapping around.
    Ring,
    /// Like a ring without the wrap-around edge.
    Line,
    /// Node 0 is the hub; every other node only talks to the hub.
    Star,
    /// Every node talks to every other node.
    Complete,
}

impl TopologyKind {
    /// All topology kinds, in selector order.
    pub const ALL: [TopologyKind; 4] = [
        TopologyKind::Ring,
        TopologyKind::Line,
        TopologyKind::Star,
        TopologyKind::Complete,
    ];

    /// Lowercase name, as accepted by `FromStr`.
    pub const fn name(&self) -> &'static str {
        match self {
            TopologyKind::Ring => "ring",
            TopologyKind::Line => "line",
            TopologyKind::Star => "star",
            TopologyKind::Complete => "complete",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TopologyKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ring" => Ok(TopologyKind::Ring),
            "line" => Ok(TopologyKind::Line),
            "star" => Ok(TopologyKind::Star),
            "complete" | "full" => Ok(TopologyKind::Complete),
            _ => Err(CoreError::InvalidTopology(s.to_string())),
        }
    }
}

/// Numeric selectors are 1-based, in the order of [`TopologyKind::ALL`].
impl TryFrom<u8> for TopologyKind {
    type Error = CoreError;

    fn try_from(selector: u8) -> Result<Self> {
        match selector {
            1 => Ok(TopologyKind::Ring),
            2 => Ok(TopologyKind::Line),
            3 => Ok(TopologyKind::Star),
            4 => Ok(TopologyKind::Complete),
            other => Err(CoreError::InvalidTopology(other.to_string())),
        }
    }
}

/// Check that a network of `node_count` nodes can run push-sum.
pub fn validate_node_count(node_count: usize) -> Result<()> {
    if node_count < MIN_NODE_COUNT {
        return Err(CoreError::InvalidNodeCount(node_count));
    }
    Ok(())
}

/// Neighbors of `node` in a network of `node_count` nodes, in ascending order.
///
/// The result never contains `node` itself and never repeats an id. In a
/// two-node ring both directions lead to the same peer, which is listed once.
pub fn neighbors(node_count: usize, kind: TopologyKind, node: NodeId) -> Result<Vec<NodeId>> {
    validate_node_count(node_count)?;
    if node.index() >= node_count {
        return Err(CoreError::NodeOutOfRange { node, node_count });
    }

    let n = node_count;
    let i = node.index();

    let mut ids: Vec<usize> = match kind {
        TopologyKind::Ring => vec![(i + n - 1) % n, (i + 1) % n],
        TopologyKind::Line => {
            let mut ids = Vec::with_capacity(2);
            if i > 0 {
                ids.push(i - 1);
            }
            if i < n - 1 {
                ids.push(i + 1);
            }
            ids
        }
        TopologyKind::Star => {
            if i == 0 {
                (1..n).collect()
            } else {
                vec![0]
            }
        }
        TopologyKind::Complete => (0..n).filter(|&j| j != i).collect(),
    };

    ids.sort_unstable();
    ids.dedup();
    Ok(ids.into_iter().map(NodeId).collect())
}

/// Neighbor lists of every node in a network, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    kind: TopologyKind,
    neighbors: Vec<Vec<NodeId>>,
}

impl Topology {
    /// Build the neighbor lists of all `node_count` nodes.
    pub fn build(node_count: usize, kind: TopologyKind) -> Result<Self> {
        validate_node_count(node_count)?;
        let neighbors = NodeId::all(node_count)
            .map(|node| self::neighbors(node_count, kind, node))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { kind, neighbors })
    }

    /// The topology kind.
    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Neighbors of one node.
    pub fn neighbors_of(&self, node: NodeId) -> Result<&[NodeId]> {
        self.neighbors
            .get(node.index())
            .map(Vec::as_slice)
            .ok_or(CoreError::NodeOutOfRange {
                node,
                node_count: self.node_count(),
            })
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Consume the topology, yielding each node's neighbor list.
    pub fn into_neighbor_lists(self) -> Vec<Vec<NodeId>> {
        self.neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(raw: &[usize]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId).collect()
    }

    #[test]
    fn test_five_node_neighbors() {
        assert_eq!(
            neighbors(5, TopologyKind::Ring, NodeId(2)).unwrap(),
            ids(&[1, 3])
        );
        assert_eq!(
            neighbors(5, TopologyKind::Line, NodeId(0)).unwrap(),
            ids(&[1])
        );
        assert_eq!(
            neighbors(5, TopologyKind::Line, NodeId(4)).unwrap(),
            ids(&[3])
        );
        assert_eq!(
            neighbors(5, TopologyKind::Star, NodeId(0)).unwrap(),
            ids(&[1, 2, 3, 4])
        );
        assert_eq!(
            neighbors(5, TopologyKind::Star, NodeId(2)).unwrap(),
            ids(&[0])
        );
        assert_eq!(
            neighbors(5, TopologyKind::Complete, NodeId(1)).unwrap(),
            ids(&[0, 2, 3, 4])
        );
    }

    #[test]
    fn test_ring_wraps_around() {
        assert_eq!(
            neighbors(5, TopologyKind::Ring, NodeId(0)).unwrap(),
            ids(&[1, 4])
        );
    }

    #[test]
    fn test_two_nodes_have_one_neighbor_everywhere() {
        for kind in TopologyKind::ALL {
            assert_eq!(neighbors(2, kind, NodeId(0)).unwrap(), ids(&[1]), "{kind}");
            assert_eq!(neighbors(2, kind, NodeId(1)).unwrap(), ids(&[0]), "{kind}");
        }
    }

    #[test]
    fn test_invalid_node_count() {
        assert_eq!(
            neighbors(1, TopologyKind::Ring, NodeId(0)),
            Err(CoreError::InvalidNodeCount(1))
        );
        assert_eq!(
            Topology::build(0, TopologyKind::Complete),
            Err(CoreError::InvalidNodeCount(0))
        );
    }

    #[test]
    fn test_node_out_of_range() {
        let err = neighbors(3, TopologyKind::Line, NodeId(3)).unwrap_err();
        assert_eq!(
            err,
            CoreError::NodeOutOfRange {
                node: NodeId(3),
                node_count: 3
            }
        );
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("Ring".parse::<TopologyKind>(), Ok(TopologyKind::Ring));
        assert_eq!(" star ".parse::<TopologyKind>(), Ok(TopologyKind::Star));
        assert_eq!(TopologyKind::try_from(4u8), Ok(TopologyKind::Complete));
        assert!(matches!(
            "mesh".parse::<TopologyKind>(),
            Err(CoreError::InvalidTopology(_))
        ));
        assert!(matches!(
            TopologyKind::try_from(0u8),
            Err(CoreError::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_edge_counts() {
        let n = 6;
        let edges = |kind| Topology::build(n, kind).unwrap().edge_count();
        assert_eq!(edges(TopologyKind::Ring), n);
        assert_eq!(edges(TopologyKind::Line), n - 1);
        assert_eq!(edges(TopologyKind::Star), n - 1);
        assert_eq!(edges(TopologyKind::Complete), n * (n - 1) / 2);
    }

    fn topology_kind() -> impl Strategy<Value = TopologyKind> {
        prop::sample::select(TopologyKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn test_neighbors_symmetric_and_self_free(n in 2usize..40, kind in topology_kind()) {
            let topology = Topology::build(n, kind).unwrap();
            for node in NodeId::all(n) {
                let list = topology.neighbors_of(node).unwrap();
                prop_assert!(!list.is_empty());
                prop_assert!(!list.contains(&node));
                for peer in list {
                    prop_assert!(topology.neighbors_of(*peer).unwrap().contains(&node));
                }
            }
        }

        #[test]
        fn test_build_is_deterministic(n in 2usize..40, kind in topology_kind()) {
            prop_assert_eq!(Topology::build(n, kind).unwrap(), Topology::build(n, kind).unwrap());
        }

        #[test]
        fn test_every_topology_is_connected(n in 2usize..40, kind in topology_kind()) {
            let topology = Topology::build(n, kind).unwrap();
            let mut seen = vec![false; n];
            let mut stack = vec![NodeId(0)];
            seen[0] = true;
            while let Some(node) = stack.pop() {
                for peer in topology.neighbors_of(node).unwrap() {
                    if !seen[peer.index()] {
                        seen[peer.index()] = true;
                        stack.push(*peer);
                    }
                }
            }
            prop_assert!(seen.iter().all(|&s| s));
        }
    }
}
