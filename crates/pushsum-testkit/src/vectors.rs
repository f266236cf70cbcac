//! Golden topology vectors for deterministic verification.
//!
//! Neighbor lists must be re-derivable from `(node_count, kind)` alone, so
//! every implementation has to produce exactly these lists.

use pushsum_core::{neighbors, NodeId, TopologyKind};
use serde::Serialize;

/// A golden topology vector.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Network size.
    pub node_count: usize,
    /// Topology.
    pub kind: TopologyKind,
    /// Node whose neighbors are checked.
    pub node: usize,
    /// Expected neighbor ids, ascending.
    pub expected: &'static [usize],
}

/// Get all golden topology vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "ring interior node",
            node_count: 5,
            kind: TopologyKind::Ring,
            node: 2,
            expected: &[1, 3],
        },
        GoldenVector {
            name: "ring wraps at node 0",
            node_count: 5,
            kind: TopologyKind::Ring,
            node: 0,
            expected: &[1, 4],
        },
        GoldenVector {
            name: "line head",
            node_count: 5,
            kind: TopologyKind::Line,
            node: 0,
            expected: &[1],
        },
        GoldenVector {
            name: "line tail",
            node_count: 5,
            kind: TopologyKind::Line,
            node: 4,
            expected: &[3],
        },
        GoldenVector {
            name: "star hub",
            node_count: 5,
            kind: TopologyKind::Star,
            node: 0,
            expected: &[1, 2, 3, 4],
        },
        GoldenVector {
            name: "star leaf",
            node_count: 5,
            kind: TopologyKind::Star,
            node: 2,
            expected: &[0],
        },
        GoldenVector {
            name: "complete",
            node_count: 5,
            kind: TopologyKind::Complete,
            node: 1,
            expected: &[0, 2, 3, 4],
        },
        GoldenVector {
            name: "two-node ring lists its peer once",
            node_count: 2,
            kind: TopologyKind::Ring,
            node: 0,
            expected: &[1],
        },
        GoldenVector {
            name: "two-node line",
            node_count: 2,
            kind: TopologyKind::Line,
            node: 1,
            expected: &[0],
        },
    ]
}

/// Neighbor ids a vector's inputs actually produce.
pub fn derive_neighbors(vector: &GoldenVector) -> Vec<usize> {
    neighbors(vector.node_count, vector.kind, NodeId(vector.node))
        .map(|ids| ids.into_iter().map(|id| id.index()).collect())
        .unwrap_or_default()
}

/// Verify all golden vectors.
///
/// Returns `(name, matches, derived)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, Vec<usize>)> {
    all_vectors()
        .iter()
        .map(|v| {
            let derived = derive_neighbors(v);
            let matches = derived == v.expected;
            (v.name.to_string(), matches, derived)
        })
        .collect()
}

/// Serialize the vectors for other implementations to check against.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}
