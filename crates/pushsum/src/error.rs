//! Error types for the simulation.

use pushsum_core::CoreError;
use pushsum_gossip::GossipError;
use thiserror::Error;

/// Errors that end a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Invalid node count, topology, or initial value.
    #[error("invalid input: {0}")]
    Core(#[from] CoreError),

    /// A mailbox capacity override of zero.
    #[error("invalid mailbox capacity: {0} (must be at least 1)")]
    InvalidMailboxCapacity(usize),

    /// A node failed mid-run, e.g. on a full mailbox.
    #[error("gossip error: {0}")]
    Gossip(#[from] GossipError),

    /// The period budget ran out before every node converged.
    #[error("not converged after {periods} monitor periods (max error {max_error})")]
    NotConverged { periods: u64, max_error: f64 },
}

impl SimulationError {
    /// Whether the run aborted because a mailbox overflowed.
    pub fn is_mailbox_full(&self) -> bool {
        matches!(self, SimulationError::Gossip(GossipError::MailboxFull { .. }))
    }
}

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
