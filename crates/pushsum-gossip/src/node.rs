//! Gossip node: the push-sum round state machine.
//!
//! Each round runs these steps strictly in order:
//!
//! ```text
//! split ──► select peer ──► send ──► latency ──► drain ──► report
//!   ▲                                                        │
//!   └──────────────── (unless shutdown was raised) ◄─────────┘
//! ```
//!
//! Shutdown is only checked between rounds, so a node never exits with a
//! half-sent share or a half-merged mailbox.

use std::time::Duration;

use pushsum_core::{NodeId, PushSumState};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::watch;

use crate::error::{GossipError, Result};
use crate::mailbox::{Mailbox, Outbox};
use crate::monitor::MonitorState;

/// Shortest pause inside a round.
///
/// A zero `round_latency` is raised to this, so nodes on other worker
/// threads cannot outrun a receiver's drain by more than a timer tick.
pub const MIN_ROUND_PACING: Duration = Duration::from_millis(1);

/// Per-node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Artificial delay inside every round, at least [`MIN_ROUND_PACING`].
    pub round_latency: Duration,
    /// Seed for this node's peer selection.
    pub seed: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            round_latency: Duration::from_millis(100),
            seed: 0,
        }
    }
}

/// What a node hands back when it stops.
#[derive(Debug)]
pub struct NodeExit {
    /// The node.
    pub id: NodeId,
    /// State after the last completed round.
    pub state: PushSumState,
    /// Rounds completed.
    pub rounds: u64,
    /// Messages merged over the node's lifetime.
    pub received: u64,
    /// The node's mailbox, possibly still holding in-flight messages.
    pub mailbox: Mailbox,
}

/// A push-sum participant.
pub struct GossipNode {
    id: NodeId,
    state: PushSumState,
    neighbors: Vec<NodeId>,
    mailbox: Mailbox,
    outbox: Outbox,
    monitor: MonitorState,
    rng: StdRng,
    config: NodeConfig,
    rounds: u64,
    received: u64,
}

impl GossipNode {
    /// Create a node holding `initial_value` with weight 1.0.
    pub fn new(
        initial_value: f64,
        neighbors: Vec<NodeId>,
        mailbox: Mailbox,
        outbox: Outbox,
        monitor: MonitorState,
        config: NodeConfig,
    ) -> Result<Self> {
        let id = mailbox.owner();
        if neighbors.is_empty() {
            return Err(GossipError::NoNeighbors(id));
        }

        Ok(Self {
            id,
            state: PushSumState::new(initial_value),
            neighbors,
            mailbox,
            outbox,
            monitor,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            rounds: 0,
            received: 0,
        })
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current (sum, weight) state.
    pub fn state(&self) -> &PushSumState {
        &self.state
    }

    /// Rounds completed so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Run rounds until `shutdown` is raised or its sender goes away.
    ///
    /// A send failure ends the loop immediately with the error.
    pub async fn run(mut self, shutdown: watch::Receiver<bool>) -> Result<NodeExit> {
        tracing::debug!(node = %self.id, neighbors = ?self.neighbors, "Node started");

        while !shutdown_requested(&shutdown) {
            self.round().await?;
        }

        tracing::debug!(
            node = %self.id,
            rounds = self.rounds,
            estimate = self.state.estimate(),
            "Node stopped"
        );

        Ok(NodeExit {
            id: self.id,
            state: self.state,
            rounds: self.rounds,
            received: self.received,
            mailbox: self.mailbox,
        })
    }

    /// Execute one complete round.
    pub async fn round(&mut self) -> Result<()> {
        let share = self.state.split();
        let peer = self.select_peer()?;
        self.outbox.send(peer, share)?;

        tokio::time::sleep(self.config.round_latency.max(MIN_ROUND_PACING)).await;

        let inbound = self.mailbox.drain_all();
        self.received += self.state.merge_all(&inbound) as u64;
        self.rounds += 1;

        let estimate = self.state.estimate();
        self.monitor.record(self.id, estimate, self.rounds).await?;

        tracing::trace!(
            node = %self.id,
            round = self.rounds,
            peer = %peer,
            drained = inbound.len(),
            estimate,
            "Round complete"
        );
        Ok(())
    }

    /// Pick a neighbor uniformly at random.
    fn select_peer(&mut self) -> Result<NodeId> {
        self.neighbors
            .choose(&mut self.rng)
            .copied()
            .ok_or(GossipError::NoNeighbors(self.id))
    }
}

fn shutdown_requested(shutdown: &watch::Receiver<bool>) -> bool {
    // a vanished sender means nobody is left to stop us
    *shutdown.borrow() || shutdown.has_changed().is_err()
}
