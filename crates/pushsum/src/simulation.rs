//! The Simulation: one push-sum run from initial values to convergence.
//!
//! Wires the topology, mailboxes, gossip nodes, and convergence monitor
//! together, supervises the node tasks, and settles the network once every
//! node has stopped.

use std::time::Duration;

use pushsum_core::{
    mean, validate_node_count, validate_values, CoreError, NodeId, PushSumState, Topology,
    TopologyKind,
};
use pushsum_gossip::{
    ConvergenceMonitor, ConvergenceResult, GossipError, GossipNode, MailboxNetwork,
    MonitorConfig, MonitorState, NodeConfig, NodeExit, Reporter, Snapshot,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};

use crate::error::{Result, SimulationError};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Artificial delay per node round. Zero is paced at one timer tick.
    pub round_latency: Duration,
    /// Time between convergence checks.
    pub monitor_period: Duration,
    /// Convergence threshold on the maximum absolute error.
    pub epsilon: f64,
    /// Per-node mailbox capacity. `None` means twice the node count.
    ///
    /// An override must be at least 1. Values below twice the node count can
    /// overflow under normal gossip and abort the run with `MailboxFull`;
    /// they exist for fault injection.
    pub mailbox_capacity: Option<usize>,
    /// Master seed for peer selection. Random when absent.
    pub seed: Option<u64>,
    /// Give up after this many monitor periods, if set.
    pub max_periods: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            round_latency: Duration::from_millis(100),
            monitor_period: Duration::from_secs(2),
            epsilon: 1e-6,
            mailbox_capacity: None,
            seed: None,
            max_periods: None,
        }
    }
}

impl SimulationConfig {
    /// No artificial latency and a short monitor period, for tests and
    /// batch runs.
    pub fn instant() -> Self {
        Self {
            round_latency: Duration::ZERO,
            monitor_period: Duration::from_millis(5),
            ..Self::default()
        }
    }

    /// Fix the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cap the number of monitor periods.
    pub fn with_max_periods(mut self, max_periods: u64) -> Self {
        self.max_periods = Some(max_periods);
        self
    }
}

/// Final, settled state of one node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    /// The node.
    pub id: NodeId,
    /// State after merging every message still in flight at shutdown.
    pub state: PushSumState,
    /// Rounds the node completed.
    pub rounds: u64,
    /// Messages merged during rounds.
    pub received: u64,
    /// Messages merged by the settle pass.
    pub settled: usize,
}

/// Outcome of a converged run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Master seed actually used.
    pub seed: u64,
    /// Mean of the initial values.
    pub true_average: f64,
    /// Last snapshot the monitor reported.
    pub final_snapshot: Snapshot,
    /// Settled node states, indexed by node id.
    pub nodes: Vec<NodeSummary>,
}

impl SimulationReport {
    /// Whether the monitor saw every node within epsilon.
    pub fn converged(&self) -> bool {
        self.final_snapshot.converged
    }

    /// Monitor periods elapsed.
    pub fn periods(&self) -> u64 {
        self.final_snapshot.period
    }

    /// Settled estimates, indexed by node id.
    pub fn estimates(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.state.estimate()).collect()
    }

    /// Sum of every node's settled sum. Equals the sum of the initial values
    /// up to rounding.
    pub fn total_sum(&self) -> f64 {
        self.nodes.iter().map(|n| n.state.sum()).sum()
    }

    /// Sum of every node's settled weight. Equals the node count up to
    /// rounding.
    pub fn total_weight(&self) -> f64 {
        self.nodes.iter().map(|n| n.state.weight()).sum()
    }
}

/// A configured push-sum run over a fixed topology.
pub struct Simulation {
    initial_values: Vec<f64>,
    topology: Topology,
    true_average: f64,
    config: SimulationConfig,
}

impl Simulation {
    /// Validate inputs and build the topology.
    pub fn new(
        initial_values: Vec<f64>,
        kind: TopologyKind,
        config: SimulationConfig,
    ) -> Result<Self> {
        validate_node_count(initial_values.len())?;
        validate_values(&initial_values)?;

        let node_count = initial_values.len();
        match config.mailbox_capacity {
            Some(0) => return Err(SimulationError::InvalidMailboxCapacity(0)),
            Some(capacity) if capacity < 2 * node_count => {
                tracing::warn!(
                    capacity,
                    recommended = 2 * node_count,
                    "Mailbox capacity below twice the node count; sends may overflow"
                );
            }
            _ => {}
        }

        let topology = Topology::build(initial_values.len(), kind)?;
        let true_average =
            mean(&initial_values).ok_or(CoreError::InvalidNodeCount(initial_values.len()))?;

        Ok(Self {
            initial_values,
            topology,
            true_average,
            config,
        })
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.initial_values.len()
    }

    /// The average every node converges to.
    pub fn true_average(&self) -> f64 {
        self.true_average
    }

    /// The topology nodes gossip over.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The run configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Capacity of every node's mailbox.
    pub fn mailbox_capacity(&self) -> usize {
        self.config
            .mailbox_capacity
            .unwrap_or(2 * self.node_count())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Run
    // ─────────────────────────────────────────────────────────────────────────

    /// Run until convergence, reporting a snapshot every monitor period.
    ///
    /// On convergence every node finishes its current round and stops; the
    /// messages still in flight are then merged into their receivers, so the
    /// returned report describes a network with nothing in transit.
    pub async fn run<R>(&self, reporter: &R) -> Result<SimulationReport>
    where
        R: Reporter + ?Sized,
    {
        let node_count = self.node_count();
        let capacity = self.mailbox_capacity();
        let seed = self.config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut seeds = StdRng::seed_from_u64(seed);

        tracing::info!(
            nodes = node_count,
            topology = %self.topology.kind(),
            true_average = self.true_average,
            capacity,
            seed,
            "Starting push-sum simulation"
        );

        let (network, mailboxes) = MailboxNetwork::new(node_count, capacity);
        let monitor_state = MonitorState::new(&self.initial_values, self.true_average);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut nodes = JoinSet::new();
        for (mailbox, &value) in mailboxes.into_iter().zip(&self.initial_values) {
            let id = mailbox.owner();
            let node = GossipNode::new(
                value,
                self.topology.neighbors_of(id)?.to_vec(),
                mailbox,
                network.outbox(id),
                monitor_state.clone(),
                NodeConfig {
                    round_latency: self.config.round_latency,
                    seed: seeds.gen(),
                },
            )?;
            nodes.spawn(node.run(shutdown_rx.clone()));
        }
        drop(shutdown_rx);

        let monitor = ConvergenceMonitor::new(
            monitor_state,
            MonitorConfig {
                period: self.config.monitor_period,
                epsilon: self.config.epsilon,
                max_periods: self.config.max_periods,
            },
        );

        let mut exits = Vec::with_capacity(node_count);
        let watched = {
            let watching = monitor.run(reporter, &shutdown_tx);
            tokio::pin!(watching);

            // nodes only stop early when they fail
            loop {
                tokio::select! {
                    outcome = &mut watching => break Ok(outcome),
                    Some(joined) = nodes.join_next() => match node_result(joined) {
                        Ok(exit) => exits.push(exit),
                        Err(e) => break Err(e),
                    },
                }
            }
        };

        let outcome = match watched {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Node failed, aborting simulation");
                shutdown_tx.send_replace(true);
                while nodes.join_next().await.is_some() {}
                return Err(e.into());
            }
        };

        exits.extend(join_all(&mut nodes).await?);
        let summaries = settle(exits);

        match outcome {
            ConvergenceResult::Converged(snapshot) => {
                tracing::info!(
                    periods = snapshot.period,
                    max_error = snapshot.max_error,
                    "Simulation converged"
                );
                Ok(SimulationReport {
                    seed,
                    true_average: self.true_average,
                    final_snapshot: snapshot,
                    nodes: summaries,
                })
            }
            ConvergenceResult::NotConverged(snapshot) => Err(SimulationError::NotConverged {
                periods: snapshot.period,
                max_error: snapshot.max_error,
            }),
        }
    }
}

fn node_result(
    joined: std::result::Result<pushsum_gossip::Result<NodeExit>, JoinError>,
) -> pushsum_gossip::Result<NodeExit> {
    joined.map_err(|e| GossipError::TaskFailed(e.to_string()))?
}

/// Wait for every remaining node, returning the first failure if any.
async fn join_all(
    nodes: &mut JoinSet<pushsum_gossip::Result<NodeExit>>,
) -> pushsum_gossip::Result<Vec<NodeExit>> {
    let mut exits = Vec::with_capacity(nodes.len());
    let mut failure = None;

    while let Some(joined) = nodes.join_next().await {
        match node_result(joined) {
            Ok(exit) => exits.push(exit),
            Err(e) => {
                tracing::error!(error = %e, "Node failed during shutdown");
                if failure.is_none() {
                    failure = Some(e);
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(exits),
    }
}

/// Merge in-flight messages into their receivers.
///
/// Only sound once every node has stopped sending.
fn settle(mut exits: Vec<NodeExit>) -> Vec<NodeSummary> {
    exits.sort_by_key(|exit| exit.id);
    exits
        .into_iter()
        .map(|mut exit| {
            let in_flight = exit.mailbox.drain_all();
            let settled = exit.state.merge_all(&in_flight);
            NodeSummary {
                id: exit.id,
                state: exit.state,
                rounds: exit.rounds,
                received: exit.received,
                settled,
            }
        })
        .collect()
}
