//! Monitoring state shared between gossip nodes and the convergence monitor,
//! plus the reporting seam for snapshots.

use std::sync::Arc;

use async_trait::async_trait;
use pushsum_core::{CoreError, NodeId};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};

use crate::error::Result;

/// The latest report of one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Local estimate of the global average.
    pub estimate: f64,
    /// Absolute error of the estimate against the true average.
    pub error: f64,
    /// Rounds the node had completed when it reported.
    pub rounds: u64,
}

/// Per-node observations, written by nodes and read by the monitor.
///
/// A single lock covers the whole table. Each node writes only its own
/// entry; readers copy the table out and release the lock immediately. The
/// copy is consistent per node but not across nodes, since rounds are not
/// synchronized.
#[derive(Debug, Clone)]
pub struct MonitorState {
    observations: Arc<Mutex<Vec<Observation>>>,
    true_average: f64,
}

impl MonitorState {
    /// Seed the table with every node's initial value as its round-zero
    /// report.
    pub fn new(initial_values: &[f64], true_average: f64) -> Self {
        let observations = initial_values
            .iter()
            .map(|&value| Observation {
                estimate: value,
                error: (value - true_average).abs(),
                rounds: 0,
            })
            .collect();

        Self {
            observations: Arc::new(Mutex::new(observations)),
            true_average,
        }
    }

    /// The average every node is converging to.
    pub fn true_average(&self) -> f64 {
        self.true_average
    }

    /// Record a node's estimate after a completed round.
    pub async fn record(&self, node: NodeId, estimate: f64, rounds: u64) -> Result<()> {
        let error = (estimate - self.true_average).abs();
        let mut observations = self.observations.lock().await;
        let node_count = observations.len();
        let slot = observations
            .get_mut(node.index())
            .ok_or(CoreError::NodeOutOfRange { node, node_count })?;

        *slot = Observation {
            estimate,
            error,
            rounds,
        };
        Ok(())
    }

    /// Copy out every node's latest observation, indexed by node id.
    pub async fn observations(&self) -> Vec<Observation> {
        self.observations.lock().await.clone()
    }
}

/// What the monitor publishes once per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monitor period this snapshot was taken in, starting at 1.
    pub period: u64,
    /// Largest absolute error across all nodes.
    pub max_error: f64,
    /// Estimates indexed by node id.
    pub estimates: Vec<f64>,
    /// Absolute errors indexed by node id.
    pub errors: Vec<f64>,
    /// Fewest rounds completed by any node.
    pub min_rounds: u64,
    /// Whether `max_error` is below the convergence threshold.
    pub converged: bool,
}

impl Snapshot {
    /// Summarize a set of observations against threshold `epsilon`.
    pub fn from_observations(period: u64, observations: &[Observation], epsilon: f64) -> Self {
        let max_error = observations
            .iter()
            .map(|o| o.error)
            .fold(0.0_f64, f64::max);
        let min_rounds = observations.iter().map(|o| o.rounds).min().unwrap_or(0);

        Self {
            period,
            max_error,
            estimates: observations.iter().map(|o| o.estimate).collect(),
            errors: observations.iter().map(|o| o.error).collect(),
            min_rounds,
            converged: max_error < epsilon,
        }
    }
}

/// Consumer of monitor snapshots, such as a console printer or a UI.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Publish one snapshot. Called once per monitor period.
    async fn report(&self, snapshot: &Snapshot);
}

/// Reports snapshots as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

#[async_trait]
impl Reporter for TracingReporter {
    async fn report(&self, snapshot: &Snapshot) {
        tracing::info!(
            period = snapshot.period,
            max_error = snapshot.max_error,
            min_rounds = snapshot.min_rounds,
            estimates = ?snapshot.estimates,
            "Push-sum progress"
        );
        if snapshot.converged {
            tracing::info!(period = snapshot.period, "Convergence criteria met");
        }
    }
}

/// Forwards snapshots over a channel.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<Snapshot>,
}

impl ChannelReporter {
    /// Create a reporter and the receiver its snapshots arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Snapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Reporter for ChannelReporter {
    async fn report(&self, snapshot: &Snapshot) {
        // a dropped receiver only means nobody is watching
        let _ = self.tx.send(snapshot.clone());
    }
}
