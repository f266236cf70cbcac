//! Convergence monitoring.
//!
//! The monitor wakes once per period, copies the monitoring table, reports a
//! snapshot, and raises the shutdown signal once the largest error across all
//! nodes drops below the threshold. It never touches node state.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::monitor::{MonitorState, Reporter, Snapshot};

/// Configuration for convergence monitoring.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between snapshots.
    pub period: Duration,
    /// Convergence threshold on the maximum absolute error.
    pub epsilon: f64,
    /// Give up after this many periods, if set.
    pub max_periods: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(2),
            epsilon: 1e-6,
            max_periods: None,
        }
    }
}

/// Result of a monitoring run.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvergenceResult {
    /// Every node is within epsilon of the true average.
    Converged(Snapshot),
    /// The period budget ran out first.
    NotConverged(Snapshot),
}

impl ConvergenceResult {
    /// Check if the network converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged(_))
    }

    /// The last snapshot taken.
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            ConvergenceResult::Converged(s) | ConvergenceResult::NotConverged(s) => s,
        }
    }

    /// Consume the result, yielding the last snapshot.
    pub fn into_snapshot(self) -> Snapshot {
        match self {
            ConvergenceResult::Converged(s) | ConvergenceResult::NotConverged(s) => s,
        }
    }
}

/// Periodic observer of the monitoring table.
pub struct ConvergenceMonitor {
    state: MonitorState,
    config: MonitorConfig,
}

impl ConvergenceMonitor {
    /// Create a monitor over `state`.
    pub fn new(state: MonitorState, config: MonitorConfig) -> Self {
        Self { state, config }
    }

    /// Take one snapshot, labelled with `period`.
    ///
    /// The table lock is held only while copying it out.
    pub async fn observe(&self, period: u64) -> Snapshot {
        let observations = self.state.observations().await;
        Snapshot::from_observations(period, &observations, self.config.epsilon)
    }

    /// Monitor until convergence or until the period budget runs out.
    ///
    /// Either way, `shutdown` is raised before returning so that every node
    /// finishes its current round and exits.
    pub async fn run<R>(&self, reporter: &R, shutdown: &watch::Sender<bool>) -> ConvergenceResult
    where
        R: Reporter + ?Sized,
    {
        // tokio rejects a zero interval
        let every = self.config.period.max(Duration::from_millis(1));
        let mut timer = interval_at(Instant::now() + every, every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut period = 0u64;

        let result = loop {
            timer.tick().await;
            period += 1;

            let snapshot = self.observe(period).await;
            tracing::debug!(
                period,
                max_error = snapshot.max_error,
                min_rounds = snapshot.min_rounds,
                "Monitor period complete"
            );
            reporter.report(&snapshot).await;

            if snapshot.converged {
                break ConvergenceResult::Converged(snapshot);
            }
            if self.config.max_periods.is_some_and(|max| period >= max) {
                tracing::warn!(
                    period,
                    max_error = snapshot.max_error,
                    "Period budget exhausted before convergence"
                );
                break ConvergenceResult::NotConverged(snapshot);
            }
        };

        shutdown.send_replace(true);
        result
    }
}
