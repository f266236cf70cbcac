//! Test fixtures and helpers.
//!
//! Includes a single-threaded, lock-step push-sum network that follows the
//! same round rules as the concurrent runtime but is fully deterministic, so
//! conservation and convergence can be checked without a scheduler.

use pushsum::SimulationConfig;
use pushsum_core::{Message, NodeId, PushSumState, Topology, TopologyKind};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Deterministic push-sum network driven one round at a time.
#[derive(Debug, Clone)]
pub struct LockstepNetwork {
    topology: Topology,
    states: Vec<PushSumState>,
    /// Messages sent but not yet drained, per receiver.
    pending: Vec<Vec<Message>>,
    rng: StdRng,
    rounds: usize,
}

impl LockstepNetwork {
    /// Create a network with one node per initial value.
    pub fn new(initial_values: &[f64], kind: TopologyKind, seed: u64) -> pushsum_core::Result<Self> {
        let topology = Topology::build(initial_values.len(), kind)?;
        Ok(Self {
            topology,
            states: initial_values.iter().copied().map(PushSumState::new).collect(),
            pending: vec![Vec::new(); initial_values.len()],
            rng: StdRng::seed_from_u64(seed),
            rounds: 0,
        })
    }

    /// Every node splits and sends, then every node drains.
    pub fn round(&mut self) {
        self.round_partial(|_| true);
    }

    /// Every node splits and sends; only nodes for which `drains` returns
    /// true drain their mailbox this round.
    pub fn round_partial<F>(&mut self, mut drains: F)
    where
        F: FnMut(usize) -> bool,
    {
        for node in NodeId::all(self.states.len()) {
            let share = self.states[node.index()].split();
            let peer = self
                .topology
                .neighbors_of(node)
                .ok()
                .and_then(|peers| peers.choose(&mut self.rng).copied());
            match peer {
                Some(peer) => self.pending[peer.index()].push(share),
                // unreachable for a valid topology; keep the share
                None => self.states[node.index()].merge(&share),
            }
        }

        for index in 0..self.states.len() {
            if drains(index) {
                let inbound = std::mem::take(&mut self.pending[index]);
                self.states[index].merge_all(&inbound);
            }
        }
        self.rounds += 1;
    }

    /// Run full rounds until every estimate is within `epsilon` of
    /// `average`, returning the number of rounds taken.
    pub fn run_until(&mut self, average: f64, epsilon: f64, max_rounds: usize) -> Option<usize> {
        let start = self.rounds;
        while self.max_error(average) >= epsilon {
            if self.rounds - start >= max_rounds {
                return None;
            }
            self.round();
        }
        Some(self.rounds - start)
    }

    /// Deliver every pending message.
    pub fn settle(&mut self) {
        for (state, pending) in self.states.iter_mut().zip(self.pending.iter_mut()) {
            state.merge_all(pending.iter());
            pending.clear();
        }
    }

    /// Node states, indexed by node id.
    pub fn states(&self) -> &[PushSumState] {
        &self.states
    }

    /// Estimates, indexed by node id.
    pub fn estimates(&self) -> Vec<f64> {
        self.states.iter().map(PushSumState::estimate).collect()
    }

    /// Largest absolute error against `average`.
    pub fn max_error(&self, average: f64) -> f64 {
        self.states
            .iter()
            .map(|s| s.error(average))
            .fold(0.0, f64::max)
    }

    /// Sum held by nodes, excluding messages in flight.
    pub fn total_sum(&self) -> f64 {
        self.states.iter().map(PushSumState::sum).sum()
    }

    /// Weight held by nodes, excluding messages in flight.
    pub fn total_weight(&self) -> f64 {
        self.states.iter().map(PushSumState::weight).sum()
    }

    /// (sum, weight) carried by messages in flight.
    pub fn in_flight(&self) -> (f64, f64) {
        self.pending
            .iter()
            .flatten()
            .fold((0.0, 0.0), |(s, w), m| (s + m.sum, w + m.weight))
    }

    /// Rounds run so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

/// Configuration for fast, reproducible test runs.
pub fn fast_config(seed: u64) -> SimulationConfig {
    SimulationConfig::instant()
        .with_seed(seed)
        .with_max_periods(4_000)
}

/// A named simulation input.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub initial_values: Vec<f64>,
    pub kind: TopologyKind,
}

impl Scenario {
    /// Mean of the initial values.
    pub fn true_average(&self) -> f64 {
        pushsum_core::mean(&self.initial_values).unwrap_or_default()
    }
}

/// The two-node `[10, 0]` scenario on every topology.
pub fn two_node_scenarios() -> Vec<Scenario> {
    TopologyKind::ALL
        .iter()
        .map(|&kind| Scenario {
            name: kind.name(),
            initial_values: vec![10.0, 0.0],
            kind,
        })
        .collect()
}

/// Small multi-node scenarios, one per topology.
pub fn small_scenarios() -> Vec<Scenario> {
    let values = vec![3.0, -7.5, 12.0, 0.0, 42.0, 8.25];
    TopologyKind::ALL
        .iter()
        .map(|&kind| Scenario {
            name: kind.name(),
            initial_values: values.clone(),
            kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_node_lockstep_averages_in_one_round() {
        let mut network = LockstepNetwork::new(&[10.0, 0.0], TopologyKind::Line, 0).unwrap();
        network.round();
        assert_eq!(network.estimates(), vec![5.0, 5.0]);
        assert_eq!(network.rounds(), 1);
    }

    #[test]
    fn test_lagging_node_keeps_mail_in_flight() {
        let mut network = LockstepNetwork::new(&[10.0, 0.0], TopologyKind::Complete, 0).unwrap();
        network.round_partial(|node| node == 0);

        // node 1 did not drain, so node 0's share is still in flight
        assert_eq!(network.in_flight(), (5.0, 0.5));
        assert_eq!(network.total_sum(), 5.0);

        network.settle();
        assert_eq!(network.in_flight(), (0.0, 0.0));
        assert_eq!(network.total_sum(), 10.0);
        assert_eq!(network.total_weight(), 2.0);
    }

    #[test]
    fn test_small_scenarios_converge() {
        for scenario in small_scenarios() {
            let mut network =
                LockstepNetwork::new(&scenario.initial_values, scenario.kind, 9).unwrap();
            let rounds = network.run_until(scenario.true_average(), 1e-6, 100_000);
            assert!(rounds.is_some(), "{} did not converge", scenario.name);
        }
    }

    #[test]
    fn test_rejects_single_node() {
        assert!(LockstepNetwork::new(&[1.0], TopologyKind::Ring, 0).is_err());
    }
}
