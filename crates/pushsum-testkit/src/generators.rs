//! Proptest generators for property-based testing.

use proptest::prelude::*;

use pushsum_core::TopologyKind;

/// Generate a topology kind.
pub fn topology_kind() -> impl Strategy<Value = TopologyKind> {
    prop_oneof![
        Just(TopologyKind::Ring),
        Just(TopologyKind::Line),
        Just(TopologyKind::Star),
        Just(TopologyKind::Complete),
    ]
}

/// Generate a valid node count in `2..=max`.
pub fn node_count(max: usize) -> impl Strategy<Value = usize> {
    2usize..=max.max(2)
}

/// Generate a finite initial value.
pub fn initial_value() -> impl Strategy<Value = f64> {
    -1_000.0f64..1_000.0
}

/// Generate initial values for `2..=max_nodes` nodes.
pub fn initial_values(max_nodes: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(initial_value(), 2..=max_nodes.max(2))
}

/// Parameters for one push-sum network.
#[derive(Debug, Clone)]
pub struct NetworkParams {
    pub initial_values: Vec<f64>,
    pub kind: TopologyKind,
    pub seed: u64,
}

impl Arbitrary for NetworkParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (initial_values(12), topology_kind(), any::<u64>())
            .prop_map(|(initial_values, kind, seed)| NetworkParams {
                initial_values,
                kind,
                seed,
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::LockstepNetwork;
    use pushsum_core::mean;

    proptest! {
        #[test]
        fn test_lockstep_conserves_mass(
            params: NetworkParams,
            rounds in 0usize..50,
            drain_mask in any::<u64>(),
        ) {
            let mut network =
                LockstepNetwork::new(&params.initial_values, params.kind, params.seed).unwrap();
            let initial_sum: f64 = params.initial_values.iter().sum();
            let n = params.initial_values.len() as f64;

            for round in 0..rounds {
                // let a varying subset of nodes fall behind on draining
                let mask = drain_mask.rotate_left(round as u32);
                network.round_partial(|node| mask & (1 << (node % 64)) != 0);

                let tolerance = 1e-9 * (1.0 + initial_sum.abs() + n * 1_000.0);
                prop_assert!((network.total_sum() + network.in_flight().0 - initial_sum).abs() < tolerance);
                prop_assert!((network.total_weight() + network.in_flight().1 - n).abs() < 1e-9);
            }

            network.settle();
            prop_assert_eq!(network.in_flight(), (0.0, 0.0));
            prop_assert!(network.states().iter().all(|s| s.weight() > 0.0));
        }

        #[test]
        fn test_lockstep_converges(params: NetworkParams) {
            let mut network =
                LockstepNetwork::new(&params.initial_values, params.kind, params.seed).unwrap();
            let average = mean(&params.initial_values).unwrap();

            let rounds = network.run_until(average, 1e-6, 200_000);
            prop_assert!(rounds.is_some(), "did not converge: max error {}", network.max_error(average));
        }

        #[test]
        fn test_same_seed_same_trajectory(params: NetworkParams) {
            let mut a = LockstepNetwork::new(&params.initial_values, params.kind, params.seed).unwrap();
            let mut b = LockstepNetwork::new(&params.initial_values, params.kind, params.seed).unwrap();
            for _ in 0..20 {
                a.round();
                b.round();
            }
            prop_assert_eq!(a.estimates(), b.estimates());
        }
    }
}
