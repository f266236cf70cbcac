//! Push-sum node state: the (sum, weight) pair and its arithmetic.
//!
//! Every operation here is pure. The concurrent round loop lives in the
//! gossip crate and drives this state.

use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Accumulated (sum, weight) pair of a single node.
///
/// Weight starts at 1.0 and is only ever halved or added to, so it stays
/// strictly positive and `estimate()` is always defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PushSumState {
    sum: f64,
    weight: f64,
}

impl PushSumState {
    /// Initial state for a node holding `value`.
    pub const fn new(value: f64) -> Self {
        Self {
            sum: value,
            weight: 1.0,
        }
    }

    /// Current accumulated sum.
    pub const fn sum(&self) -> f64 {
        self.sum
    }

    /// Current accumulated weight.
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Halve sum and weight, returning the half to transmit.
    ///
    /// The retained half stays in `self`.
    pub fn split(&mut self) -> Message {
        self.sum /= 2.0;
        self.weight /= 2.0;
        Message::new(self.sum, self.weight)
    }

    /// Accumulate a received share.
    pub fn merge(&mut self, message: &Message) {
        self.sum += message.sum;
        self.weight += message.weight;
    }

    /// Merge every message in order, returning how many were merged.
    pub fn merge_all<'a, I>(&mut self, messages: I) -> usize
    where
        I: IntoIterator<Item = &'a Message>,
    {
        let mut merged = 0;
        for message in messages {
            self.merge(message);
            merged += 1;
        }
        merged
    }

    /// Local estimate of the global average.
    pub fn estimate(&self) -> f64 {
        self.sum / self.weight
    }

    /// Absolute error of the estimate against `true_average`.
    pub fn error(&self, true_average: f64) -> f64 {
        (self.estimate() - true_average).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_state_estimates_its_value() {
        let state = PushSumState::new(10.0);
        assert_eq!(state.weight(), 1.0);
        assert_eq!(state.estimate(), 10.0);
    }

    #[test]
    fn test_split_keeps_half() {
        let mut state = PushSumState::new(10.0);
        let message = state.split();

        assert_eq!(message, Message::new(5.0, 0.5));
        assert_eq!(state.sum(), 5.0);
        assert_eq!(state.weight(), 0.5);
        // splitting leaves the estimate untouched
        assert_eq!(state.estimate(), 10.0);
    }

    #[test]
    fn test_two_node_exchange_averages() {
        let mut a = PushSumState::new(10.0);
        let mut b = PushSumState::new(0.0);

        let to_b = a.split();
        let to_a = b.split();
        a.merge(&to_a);
        b.merge(&to_b);

        assert_eq!(a.estimate(), 5.0);
        assert_eq!(b.estimate(), 5.0);
        assert_eq!(a.error(5.0), 0.0);
    }

    #[test]
    fn test_merge_all_counts() {
        let mut state = PushSumState::new(1.0);
        let messages = [Message::new(1.0, 0.5), Message::new(2.0, 0.5)];
        assert_eq!(state.merge_all(&messages), 2);
        assert_eq!(state.sum(), 4.0);
        assert_eq!(state.weight(), 2.0);
        assert_eq!(state.merge_all(&[]), 0);
    }

    proptest! {
        #[test]
        fn test_estimate_idempotent(value in -1e6f64..1e6, splits in 0usize..20) {
            let mut state = PushSumState::new(value);
            for _ in 0..splits {
                state.split();
            }
            let snapshot = state;
            prop_assert_eq!(state.estimate().to_bits(), state.estimate().to_bits());
            prop_assert_eq!(state, snapshot);
        }

        #[test]
        fn test_split_then_merge_conserves(value in -1e6f64..1e6) {
            let mut sender = PushSumState::new(value);
            let mut receiver = PushSumState::new(0.0);
            let message = sender.split();
            receiver.merge(&message);

            prop_assert_eq!(sender.sum() + receiver.sum(), value);
            prop_assert_eq!(sender.weight() + receiver.weight(), 2.0);
            prop_assert!(sender.weight() > 0.0);
        }
    }
}
