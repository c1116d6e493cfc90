//! Action selection over a value table

use rand::Rng;

use crate::QTable;

/// Rule for picking an action in a state from the current value estimates
pub trait Policy {
    /// Select an action for `state`
    fn select<R: Rng + ?Sized>(&self, q: &QTable, state: usize, rng: &mut R) -> usize;
}

/// Greedy selection that breaks only the degenerate tie.
///
/// When every action in the row has the same value (the all-zero row of a
/// fresh table included) an action is drawn uniformly at random. Any other
/// tie goes to the lowest-indexed maximal action.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieBreakGreedy;

impl Policy for TieBreakGreedy {
    fn select<R: Rng + ?Sized>(&self, q: &QTable, state: usize, rng: &mut R) -> usize {
        if q.is_uniform(state) {
            rng.gen_range(0..q.num_actions())
        } else {
            q.greedy_action(state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_greedy_when_row_differs() {
        let mut q = QTable::zeros(2, 3);
        q.set(1, 2, 0.1);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(TieBreakGreedy.select(&q, 1, &mut rng), 2);
        }
    }

    #[test]
    fn test_partial_tie_is_not_randomised() {
        let mut q = QTable::zeros(1, 3);
        q.set(0, 1, 1.0);
        q.set(0, 2, 1.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(TieBreakGreedy.select(&q, 0, &mut rng), 1);
        }
    }

    #[test]
    fn test_all_equal_row_covers_every_action() {
        let mut q = QTable::zeros(1, 4);
        for a in 0..4 {
            q.set(0, a, 0.5);
        }
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[TieBreakGreedy.select(&q, 0, &mut rng)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
