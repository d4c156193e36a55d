//! Execution order of control and candidates
//!
//! Randomized mode shuffles the candidates and draws the control's slot
//! uniformly from `0..=candidates`, which yields a uniform permutation of
//! all cases.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::ExperimentConfig;

/// Reorder `candidates` in place into their execution order and return how
/// many of them run before the control.
pub(crate) fn arrange<C>(candidates: &mut [C], config: &ExperimentConfig) -> usize {
    match config.seed {
        Some(seed) => arrange_with(candidates, config, &mut StdRng::seed_from_u64(seed)),
        None => arrange_with(candidates, config, &mut rand::thread_rng()),
    }
}

fn arrange_with<C, R: Rng + ?Sized>(
    candidates: &mut [C],
    config: &ExperimentConfig,
    rng: &mut R,
) -> usize {
    if config.randomize {
        candidates.shuffle(rng);
    }
    if config.candidates_first {
        candidates.len()
    } else if config.randomize {
        rng.gen_range(0..=candidates.len())
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn ordered() -> ExperimentConfig {
        ExperimentConfig::default().randomize(false)
    }

    #[test]
    fn test_ordered_runs_control_first() {
        let mut cases: Vec<usize> = (0..10).collect();
        assert_eq!(arrange(&mut cases, &ordered()), 0);
        assert_eq!(cases, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_candidates_first_runs_control_last() {
        for config in [
            ordered().candidates_first(true),
            ExperimentConfig::default().candidates_first(true),
        ] {
            let mut cases: Vec<usize> = (0..100).collect();
            assert_eq!(arrange(&mut cases, &config), 100);
        }
    }

    #[test]
    fn test_randomized_control_position_varies() {
        let config = ExperimentConfig::default();
        let positions: HashSet<usize> = (0..5)
            .map(|_| {
                let mut cases: Vec<usize> = (0..100).collect();
                arrange(&mut cases, &config)
            })
            .collect();
        assert!(positions.len() > 1);
    }

    #[test]
    fn test_seed_reproduces_order() {
        let config = ExperimentConfig::default().seed(1234);
        let mut first: Vec<usize> = (0..50).collect();
        let mut second: Vec<usize> = (0..50).collect();

        let a = arrange(&mut first, &config);
        let b = arrange(&mut second, &config);

        assert_eq!(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_candidates() {
        let mut cases: Vec<usize> = Vec::new();
        assert_eq!(arrange(&mut cases, &ExperimentConfig::default()), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: arranging is a permutation and the control slot is in range
        #[test]
        fn prop_arrange_is_permutation(
            n in 0usize..64,
            randomize in any::<bool>(),
            candidates_first in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let config = ExperimentConfig::default()
                .randomize(randomize)
                .candidates_first(candidates_first)
                .seed(seed);
            let mut cases: Vec<usize> = (0..n).collect();

            let control_at = arrange(&mut cases, &config);

            prop_assert!(control_at <= n);
            let mut sorted = cases.clone();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, (0..n).collect::<Vec<_>>());
        }
    }
}
