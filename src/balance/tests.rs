//! Load Balancing Tests
//!
//! Validates membership (a strategy never invents an endpoint), the
//! round-robin cycle and the statistical behavior of weighted draws.

#[cfg(test)]
mod tests {
    use crate::balance::strategy::{
        self, random, reset_round_robin, round_robin, select, weighted_random, Strategy,
    };
    use crate::error::RpcError;
    use crate::registry::types::Endpoint;
    use std::collections::HashMap;

    fn candidates(count: u16) -> Vec<Endpoint> {
        (0..count)
            .map(|i| Endpoint::new("10.0.0.1", 8080 + i))
            .collect()
    }

    // ============================================================
    // MEMBERSHIP
    // ============================================================

    #[test]
    fn test_every_strategy_returns_a_candidate() {
        let endpoints = candidates(5);

        for _ in 0..200 {
            let picked = random(&endpoints).unwrap();
            assert!(endpoints.contains(picked), "random picked a stranger");

            let picked = weighted_random(&endpoints).unwrap();
            assert!(endpoints.contains(picked), "weighted picked a stranger");

            let picked = select(&endpoints, Strategy::Random).unwrap();
            assert!(endpoints.contains(picked));
        }
    }

    #[test]
    fn test_single_candidate_always_wins() {
        let endpoints = candidates(1);
        for _ in 0..50 {
            assert_eq!(random(&endpoints).unwrap(), &endpoints[0]);
            assert_eq!(weighted_random(&endpoints).unwrap(), &endpoints[0]);
        }
    }

    // ============================================================
    // ROUND ROBIN
    // ============================================================

    // The counter is one process-wide sequence, so every round-robin
    // assertion lives in this single test body.
    #[test]
    fn test_round_robin_visits_each_candidate_once_per_cycle() {
        let endpoints = candidates(4);
        reset_round_robin();

        let mut first_cycle: Vec<String> = Vec::new();
        for _ in 0..endpoints.len() {
            let picked = round_robin(&endpoints).unwrap();
            assert!(endpoints.contains(picked), "round robin picked a stranger");
            first_cycle.push(picked.address());
        }

        let unique: std::collections::HashSet<_> = first_cycle.iter().collect();
        assert_eq!(
            unique.len(),
            endpoints.len(),
            "one full cycle must visit every endpoint exactly once: {first_cycle:?}"
        );

        // Second cycle repeats the same order.
        let mut second_cycle: Vec<String> = Vec::new();
        for _ in 0..endpoints.len() {
            second_cycle.push(round_robin(&endpoints).unwrap().address());
        }
        assert_eq!(first_cycle, second_cycle, "the sequence is periodic");

        // The sequence is shared across candidate lists: advancing it against
        // a different list shifts where the next cycle starts.
        let other = candidates(3);
        let _ = round_robin(&other).unwrap();
        let shifted = round_robin(&endpoints).unwrap().address();
        assert_eq!(
            shifted, endpoints[1].address(),
            "foreign draws advance the same sequence"
        );
    }

    // ============================================================
    // WEIGHTED RANDOM
    // ============================================================

    #[test]
    fn test_weighted_random_follows_the_weights() {
        let endpoints = vec![
            Endpoint::new("10.0.0.1", 8080).with_weight(1),
            Endpoint::new("10.0.0.2", 8080).with_weight(4),
        ];

        let mut counts: HashMap<String, usize> = HashMap::new();
        let draws = 5000;
        for _ in 0..draws {
            let picked = weighted_random(&endpoints).unwrap();
            *counts.entry(picked.address()).or_insert(0) += 1;
        }

        // Expected split 1000 / 4000; allow generous statistical slack.
        let light = counts.get("10.0.0.1:8080").copied().unwrap_or(0);
        let heavy = counts.get("10.0.0.2:8080").copied().unwrap_or(0);
        assert!(
            (600..=1400).contains(&light),
            "weight-1 endpoint drew {light} of {draws}"
        );
        assert!(
            (3600..=4400).contains(&heavy),
            "weight-4 endpoint drew {heavy} of {draws}"
        );
    }

    #[test]
    fn test_weighted_random_equal_weights_reach_everyone() {
        let endpoints = candidates(3);
        let mut seen: HashMap<String, usize> = HashMap::new();
        for _ in 0..600 {
            let picked = weighted_random(&endpoints).unwrap();
            *seen.entry(picked.address()).or_insert(0) += 1;
        }
        assert_eq!(seen.len(), 3, "every equal-weight endpoint gets traffic");
    }

    // ============================================================
    // EMPTY INPUT
    // ============================================================

    #[test]
    fn test_empty_candidates_are_rejected() {
        let empty: Vec<Endpoint> = Vec::new();

        for strat in [
            Strategy::Random,
            Strategy::RoundRobin,
            Strategy::WeightedRandom,
        ] {
            let err = strategy::select(&empty, strat).unwrap_err();
            assert!(
                matches!(err, RpcError::InvalidArgument(_)),
                "{strat:?} must reject an empty list, got: {err}"
            );
        }
    }
}
