//! Property-based tests for the balanced selector.

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::json;

use kibitzer::domain::models::{CandidateGame, GameOutcome, SelectionQuotas};
use kibitzer::services::select_games;

fn arb_outcome() -> impl Strategy<Value = GameOutcome> {
    prop_oneof![
        Just(GameOutcome::Win),
        Just(GameOutcome::Loss),
        Just(GameOutcome::Draw),
    ]
}

fn arb_candidates() -> impl Strategy<Value = Vec<CandidateGame>> {
    prop::collection::vec((0..200u32, arb_outcome()), 0..60).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(n, outcome)| CandidateGame {
                game_id: format!("g{n}"),
                player_id: "magnus".to_string(),
                outcome,
                rating: None,
                played_at: None,
                raw: json!({}),
            })
            .collect()
    })
}

fn arb_quotas() -> impl Strategy<Value = SelectionQuotas> {
    (0..15usize, 0..15usize, 0..15usize)
        .prop_map(|(win, loss, draw)| SelectionQuotas { win, loss, draw })
}

proptest! {
    #[test]
    fn selection_never_exceeds_target(
        raw in arb_candidates(),
        target in 0..40usize,
        quotas in arb_quotas(),
    ) {
        let selected = select_games(raw, target, &quotas);
        prop_assert!(selected.len() <= target);
    }

    #[test]
    fn selection_has_no_duplicate_ids(
        raw in arb_candidates(),
        target in 0..40usize,
        quotas in arb_quotas(),
    ) {
        let selected = select_games(raw, target, &quotas);
        let ids: HashSet<_> = selected.iter().map(|c| c.game_id.clone()).collect();
        prop_assert_eq!(ids.len(), selected.len());
    }

    #[test]
    fn selection_is_a_subset_of_input(
        raw in arb_candidates(),
        target in 0..40usize,
        quotas in arb_quotas(),
    ) {
        let input_ids: HashSet<_> = raw.iter().map(|c| c.game_id.clone()).collect();
        let selected = select_games(raw, target, &quotas);
        for candidate in &selected {
            prop_assert!(input_ids.contains(&candidate.game_id));
        }
    }

    #[test]
    fn quotas_cap_each_outcome_when_they_claim_the_target(
        raw in arb_candidates(),
        quotas in arb_quotas(),
    ) {
        // With target == quota sum there is no backfill headroom, so
        // every outcome stays within its own quota.
        let target = quotas.total();
        let selected = select_games(raw, target, &quotas);

        let count = |outcome: GameOutcome| {
            selected.iter().filter(|c| c.outcome == outcome).count()
        };
        prop_assert!(count(GameOutcome::Win) <= quotas.win);
        prop_assert!(count(GameOutcome::Loss) <= quotas.loss);
        prop_assert!(count(GameOutcome::Draw) <= quotas.draw);
    }

    #[test]
    fn selection_preserves_input_order(
        raw in arb_candidates(),
        target in 0..40usize,
        quotas in arb_quotas(),
    ) {
        // Dedup keeps the first occurrence, so positions are taken from
        // the deduplicated input.
        let mut seen = HashSet::new();
        let deduped: Vec<_> = raw
            .iter()
            .filter(|c| seen.insert(c.game_id.clone()))
            .cloned()
            .collect();
        let positions: std::collections::HashMap<_, _> = deduped
            .iter()
            .enumerate()
            .map(|(i, c)| (c.game_id.clone(), i))
            .collect();

        let selected = select_games(raw, target, &quotas);
        let selected_positions: Vec<_> = selected
            .iter()
            .map(|c| positions[&c.game_id])
            .collect();
        let mut sorted = selected_positions.clone();
        sorted.sort_unstable();
        prop_assert_eq!(selected_positions, sorted);
    }
}
