//! Balanced game selection.
//!
//! Pure function: partition candidates by outcome, fill fixed per-outcome
//! quotas, then backfill from the remaining pool in the caller's priority
//! order until the target is reached or the pool runs dry.

use std::collections::HashSet;

use crate::domain::models::{CandidateGame, GameOutcome, SelectionQuotas};

/// Select a bounded, outcome-balanced subset of the raw candidate list.
///
/// Quotas are hard per-outcome caps: a short category is never padded
/// from another category's surplus. Backfill only spends the headroom
/// quotas leave below the target (quota sums ≤ target are allowed), drawn
/// from the remaining pool in priority order.
///
/// The input order is the caller's priority order and is preserved in the
/// output. Duplicate ids keep their first occurrence only. The result may
/// be shorter than `target` when the pool is too small; it is never
/// padded.
pub fn select_games(
    raw: Vec<CandidateGame>,
    target: usize,
    quotas: &SelectionQuotas,
) -> Vec<CandidateGame> {
    if target == 0 {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let pool: Vec<CandidateGame> = raw
        .into_iter()
        .filter(|candidate| seen.insert(candidate.game_id.clone()))
        .collect();

    let mut taken = vec![false; pool.len()];
    let mut selected = 0usize;

    // Quota pass: up to the per-outcome quota each, in priority order
    let (mut wins, mut losses, mut draws) = (0usize, 0usize, 0usize);
    for (i, candidate) in pool.iter().enumerate() {
        if selected >= target {
            break;
        }
        let (used, quota) = match candidate.outcome {
            GameOutcome::Win => (&mut wins, quotas.win),
            GameOutcome::Loss => (&mut losses, quotas.loss),
            GameOutcome::Draw => (&mut draws, quotas.draw),
        };
        if *used < quota {
            *used += 1;
            taken[i] = true;
            selected += 1;
        }
    }

    // Backfill pass: spend the headroom below target that the quotas do
    // not claim, from the remaining pool in priority order
    let backfill_budget = target.saturating_sub(quotas.total().min(target));
    let mut backfilled = 0usize;
    for take in &mut taken {
        if selected >= target || backfilled >= backfill_budget {
            break;
        }
        if !*take {
            *take = true;
            selected += 1;
            backfilled += 1;
        }
    }

    pool.into_iter()
        .zip(taken)
        .filter_map(|(candidate, take)| take.then_some(candidate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(id: &str, outcome: GameOutcome) -> CandidateGame {
        CandidateGame {
            game_id: id.to_string(),
            player_id: "magnus".to_string(),
            outcome,
            rating: None,
            played_at: None,
            raw: json!({}),
        }
    }

    fn pool(wins: usize, losses: usize, draws: usize) -> Vec<CandidateGame> {
        let mut pool = Vec::new();
        for i in 0..wins {
            pool.push(candidate(&format!("w{i}"), GameOutcome::Win));
        }
        for i in 0..losses {
            pool.push(candidate(&format!("l{i}"), GameOutcome::Loss));
        }
        for i in 0..draws {
            pool.push(candidate(&format!("d{i}"), GameOutcome::Draw));
        }
        pool
    }

    fn default_quotas() -> SelectionQuotas {
        SelectionQuotas { win: 10, loss: 10, draw: 5 }
    }

    #[test]
    fn test_balanced_selection_with_ample_pool() {
        let selected = select_games(pool(15, 12, 10), 25, &default_quotas());

        assert_eq!(selected.len(), 25);
        let wins = selected.iter().filter(|c| c.outcome == GameOutcome::Win).count();
        let losses = selected.iter().filter(|c| c.outcome == GameOutcome::Loss).count();
        let draws = selected.iter().filter(|c| c.outcome == GameOutcome::Draw).count();
        // 10 + 10 + 5 from quotas
        assert_eq!(wins, 10);
        assert_eq!(losses, 10);
        assert_eq!(draws, 5);
    }

    #[test]
    fn test_short_categories_are_not_padded() {
        // 12 wins / 3 losses / 1 draw: wins capped at 10, losses and
        // draws pool-limited. The quotas claim the whole target, so no
        // backfill happens and the result stays at 14.
        let selected = select_games(pool(12, 3, 1), 25, &default_quotas());

        assert_eq!(selected.len(), 14);
        let wins = selected.iter().filter(|c| c.outcome == GameOutcome::Win).count();
        let losses = selected.iter().filter(|c| c.outcome == GameOutcome::Loss).count();
        let draws = selected.iter().filter(|c| c.outcome == GameOutcome::Draw).count();
        assert_eq!((wins, losses, draws), (10, 3, 1));
    }

    #[test]
    fn test_backfill_stops_at_target() {
        let quotas = SelectionQuotas { win: 2, loss: 2, draw: 1 };
        let selected = select_games(pool(10, 10, 10), 8, &quotas);

        assert_eq!(selected.len(), 8);
        // 5 by quota, 3 backfilled in priority order (wins come first)
        let wins = selected.iter().filter(|c| c.outcome == GameOutcome::Win).count();
        assert_eq!(wins, 5);
    }

    #[test]
    fn test_no_duplicate_ids() {
        let mut raw = pool(5, 5, 5);
        raw.extend(pool(5, 5, 5)); // every id twice
        let selected = select_games(raw, 25, &default_quotas());

        let mut ids: Vec<_> = selected.iter().map(|c| c.game_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), selected.len());
        assert_eq!(selected.len(), 15);
    }

    #[test]
    fn test_preserves_priority_order() {
        let raw = vec![
            candidate("a", GameOutcome::Win),
            candidate("b", GameOutcome::Loss),
            candidate("c", GameOutcome::Win),
            candidate("d", GameOutcome::Draw),
        ];
        let selected = select_games(raw, 4, &default_quotas());
        let ids: Vec<_> = selected.iter().map(|c| c.game_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(select_games(Vec::new(), 25, &default_quotas()).is_empty());
        assert!(select_games(pool(3, 3, 3), 0, &default_quotas()).is_empty());
    }

    #[test]
    fn test_target_smaller_than_quota_sum() {
        let selected = select_games(pool(10, 10, 5), 3, &default_quotas());
        assert_eq!(selected.len(), 3);
    }
}
