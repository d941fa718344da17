//! Property-based tests for scoring and status invariants
//!
//! - Dice identity, symmetry, empty input and bounds
//! - Name scores stay in [0, 1] and drop sub-threshold evidence
//! - `is_match` always agrees with the score
//! - Status derivation ignores result order

use proptest::prelude::*;
use sanctions_screening::{
    derive_status, dice_score, name_score,
    normalize::name_pairs,
    MatchResult, NamePart, NamePartKind, PartyRecord, ScreeningEngine, ScreeningQuery,
    SimilarityScorer, Watchlist, WatchlistStore, DEFAULT_MATCH_THRESHOLD,
};
use std::sync::Arc;

/// Strategy for single words
fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,9}"
}

/// Strategy for names of one to four words, with occasional commas
fn name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(word_strategy(), 1..5).prop_flat_map(|words| {
        prop::bool::ANY.prop_map(move |comma| {
            if comma && words.len() > 1 {
                format!("{}, {}", words[0], words[1..].join(" "))
            } else {
                words.join(" ")
            }
        })
    })
}

/// Strategy for match results with a score in [0, 1]
fn result_strategy() -> impl Strategy<Value = MatchResult> {
    prop_oneof![Just(1.0), Just(0.0), 0.0f64..1.0].prop_map(|score| {
        let mut result = MatchResult::no_match(&ScreeningQuery::new("someone"));
        result.match_score = score;
        result.is_match = score >= DEFAULT_MATCH_THRESHOLD;
        result
    })
}

fn engine_with(names: &[String]) -> ScreeningEngine {
    let store = Arc::new(WatchlistStore::default());
    let records = names
        .iter()
        .map(|name| PartyRecord {
            name_parts: vec![NamePart::new(NamePartKind::WholeName, name.clone())],
            ..PartyRecord::default()
        })
        .collect();
    store.install(Watchlist::from_records("prop", records));
    ScreeningEngine::new(store, SimilarityScorer::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: a non-empty string is identical to itself
    #[test]
    fn prop_dice_identity(a in "[a-z ]{1,20}") {
        prop_assert_eq!(dice_score(&a, &a), 1.0);
    }

    /// Property: Dice is symmetric
    #[test]
    fn prop_dice_symmetric(a in name_strategy(), b in name_strategy()) {
        prop_assert_eq!(dice_score(&a, &b), dice_score(&b, &a));
    }

    /// Property: empty input scores zero
    #[test]
    fn prop_dice_empty(x in "[a-z ]{0,20}") {
        prop_assert_eq!(dice_score("", &x), 0.0);
        prop_assert_eq!(dice_score(&x, ""), 0.0);
    }

    /// Property: Dice stays in [0, 1]
    #[test]
    fn prop_dice_bounded(a in name_strategy(), b in name_strategy()) {
        let score = dice_score(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    /// Property: name scores stay in [0, 1] and are zero when no query
    /// word-pair reaches the threshold against any candidate word-pair
    #[test]
    fn prop_name_score_threshold(query in name_strategy(), candidate in name_strategy()) {
        let score = name_score(&query, &candidate, DEFAULT_MATCH_THRESHOLD);
        prop_assert!((0.0..=1.0).contains(&score));

        let candidate_pairs = name_pairs(&candidate);
        let any_contributes = name_pairs(&query).iter().any(|q| {
            candidate_pairs
                .iter()
                .any(|c| dice_score(q, c) >= DEFAULT_MATCH_THRESHOLD)
        });

        if any_contributes {
            prop_assert!(score >= DEFAULT_MATCH_THRESHOLD);
        } else {
            prop_assert_eq!(score, 0.0);
        }
    }

    /// Property: is_match agrees with the score for every check
    #[test]
    fn prop_is_match_consistent(
        listed in prop::collection::vec(name_strategy(), 0..6),
        query in name_strategy(),
    ) {
        let engine = engine_with(&listed);
        let result = engine.check_name(&query);

        prop_assert!((0.0..=1.0).contains(&result.match_score));
        prop_assert_eq!(result.is_match, result.match_score >= DEFAULT_MATCH_THRESHOLD);
        prop_assert_eq!(result.matched_name.is_some(), result.match_score > 0.0);
    }

    /// Property: a listed multi-word name is found exactly
    #[test]
    fn prop_listed_name_matches_exactly(
        first in word_strategy(),
        last in word_strategy(),
    ) {
        let name = format!("{} {}", first, last);
        let engine = engine_with(&[name.clone()]);
        let result = engine.check_name(&name.to_uppercase());
        prop_assert_eq!(result.match_score, 1.0);
        prop_assert_eq!(result.matched_name, Some(name));
    }

    /// Property: status is independent of result order
    #[test]
    fn prop_status_order_independent(
        results in prop::collection::vec(result_strategy(), 0..8),
        seed in any::<u64>(),
    ) {
        let expected = derive_status(&results);

        let mut shuffled = results.clone();
        let len = shuffled.len();
        if len > 1 {
            shuffled.rotate_left((seed as usize) % len);
            shuffled.swap(0, len - 1);
        }
        prop_assert_eq!(derive_status(&shuffled), expected);
    }
}
