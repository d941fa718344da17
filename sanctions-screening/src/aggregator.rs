//! Transaction-level status from a set of name screenings

use crate::types::{MatchResult, ScreeningStatus};

/// Derive one status from every result of a transaction's screening run.
///
/// First rule that applies wins:
/// 1. any exact (1.0) match: `Flagged`
/// 2. any other match: `Pending`
/// 3. at least one result: `Clear`
/// 4. no results yet: `Pending`
///
/// The outcome depends only on the set of results, not their order.
pub fn derive_status(results: &[MatchResult]) -> ScreeningStatus {
    if results.iter().any(MatchResult::is_exact) {
        ScreeningStatus::Flagged
    } else if results.iter().any(|r| r.is_match) {
        ScreeningStatus::Pending
    } else if !results.is_empty() {
        ScreeningStatus::Clear
    } else {
        ScreeningStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScreeningQuery;

    fn result(score: f64) -> MatchResult {
        let mut result = MatchResult::no_match(&ScreeningQuery::new("someone"));
        result.match_score = score;
        result.is_match = score >= 0.75;
        result
    }

    #[test]
    fn test_exact_match_flags() {
        let results = vec![result(0.0), result(1.0), result(0.4)];
        assert_eq!(derive_status(&results), ScreeningStatus::Flagged);
    }

    #[test]
    fn test_exact_match_overrides_partial() {
        let results = vec![result(0.9), result(1.0)];
        assert_eq!(derive_status(&results), ScreeningStatus::Flagged);
    }

    #[test]
    fn test_partial_match_is_pending() {
        let results = vec![result(0.0), result(0.75)];
        assert_eq!(derive_status(&results), ScreeningStatus::Pending);
    }

    #[test]
    fn test_all_below_threshold_is_clear() {
        let results = vec![result(0.0), result(0.74), result(0.5)];
        assert_eq!(derive_status(&results), ScreeningStatus::Clear);
    }

    #[test]
    fn test_no_results_is_pending() {
        assert_eq!(derive_status(&[]), ScreeningStatus::Pending);
    }

    #[test]
    fn test_order_independent() {
        let mut results = vec![result(0.8), result(0.1), result(1.0), result(0.0)];
        let expected = derive_status(&results);
        results.reverse();
        assert_eq!(derive_status(&results), expected);
        results.rotate_left(1);
        assert_eq!(derive_status(&results), expected);
    }
}
