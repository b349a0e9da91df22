//! Weighted scoring and input sanitisation.
//!
//! Each item contributes `(score + bonus) * ratio / 100` to the total. The
//! total is only meaningful once the ratios sum to 100, but it is computed
//! regardless so the form can show a live preview before saving.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{InputError, RatioError};
use crate::model::EvaluationItem;

/// Accepted range for an item score.
pub const SCORE_RANGE: RangeInclusive<u32> = 0..=100;

/// Accepted range for an item bonus.
pub const BONUS_RANGE: RangeInclusive<u32> = 0..=5;

/// The ratio sum a complete evaluation set must reach.
pub const REQUIRED_RATIO_TOTAL: f64 = 100.0;

/// How strictly the ratio sum is compared against 100.
///
/// The default is exact equality. A non-zero tolerance is a product decision
/// and has to be configured explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatioPolicy {
    #[serde(default)]
    pub tolerance: f64,
}

impl RatioPolicy {
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    /// Check a ratio sum against this policy.
    pub fn check(&self, total: f64) -> Result<(), RatioError> {
        if self.accepts(total) {
            Ok(())
        } else {
            Err(RatioError { actual: total })
        }
    }

    fn accepts(&self, total: f64) -> bool {
        if self.tolerance == 0.0 {
            total == REQUIRED_RATIO_TOTAL
        } else {
            (total - REQUIRED_RATIO_TOTAL).abs() <= self.tolerance
        }
    }
}

/// Sum of all item ratios.
pub fn total_ratio(items: &[EvaluationItem]) -> f64 {
    items.iter().map(|item| item.ratio).sum()
}

/// Check that the ratios sum to exactly 100.
pub fn validate_ratios(items: &[EvaluationItem]) -> Result<(), RatioError> {
    validate_ratios_with(items, RatioPolicy::exact())
}

/// Check the ratio sum under an explicit policy. An empty set never passes.
pub fn validate_ratios_with(items: &[EvaluationItem], policy: RatioPolicy) -> Result<(), RatioError> {
    let actual = total_ratio(items);
    if items.is_empty() || !policy.accepts(actual) {
        return Err(RatioError { actual });
    }
    Ok(())
}

/// Contribution of a single item: weighted score plus weighted bonus.
pub fn weighted_score(item: &EvaluationItem) -> f64 {
    let weighted_score = f64::from(item.score) * item.ratio / 100.0;
    let weighted_bonus = f64::from(item.bonus) * item.ratio / 100.0;
    weighted_score + weighted_bonus
}

/// Sum of all weighted contributions. Unrounded.
pub fn total_score(items: &[EvaluationItem]) -> f64 {
    items.iter().map(weighted_score).sum()
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render a score with exactly two decimals, the way it is displayed and sent.
pub fn format_score(value: f64) -> String {
    format!("{value:.2}")
}

/// Parse a raw score or bonus field.
///
/// Only unsigned digit strings are accepted; the empty string means 0. The
/// caller keeps its previous value when this returns an error.
pub fn normalize_score_input(raw: &str, range: RangeInclusive<u32>) -> Result<u32, InputError> {
    if raw.is_empty() {
        return Ok(0);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputError::NotInteger(raw.to_string()));
    }

    let (min, max) = (*range.start(), *range.end());
    // Digit runs too long for u64 are simply out of range.
    let digits = raw.trim_start_matches('0');
    let value = if digits.is_empty() {
        0
    } else {
        digits.parse::<u64>().unwrap_or(u64::MAX)
    };

    if value < u64::from(min) || value > u64::from(max) {
        return Err(InputError::OutOfRange { value, min, max });
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(ratio: f64, score: u32, bonus: u32) -> EvaluationItem {
        EvaluationItem {
            id: format!("{ratio}-{score}-{bonus}"),
            name: String::new(),
            ratio,
            description: String::new(),
            score,
            bonus,
            comment: String::new(),
        }
    }

    fn scenario_a() -> Vec<EvaluationItem> {
        vec![
            item(30.0, 80, 0),
            item(25.0, 90, 2),
            item(20.0, 70, 0),
            item(15.0, 60, 1),
            item(10.0, 100, 0),
        ]
    }

    #[test]
    fn ratios_summing_to_100_validate() {
        assert!(validate_ratios(&scenario_a()).is_ok());
        assert!(validate_ratios(&[item(100.0, 0, 0)]).is_ok());
        assert!(validate_ratios(&[item(50.0, 0, 0), item(50.0, 0, 0)]).is_ok());
    }

    #[test]
    fn ratio_deficit_is_reported_exactly() {
        let items = vec![item(30.0, 0, 0), item(25.0, 0, 0), item(40.0, 0, 0)];
        let err = validate_ratios(&items).unwrap_err();
        assert_eq!(err.actual, 95.0);
        assert_eq!(err.deficit(), 5.0);
    }

    #[test]
    fn ratio_excess_is_reported_exactly() {
        let items = vec![item(60.0, 0, 0), item(50.0, 0, 0)];
        let err = validate_ratios(&items).unwrap_err();
        assert_eq!(err.actual, 110.0);
        assert_eq!(err.deficit(), -10.0);
    }

    #[test]
    fn empty_set_never_validates() {
        let err = validate_ratios(&[]).unwrap_err();
        assert_eq!(err.actual, 0.0);
    }

    #[test]
    fn exact_policy_rejects_float_drift() {
        // 0.1 * 1000 accumulates to slightly less than 100.
        let items: Vec<_> = (0..1000).map(|_| item(0.1, 0, 0)).collect();
        assert!(validate_ratios(&items).is_err());
        assert!(validate_ratios_with(&items, RatioPolicy::with_tolerance(1e-6)).is_ok());
    }

    #[test]
    fn zero_scores_contribute_nothing() {
        for ratio in [0.0, 12.5, 33.0, 100.0] {
            assert_eq!(weighted_score(&item(ratio, 0, 0)), 0.0);
        }
    }

    #[test]
    fn perfect_item_with_full_bonus_scores_105() {
        assert_eq!(weighted_score(&item(100.0, 100, 5)), 105.0);
    }

    #[test]
    fn scenario_a_total() {
        // 24 + (22.5 + 0.5) + 14 + (9 + 0.15) + 10
        let total = total_score(&scenario_a());
        assert!((total - 80.15).abs() < 1e-9, "got {total}");
        assert_eq!(format_score(total), "80.15");
    }

    #[test]
    fn total_is_order_independent() {
        let items = scenario_a();
        let mut reversed = items.clone();
        reversed.reverse();
        let mut rotated = items.clone();
        rotated.rotate_left(2);

        let base = total_score(&items);
        assert!((total_score(&reversed) - base).abs() < 1e-9);
        assert!((total_score(&rotated) - base).abs() < 1e-9);
    }

    #[test]
    fn preview_total_is_defined_when_ratios_are_short() {
        let items = vec![item(50.0, 80, 0), item(45.0, 60, 0)];
        assert!(validate_ratios(&items).is_err());
        assert!((total_score(&items) - 67.0).abs() < 1e-9);
    }

    #[test]
    fn round_and_format() {
        assert_eq!(round2(79.654), 79.65);
        assert_eq!(round2(79.656), 79.66);
        assert_eq!(format_score(105.0), "105.00");
    }

    #[test]
    fn normalize_accepts_digits_and_empty() {
        assert_eq!(normalize_score_input("", SCORE_RANGE), Ok(0));
        assert_eq!(normalize_score_input("85", SCORE_RANGE), Ok(85));
        assert_eq!(normalize_score_input("007", SCORE_RANGE), Ok(7));
        assert_eq!(normalize_score_input("000", SCORE_RANGE), Ok(0));
        assert_eq!(normalize_score_input("100", SCORE_RANGE), Ok(100));
        assert_eq!(normalize_score_input("5", BONUS_RANGE), Ok(5));
    }

    #[test]
    fn normalize_rejects_non_integers() {
        assert!(matches!(
            normalize_score_input("12.5", SCORE_RANGE),
            Err(InputError::NotInteger(_))
        ));
        assert!(normalize_score_input("-1", SCORE_RANGE).is_err());
        assert!(normalize_score_input(" 5", SCORE_RANGE).is_err());
        assert!(normalize_score_input("1e2", SCORE_RANGE).is_err());
    }

    #[test]
    fn normalize_rejects_out_of_range() {
        assert_eq!(
            normalize_score_input("6", BONUS_RANGE),
            Err(InputError::OutOfRange {
                value: 6,
                min: 0,
                max: 5
            })
        );
        assert!(normalize_score_input("101", SCORE_RANGE).is_err());
        assert!(normalize_score_input("99999999999999999999999", SCORE_RANGE).is_err());
    }
}
