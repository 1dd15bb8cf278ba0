//! Score-to-Karma Transform
//!
//! Raw item scores (vote tallies) map to karma through a concave power curve:
//! `sign(score) * round(|score| ^ 0.8)`. Large scores earn diminishing
//! returns, so a single viral post cannot inflate its author's reputation
//! without bound.
//!
//! Rounding is half-away-from-zero on the non-negative magnitude, which keeps
//! the transform exactly symmetric around zero.

/// Exponent of the karma curve. Must stay below 1 for sub-linear growth.
pub const KARMA_EXPONENT: f64 = 0.8;

/// Unrounded karma magnitude for a raw score (`|score| ^ KARMA_EXPONENT`)
pub fn karma_magnitude(score: i64) -> f64 {
    (score.unsigned_abs() as f64).powf(KARMA_EXPONENT)
}

/// Convert an item's current total score into karma.
///
/// Total over every `i64`; zero maps to exactly zero.
pub fn score_to_karma(score: i64) -> i64 {
    if score == 0 {
        return 0;
    }
    score.signum() * karma_magnitude(score).round() as i64
}

/// Karma change caused by an item's score moving from `prev_score` to `next_score`.
///
/// Only the marginal change is ever applied to a user's running total.
pub fn karma_delta_from_scores(prev_score: i64, next_score: i64) -> i64 {
    score_to_karma(next_score) - score_to_karma(prev_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_fixed_point() {
        assert_eq!(score_to_karma(0), 0);
        assert_eq!(karma_magnitude(0), 0.0);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(score_to_karma(1), 1);
        assert_eq!(score_to_karma(9), 6);
        assert_eq!(score_to_karma(10), 6);
        assert_eq!(score_to_karma(100), 40);
        assert_eq!(score_to_karma(-10), -6);
        assert_eq!(score_to_karma(-1), -1);
    }

    #[test]
    fn test_symmetry() {
        for s in 0..5_000 {
            assert_eq!(score_to_karma(-s), -score_to_karma(s), "asymmetric at {}", s);
        }
    }

    #[test]
    fn test_extremes_do_not_panic() {
        assert!(score_to_karma(i64::MAX) > 0);
        assert!(score_to_karma(i64::MIN) < 0);
        assert_eq!(score_to_karma(i64::MIN + 1), -score_to_karma(i64::MAX));
    }

    #[test]
    fn test_monotonic_for_positive_scores() {
        let mut previous = 0;
        for s in 1..10_000 {
            let karma = score_to_karma(s);
            assert!(karma >= 0);
            assert!(karma >= previous, "karma decreased at {}", s);
            previous = karma;
        }
    }

    #[test]
    fn test_sub_linear_growth() {
        for s in 1..10_000 {
            assert!(karma_magnitude(2 * s) < 2.0 * karma_magnitude(s));
            assert!(score_to_karma(2 * s) <= 2 * score_to_karma(s));
        }
        // Rounding ties the two sides at s = 1 and s = 3; past single digits
        // the curve is strictly below linear.
        for s in 10..10_000 {
            assert!(score_to_karma(2 * s) < 2 * score_to_karma(s), "not sub-linear at {}", s);
        }
    }

    #[test]
    fn test_delta_same_score_is_zero() {
        for s in -500..500 {
            assert_eq!(karma_delta_from_scores(s, s), 0);
        }
    }

    #[test]
    fn test_delta_antisymmetry() {
        for a in -60..60 {
            for b in -60..60 {
                assert_eq!(karma_delta_from_scores(a, b), -karma_delta_from_scores(b, a));
            }
        }
    }

    #[test]
    fn test_delta_examples() {
        assert_eq!(karma_delta_from_scores(9, 10), 0);
        assert_eq!(karma_delta_from_scores(0, 1), 1);
        assert_eq!(karma_delta_from_scores(10, 100), 34);
        // Crossing zero: -3 -> -2, 2 -> 2
        assert_eq!(karma_delta_from_scores(-3, 2), 4);
    }
}
