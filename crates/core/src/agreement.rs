//! Krippendorff's Alpha inter-rater agreement calculator.
//!
//! This is the single alpha implementation shared by the interactive score
//! endpoints and the batch analysis engine. Both the per-item "local" score
//! and the per-task "global" score run through the same coincidence-matrix
//! algorithm; the local score simply treats one item's ratings as a
//! one-unit reliability data set.
//!
//! All four tasks use the nominal (unordered) distance function: equal
//! values contribute 0 disagreement, unequal values contribute 1. This
//! applies to `verification_timeline` as well, even though its categories
//! are ordered. Switching that task to an ordinal metric would change every
//! historical score, so the uniform-nominal choice is deliberate and must
//! not be changed silently.

use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Undefined-alpha reasons
// ---------------------------------------------------------------------------

/// Fewer than two valid ratings exist for the unit.
pub const REASON_TOO_FEW_RATINGS: &str = "fewer than 2 valid ratings";

/// No unit in scope has two or more valid ratings.
pub const REASON_NO_OBSERVATIONS: &str = "no valid observations";

/// Expected disagreement is zero while observed disagreement is not.
/// This cannot happen for well-formed coincidence data and indicates a bug
/// in the caller's rating collection; it is surfaced rather than coerced
/// to a numeric alpha.
pub const REASON_ZERO_EXPECTED_DISAGREEMENT: &str =
    "expected disagreement is zero with nonzero observed disagreement";

// ---------------------------------------------------------------------------
// Alpha outcome
// ---------------------------------------------------------------------------

/// The outcome of an alpha computation.
///
/// An undefined alpha is a legitimate result (e.g. a single rater), not an
/// error: it carries a human-readable reason and serializes as a null score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alpha {
    Defined { score: f64 },
    Undefined { reason: String },
}

impl Alpha {
    /// The numeric score, or `None` when undefined.
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Defined { score } => Some(*score),
            Self::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined { .. })
    }

    fn undefined(reason: &str) -> Self {
        Self::Undefined {
            reason: reason.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Local score: alpha over one item's valid ratings.
///
/// - fewer than 2 ratings: undefined;
/// - 2+ ratings, all equal: trivially 1.0;
/// - otherwise the general coincidence-matrix algorithm on a single unit.
pub fn item_alpha(values: &[&str]) -> Alpha {
    if values.len() < 2 {
        return Alpha::undefined(REASON_TOO_FEW_RATINGS);
    }
    if values.iter().all(|v| *v == values[0]) {
        return Alpha::Defined { score: 1.0 };
    }
    units_alpha(std::iter::once(values))
}

/// Global score: alpha over all units (items) for one task.
///
/// Units with fewer than 2 valid ratings are ignored; if no unit remains,
/// the result is undefined.
pub fn global_alpha<'a>(units: &'a [Vec<&'a str>]) -> Alpha {
    units_alpha(units.iter().map(|u| u.as_slice()))
}

// ---------------------------------------------------------------------------
// Coincidence-matrix algorithm
// ---------------------------------------------------------------------------

/// Run the general algorithm over an iterator of rating units.
///
/// Every ordered pair of distinct raters' values within a unit of size mu
/// contributes 1/(mu - 1) to the coincidence matrix entry for that value
/// pair. Observed disagreement is the off-diagonal mass; expected
/// disagreement comes from the value marginals.
fn units_alpha<'a, I>(units: I) -> Alpha
where
    I: Iterator<Item = &'a [&'a str]>,
{
    // BTreeMap keeps accumulation order deterministic across runs.
    let mut coincidence: BTreeMap<(&str, &str), f64> = BTreeMap::new();

    for unit in units {
        let mu = unit.len();
        if mu < 2 {
            continue;
        }
        let weight = 1.0 / (mu as f64 - 1.0);
        for (i, v1) in unit.iter().enumerate() {
            for (j, v2) in unit.iter().enumerate() {
                if i == j {
                    continue;
                }
                *coincidence.entry((*v1, *v2)).or_insert(0.0) += weight;
            }
        }
    }

    // Marginal sums per value.
    let mut marginals: BTreeMap<&str, f64> = BTreeMap::new();
    for ((v1, _), count) in &coincidence {
        *marginals.entry(*v1).or_insert(0.0) += count;
    }
    let total: f64 = marginals.values().sum();

    if total == 0.0 {
        return Alpha::undefined(REASON_NO_OBSERVATIONS);
    }

    let observed: f64 = coincidence
        .iter()
        .filter(|((v1, v2), _)| v1 != v2)
        .map(|(_, count)| count)
        .sum();

    let mut expected_pairs = 0.0;
    for (v1, n1) in &marginals {
        for (v2, n2) in &marginals {
            if v1 != v2 {
                expected_pairs += n1 * n2;
            }
        }
    }
    let expected = expected_pairs / (total - 1.0);

    alpha_from_disagreement(observed, expected)
}

/// Final step: alpha from observed and expected disagreement.
///
/// Split out so the zero-expected-disagreement branches are testable in
/// isolation; the anomalous `Do > 0, De == 0` combination cannot be
/// produced from well-formed coincidence data.
fn alpha_from_disagreement(observed: f64, expected: f64) -> Alpha {
    if expected == 0.0 {
        if observed == 0.0 {
            // Every rating in scope is the same single value.
            return Alpha::Defined { score: 1.0 };
        }
        return Alpha::undefined(REASON_ZERO_EXPECTED_DISAGREEMENT);
    }

    Alpha::Defined {
        score: 1.0 - observed / expected,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -- item_alpha --------------------------------------------------------

    #[test]
    fn unanimous_two_raters_is_one() {
        assert_eq!(item_alpha(&["Yes", "Yes"]), Alpha::Defined { score: 1.0 });
    }

    #[test]
    fn unanimous_many_raters_is_one() {
        assert_eq!(
            item_alpha(&["No", "No", "No", "No"]),
            Alpha::Defined { score: 1.0 }
        );
    }

    #[test]
    fn single_rating_is_undefined() {
        assert_matches!(
            item_alpha(&["Yes"]),
            Alpha::Undefined { reason } if reason == REASON_TOO_FEW_RATINGS
        );
    }

    #[test]
    fn no_ratings_is_undefined() {
        assert_matches!(item_alpha(&[]), Alpha::Undefined { .. });
    }

    #[test]
    fn two_raters_disagreeing_is_defined_below_one() {
        let alpha = item_alpha(&["Yes", "No"]);
        let score = alpha.score().expect("2 distinct values must be defined");
        assert!(score < 1.0);
    }

    #[test]
    fn yes_yes_no_is_defined_below_one() {
        // mu = 3 with 2 distinct values: C[Y][Y] = 1, C[Y][N] = C[N][Y] = 1,
        // marginals n[Y] = 2, n[N] = 1, Do = 2, De = (2*1 + 1*2)/2 = 2,
        // alpha = 1 - 2/2 = 0.
        let alpha = item_alpha(&["Yes", "Yes", "No"]);
        let score = alpha.score().expect("must be defined, not undefined");
        assert!(score < 1.0);
        assert!((score - 0.0).abs() < 1e-12);
    }

    #[test]
    fn single_unit_majority_agreement_is_exactly_zero() {
        // For one unit Do always equals De, so any non-unanimous item
        // scores exactly 0 regardless of how lopsided the split is.
        let alpha = item_alpha(&["Yes", "Yes", "Yes", "No"]);
        assert_eq!(alpha.score().unwrap(), 0.0);
    }

    #[test]
    fn multi_unit_partial_agreement_scores_between_zero_and_one() {
        // Two unanimous units plus one split unit: coincidences
        // C[a][a] = C[b][b] = 2, C[a][b] = C[b][a] = 1, marginals
        // n[a] = n[b] = 3, Do = 2, De = 18/5, alpha = 1 - 5/9 = 4/9.
        let units = vec![vec!["a", "a"], vec!["b", "b"], vec!["a", "b"]];
        let alpha = global_alpha(&units);
        let score = alpha.score().unwrap();
        assert!(score > 0.0);
        assert!(score < 1.0);
        assert!((score - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn order_of_ratings_does_not_matter() {
        let a = item_alpha(&["A", "B", "A", "C"]);
        let b = item_alpha(&["C", "A", "B", "A"]);
        assert_eq!(a, b);
    }

    // -- global_alpha ------------------------------------------------------

    #[test]
    fn global_all_unanimous_units_is_one() {
        let units = vec![
            vec!["Yes", "Yes"],
            vec!["No", "No", "No"],
            vec!["Yes", "Yes", "Yes"],
        ];
        // Do = 0 but De > 0 (two distinct values across units).
        assert_eq!(global_alpha(&units), Alpha::Defined { score: 1.0 });
    }

    #[test]
    fn global_single_value_everywhere_is_trivially_one() {
        // Only one category in the whole data set: De == 0 and Do == 0.
        let units = vec![vec!["Yes", "Yes"], vec!["Yes", "Yes", "Yes"]];
        assert_eq!(global_alpha(&units), Alpha::Defined { score: 1.0 });
    }

    #[test]
    fn global_ignores_units_with_fewer_than_two_ratings() {
        let with_singletons = vec![vec!["Yes", "No"], vec!["Maybe"], vec![]];
        let without = vec![vec!["Yes", "No"]];
        assert_eq!(global_alpha(&with_singletons), global_alpha(&without));
    }

    #[test]
    fn global_no_usable_units_is_undefined() {
        let units = vec![vec!["Yes"], vec![], vec!["No"]];
        assert_matches!(
            global_alpha(&units),
            Alpha::Undefined { reason } if reason == REASON_NO_OBSERVATIONS
        );
    }

    #[test]
    fn global_empty_input_is_undefined() {
        assert_matches!(global_alpha(&[]), Alpha::Undefined { .. });
    }

    #[test]
    fn global_mixed_units_is_deterministic() {
        let units = vec![
            vec!["Yes", "Yes", "No"],
            vec!["No", "No"],
            vec!["Yes", "No"],
        ];
        let a = global_alpha(&units);
        let b = global_alpha(&units);
        assert_eq!(a, b);
        assert!(a.is_defined());
    }

    #[test]
    fn global_known_value_two_units() {
        // Units [A, A] and [A, B]:
        //   C[A][A] = 2 + 0, C[A][B] = 1, C[B][A] = 1
        //   n[A] = 3, n[B] = 1, total = 4
        //   Do = 2, De = (3*1 + 1*3) / 3 = 2
        //   alpha = 1 - 2/2 = 0
        let units = vec![vec!["A", "A"], vec!["A", "B"]];
        let score = global_alpha(&units).score().unwrap();
        assert!((score - 0.0).abs() < 1e-12);
    }

    // -- alpha_from_disagreement -------------------------------------------

    #[test]
    fn zero_expected_zero_observed_is_trivial_perfect_agreement() {
        assert_eq!(
            alpha_from_disagreement(0.0, 0.0),
            Alpha::Defined { score: 1.0 }
        );
    }

    #[test]
    fn zero_expected_nonzero_observed_is_anomaly_not_a_number() {
        assert_matches!(
            alpha_from_disagreement(2.0, 0.0),
            Alpha::Undefined { reason } if reason == REASON_ZERO_EXPECTED_DISAGREEMENT
        );
    }

    #[test]
    fn nonzero_disagreement_divides_through() {
        assert_eq!(
            alpha_from_disagreement(1.0, 2.0),
            Alpha::Defined { score: 0.5 }
        );
    }

    // -- serialization -----------------------------------------------------

    #[test]
    fn defined_serializes_with_score() {
        let json = serde_json::to_value(Alpha::Defined { score: 0.5 }).unwrap();
        assert_eq!(json["kind"], "defined");
        assert_eq!(json["score"], 0.5);
    }

    #[test]
    fn undefined_serializes_with_reason() {
        let json =
            serde_json::to_value(Alpha::undefined(REASON_TOO_FEW_RATINGS)).unwrap();
        assert_eq!(json["kind"], "undefined");
        assert_eq!(json["reason"], REASON_TOO_FEW_RATINGS);
    }
}
