//! Eligibility rules for automatic agreement analysis.
//!
//! The scanner discovers analysis targets without operator input: a project
//! qualifies for initial-round analysis once every item has two or more
//! completed, non-skipped round-0 ratings, and a reannotation round
//! qualifies once it is completed with two or more submitting raters. The
//! counting queries live in the db crate; the decisions live here.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::round::RoundStatus;
use crate::types::DbId;

/// Minimum distinct qualified raters per item (and per round) for analysis.
pub const MIN_RATERS: i64 = 2;

// ---------------------------------------------------------------------------
// Analysis targets
// ---------------------------------------------------------------------------

/// What a discovered target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Round-0 annotations of a whole project.
    Initial,
    /// A completed reannotation round.
    Reannotation,
}

/// One discovered analysis target.
///
/// `label` and `week` are report metadata only; the computation is keyed by
/// `(project_id, round)`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisTarget {
    pub kind: TargetKind,
    pub project_id: DbId,
    /// Round number the scores are computed for (0 for initial targets).
    pub round: i32,
    /// The reannotation round row, when `kind` is `Reannotation`.
    pub round_id: Option<DbId>,
    /// Project display label, for reporting.
    pub label: String,
    /// Week/sequence number parsed from the label, for reporting.
    pub week: Option<i32>,
}

// ---------------------------------------------------------------------------
// Eligibility predicates
// ---------------------------------------------------------------------------

/// Initial-round eligibility: every item has at least [`MIN_RATERS`]
/// distinct raters with a completed, non-skipped round-0 version.
///
/// `qualified_rater_counts` holds one count per item in the project. An
/// empty project is not eligible.
pub fn project_is_eligible(qualified_rater_counts: &[i64]) -> bool {
    !qualified_rater_counts.is_empty()
        && qualified_rater_counts.iter().all(|&count| count >= MIN_RATERS)
}

/// Reannotation-round eligibility: the round is completed and at least
/// [`MIN_RATERS`] distinct raters have submitted tasks under it.
pub fn round_is_eligible(status: RoundStatus, submitted_rater_count: i64) -> bool {
    status == RoundStatus::Completed && submitted_rater_count >= MIN_RATERS
}

// ---------------------------------------------------------------------------
// Report metadata
// ---------------------------------------------------------------------------

/// Parse a week/sequence number from a project display label.
///
/// Accepts labels like `"Promise annotation week 12"` or any label ending
/// in an integer. Formatting concern only; a label without a number is
/// fine.
pub fn week_number_from_label(label: &str) -> Option<i32> {
    static WEEK_RE: OnceLock<Regex> = OnceLock::new();
    let re = WEEK_RE.get_or_init(|| {
        Regex::new(r"(?i)week\s*(\d+)|(\d+)\s*$").expect("static regex must compile")
    });

    let caps = re.captures(label)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- project_is_eligible -----------------------------------------------

    #[test]
    fn all_items_with_two_raters_is_eligible() {
        assert!(project_is_eligible(&[2, 3, 2]));
    }

    #[test]
    fn one_under_annotated_item_blocks_the_project() {
        assert!(!project_is_eligible(&[2, 1, 3]));
        assert!(!project_is_eligible(&[0]));
    }

    #[test]
    fn empty_project_is_not_eligible() {
        assert!(!project_is_eligible(&[]));
    }

    // -- round_is_eligible -------------------------------------------------

    #[test]
    fn completed_round_with_two_submitters_is_eligible() {
        assert!(round_is_eligible(RoundStatus::Completed, 2));
        assert!(round_is_eligible(RoundStatus::Completed, 5));
    }

    #[test]
    fn active_or_cancelled_round_is_not_eligible() {
        assert!(!round_is_eligible(RoundStatus::Active, 4));
        assert!(!round_is_eligible(RoundStatus::Cancelled, 4));
    }

    #[test]
    fn completed_round_with_one_submitter_is_not_eligible() {
        assert!(!round_is_eligible(RoundStatus::Completed, 1));
        assert!(!round_is_eligible(RoundStatus::Completed, 0));
    }

    // -- week_number_from_label --------------------------------------------

    #[test]
    fn week_keyword_is_parsed() {
        assert_eq!(week_number_from_label("Promise annotation week 12"), Some(12));
        assert_eq!(week_number_from_label("Week3 batch"), Some(3));
        assert_eq!(week_number_from_label("WEEK 7"), Some(7));
    }

    #[test]
    fn trailing_number_is_parsed() {
        assert_eq!(week_number_from_label("manifesto batch 4"), Some(4));
    }

    #[test]
    fn label_without_number_is_none() {
        assert_eq!(week_number_from_label("pilot project"), None);
        assert_eq!(week_number_from_label(""), None);
    }
}
