//! Discovers which projects and reannotation rounds are ready for
//! agreement analysis, without operator input.

use std::collections::HashMap;

use concord_core::eligibility::{
    project_is_eligible, round_is_eligible, week_number_from_label, AnalysisTarget, TargetKind,
};
use concord_core::round::{RoundStatus, INITIAL_ROUND};
use concord_db::repositories::{ProjectRepo, ReannotationRepo};
use concord_db::DbPool;

/// Scan the catalog for analysis targets.
///
/// Returns initial-round targets first, then reannotation targets, each
/// group ordered by project then round. The same ordering holds across
/// repeated runs over unchanged data.
pub async fn discover_targets(pool: &DbPool) -> Result<Vec<AnalysisTarget>, sqlx::Error> {
    let projects = ProjectRepo::list_all(pool).await?;
    let labels: HashMap<_, _> = projects
        .iter()
        .map(|p| (p.id, p.name.clone()))
        .collect();

    let mut targets = Vec::new();

    // Initial-round targets: every item fully double-annotated at round 0.
    for project in &projects {
        let counts = ProjectRepo::qualified_rater_counts(pool, project.id).await?;
        let per_item: Vec<i64> = counts.iter().map(|c| c.qualified_raters).collect();
        if project_is_eligible(&per_item) {
            targets.push(AnalysisTarget {
                kind: TargetKind::Initial,
                project_id: project.id,
                round: INITIAL_ROUND,
                round_id: None,
                label: project.name.clone(),
                week: week_number_from_label(&project.name),
            });
        }
    }

    // Reannotation targets: completed rounds with enough submitting raters.
    for round in ReannotationRepo::completed_rounds_with_submitters(pool).await? {
        let status = match RoundStatus::from_str(&round.status) {
            Ok(status) => status,
            Err(_) => {
                tracing::warn!(round_id = round.id, status = %round.status,
                    "Skipping round with unrecognized status");
                continue;
            }
        };
        if round_is_eligible(status, round.submitted_raters) {
            let label = labels
                .get(&round.project_id)
                .cloned()
                .unwrap_or_default();
            targets.push(AnalysisTarget {
                kind: TargetKind::Reannotation,
                project_id: round.project_id,
                round: round.round_number,
                round_id: Some(round.id),
                week: week_number_from_label(&label),
                label,
            });
        }
    }

    targets.sort_by_key(|t| (t.kind, t.project_id, t.round));
    Ok(targets)
}
