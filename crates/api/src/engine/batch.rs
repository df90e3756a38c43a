//! Batch agreement analysis over discovered targets.
//!
//! One external call drives the whole run. Targets are processed
//! sequentially, so a single run never races itself on a cache key; one
//! target's failure is logged and skipped without aborting the rest.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use concord_core::agreement::{global_alpha, item_alpha, Alpha};
use concord_core::eligibility::{AnalysisTarget, TargetKind};
use concord_core::error::CoreError;
use concord_core::round::INITIAL_ROUND;
use concord_core::task::{AnnotationTask, TaskGroup, ALL_TASKS};
use concord_core::types::DbId;
use concord_db::models::agreement_score::{AgreementScore, NewAgreementScore};
use concord_db::models::annotation_version::AnnotationVersion;
use concord_db::repositories::{AgreementScoreRepo, AnnotationVersionRepo, ReannotationRepo};
use concord_db::DbPool;

use crate::error::AppError;

use super::scanner::discover_targets;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Scores for one analysis target.
#[derive(Debug, Serialize)]
pub struct TargetResult {
    pub project_id: DbId,
    pub round: i32,
    pub label: String,
    pub week: Option<i32>,
    /// True when the scores were served from the cache without recomputing.
    pub from_cache: bool,
    pub scores: Vec<AgreementScore>,
}

/// Counts summarizing a batch run.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub newly_analyzed: usize,
    pub from_cache: usize,
    pub failed: usize,
}

/// Full result of one batch analysis call.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub results: Vec<TargetResult>,
    pub summary: BatchSummary,
    /// Labels of targets that failed, for the caller's report.
    pub failed_targets: Vec<String>,
}

// ---------------------------------------------------------------------------
// Batch run
// ---------------------------------------------------------------------------

/// Run batch analysis over every eligible target.
///
/// With `force = false` a target whose (project, round) key already has
/// cached scores is served from the cache as-is, even if annotations
/// changed since caching. With `force = true` every target is recomputed
/// and its cache rewritten.
pub async fn run_batch(pool: &DbPool, force: bool) -> Result<BatchReport, AppError> {
    let targets = discover_targets(pool).await?;
    tracing::info!(target_count = targets.len(), force, "Starting batch analysis");

    let mut results = Vec::new();
    let mut failed_targets = Vec::new();
    let mut newly_analyzed = 0;
    let mut from_cache = 0;

    for target in targets {
        match analyze_target(pool, &target, force).await {
            Ok((scores, cached)) => {
                if cached {
                    from_cache += 1;
                } else {
                    newly_analyzed += 1;
                }
                results.push(TargetResult {
                    project_id: target.project_id,
                    round: target.round,
                    label: target.label,
                    week: target.week,
                    from_cache: cached,
                    scores,
                });
            }
            Err(err) => {
                // One target's failure never aborts the run.
                tracing::error!(
                    project_id = target.project_id,
                    round = target.round,
                    error = %err,
                    "Analysis target failed; continuing with remaining targets"
                );
                failed_targets.push(format!("{} (round {})", target.label, target.round));
            }
        }
    }

    let summary = BatchSummary {
        newly_analyzed,
        from_cache,
        failed: failed_targets.len(),
    };
    tracing::info!(?summary, "Batch analysis finished");

    Ok(BatchReport {
        results,
        summary,
        failed_targets,
    })
}

/// Analyze one target, honoring the cache contract. Returns the scores and
/// whether they came from the cache.
async fn analyze_target(
    pool: &DbPool,
    target: &AnalysisTarget,
    force: bool,
) -> Result<(Vec<AgreementScore>, bool), AppError> {
    if !force && AgreementScoreRepo::has_cache(pool, target.project_id, target.round).await? {
        let cached = AgreementScoreRepo::read(pool, target.project_id, target.round).await?;
        return Ok((cached, true));
    }

    let computed = compute_target(pool, target).await?;
    AgreementScoreRepo::replace_all(pool, target.project_id, target.round, &computed).await?;
    let persisted = AgreementScoreRepo::read(pool, target.project_id, target.round).await?;
    Ok((persisted, false))
}

/// Compute local scores for every (item, task) of a target.
async fn compute_target(
    pool: &DbPool,
    target: &AnalysisTarget,
) -> Result<Vec<NewAgreementScore>, AppError> {
    let (versions, tasks) = scoring_inputs(pool, target.project_id, target.round).await?;
    Ok(local_scores(&versions, tasks))
}

/// Resolve the versions and task set to score for one (project, round) pair.
///
/// Round 0 scores every task over completed initial annotations. A
/// reannotation round scores its task group over each rater's latest
/// completed version, restricted to the round's items, so reannotated
/// values supersede initial ones.
pub async fn scoring_inputs(
    pool: &DbPool,
    project_id: DbId,
    round: i32,
) -> Result<(Vec<AnnotationVersion>, &'static [AnnotationTask]), AppError> {
    match round_kind(round) {
        TargetKind::Initial => {
            let versions = AnnotationVersionRepo::list_round0_completed(pool, project_id).await?;
            Ok((versions, &ALL_TASKS))
        }
        TargetKind::Reannotation => {
            let round_row = ReannotationRepo::list_rounds(pool, Some(project_id))
                .await?
                .into_iter()
                .find(|r| r.round_number == round)
                .ok_or(CoreError::NotFound {
                    entity: "ReannotationRound",
                    id: round as DbId,
                })?;
            let group = TaskGroup::from_str(&round_row.task_group)?;

            // Latest completed versions, restricted to the round's items:
            // reannotated values supersede initial ones once present.
            let round_items: HashSet<DbId> =
                ReannotationRepo::list_tasks_for_round(pool, round_row.id)
                    .await?
                    .into_iter()
                    .map(|t| t.item_id)
                    .collect();
            let versions: Vec<AnnotationVersion> =
                AnnotationVersionRepo::list_latest_completed(pool, project_id)
                    .await?
                    .into_iter()
                    .filter(|v| round_items.contains(&v.item_id))
                    .collect();
            Ok((versions, group.members()))
        }
    }
}

/// Classify a round number: 0 is the initial pass, anything above is a
/// reannotation round.
fn round_kind(round: i32) -> TargetKind {
    if round == INITIAL_ROUND {
        TargetKind::Initial
    } else {
        TargetKind::Reannotation
    }
}

// ---------------------------------------------------------------------------
// Pure scoring
// ---------------------------------------------------------------------------

/// Compute the local score of every (item, task) pair from a set of
/// versions (one per rater per item).
fn local_scores(versions: &[AnnotationVersion], tasks: &[AnnotationTask]) -> Vec<NewAgreementScore> {
    let mut by_item: BTreeMap<DbId, Vec<&AnnotationVersion>> = BTreeMap::new();
    for version in versions {
        by_item.entry(version.item_id).or_default().push(version);
    }

    let mut scores = Vec::new();
    for (item_id, item_versions) in &by_item {
        for &task in tasks {
            let values: Vec<&str> = item_versions
                .iter()
                .filter_map(|v| v.task_value(task))
                .collect();
            let alpha = item_alpha(&values);
            scores.push(NewAgreementScore {
                item_id: *item_id,
                task: task.as_str().to_string(),
                local_score: alpha.score(),
                raters_count: values.len() as i32,
            });
        }
    }
    scores
}

/// Compute the global (per-task, all-items) score for a set of versions.
pub fn global_scores(
    versions: &[AnnotationVersion],
    tasks: &[AnnotationTask],
) -> BTreeMap<String, Alpha> {
    let mut by_item: BTreeMap<DbId, Vec<&AnnotationVersion>> = BTreeMap::new();
    for version in versions {
        by_item.entry(version.item_id).or_default().push(version);
    }

    let mut globals = BTreeMap::new();
    for &task in tasks {
        let units: Vec<Vec<&str>> = by_item
            .values()
            .map(|item_versions| {
                item_versions
                    .iter()
                    .filter_map(|v| v.task_value(task))
                    .collect()
            })
            .collect();
        globals.insert(task.as_str().to_string(), global_alpha(&units));
    }
    globals
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
