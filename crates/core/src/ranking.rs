//! Priority ranking of a scored batch.
//!
//! Produces a strict total order over the batch. Sort keys, most significant first:
//! 1. severity tier, most severe first,
//! 2. survival probability, lowest first,
//! 3. maximum safe wait, shortest first,
//! 4. submission order.
//!
//! The last key is unique per patient, so no ties survive.

use crate::conflict::{ConflictKind, ConflictReport};
use crate::scoring::{ClinicalAssessment, SeverityTier};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// One position in an [`AllocationOrder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RankedPatient {
    pub patient_id: String,
    /// 1-based.
    pub rank: u32,
    pub priority: SeverityTier,
    pub clinical_score: u32,
    pub survival_probability: u32,
    pub max_wait_time_minutes: u32,
    /// Which sort key decided this position against the neighbouring entry.
    pub justification: String,
}

/// The allocation sequence for one batch. Consumed once by the allocator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AllocationOrder {
    pub entries: Vec<RankedPatient>,
    /// `None` when the batch has no contention to resolve.
    pub conflict_type: Option<ConflictKind>,
    pub resolution_strategy: String,
    pub clinical_rationale: String,
}

impl AllocationOrder {
    pub fn patient_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.patient_id.as_str())
    }

    pub fn conflict_label(&self) -> &'static str {
        self.conflict_type.map_or("none", ConflictKind::as_str)
    }
}

const SOLE_PATIENT_STRATEGY: &str = "Single patient: admit on assessment, no contention to resolve";
const RANKED_STRATEGY: &str = "Allocate in rank order: severity tier, then lower survival probability, \
then shorter safe wait, then submission order";

/// Batch ranking operations.
pub struct PriorityRanker;

impl PriorityRanker {
    /// Ranks a batch. `conflicts` is the detector's report for the same batch, if available.
    pub fn rank(
        assessments: &[ClinicalAssessment],
        conflicts: Option<&ConflictReport>,
    ) -> AllocationOrder {
        if let [only] = assessments {
            return AllocationOrder {
                entries: vec![entry(only, 1, "sole patient in batch".to_string())],
                conflict_type: None,
                resolution_strategy: SOLE_PATIENT_STRATEGY.to_string(),
                clinical_rationale: format!(
                    "{} assessed {} with score {}",
                    only.patient_id, only.severity, only.clinical_score
                ),
            };
        }

        let mut order: Vec<usize> = (0..assessments.len()).collect();
        order.sort_by_key(|&i| sort_key(&assessments[i], i));

        let entries: Vec<RankedPatient> = order
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                let current = &assessments[index];
                let justification = if position == 0 {
                    match order.get(1) {
                        Some(&next) => {
                            let next = &assessments[next];
                            format!(
                                "ahead of {} on {}",
                                next.patient_id,
                                deciding_rule(current, index, next, order[1])
                            )
                        }
                        None => "sole patient in batch".to_string(),
                    }
                } else {
                    let previous_index = order[position - 1];
                    let previous = &assessments[previous_index];
                    format!(
                        "behind {} on {}",
                        previous.patient_id,
                        deciding_rule(previous, previous_index, current, index)
                    )
                };
                entry(current, position as u32 + 1, justification)
            })
            .collect();

        let conflict_type = conflicts.and_then(ConflictReport::dominant).map(|c| c.kind);
        let clinical_rationale = entries
            .iter()
            .map(|e| {
                format!(
                    "{}. {} ({}, score {})",
                    e.rank, e.patient_id, e.priority, e.clinical_score
                )
            })
            .collect::<Vec<_>>()
            .join("; ");

        tracing::debug!(
            patients = entries.len(),
            conflict = conflict_type.map_or("none", ConflictKind::as_str),
            "batch ranked"
        );

        AllocationOrder {
            entries,
            conflict_type,
            resolution_strategy: RANKED_STRATEGY.to_string(),
            clinical_rationale,
        }
    }
}

fn sort_key(assessment: &ClinicalAssessment, index: usize) -> (Reverse<u8>, u32, u32, usize) {
    (
        Reverse(assessment.severity.acuity()),
        assessment.survival_probability,
        assessment.max_wait_time_minutes,
        index,
    )
}

fn entry(assessment: &ClinicalAssessment, rank: u32, justification: String) -> RankedPatient {
    RankedPatient {
        patient_id: assessment.patient_id.clone(),
        rank,
        priority: assessment.severity,
        clinical_score: assessment.clinical_score,
        survival_probability: assessment.survival_probability,
        max_wait_time_minutes: assessment.max_wait_time_minutes,
        justification,
    }
}

// `ahead` is ranked immediately before `behind`.
fn deciding_rule(
    ahead: &ClinicalAssessment,
    ahead_index: usize,
    behind: &ClinicalAssessment,
    behind_index: usize,
) -> String {
    if ahead.severity != behind.severity {
        return format!("severity tier ({} vs {})", ahead.severity, behind.severity);
    }
    if ahead.survival_probability != behind.survival_probability {
        return format!(
            "survival probability ({}% vs {}%)",
            ahead.survival_probability, behind.survival_probability
        );
    }
    if ahead.max_wait_time_minutes != behind.max_wait_time_minutes {
        return format!(
            "max safe wait ({} vs {} min)",
            ahead.max_wait_time_minutes, behind.max_wait_time_minutes
        );
    }
    format!("submission order ({} vs {})", ahead_index + 1, behind_index + 1)
}
