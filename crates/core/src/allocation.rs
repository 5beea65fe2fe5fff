//! Resource allocation along a ranked order.
//!
//! Patients are served strictly in rank order and each one is fully resolved (bed, staff,
//! equipment) before the next is attempted, so a lower-ranked patient can never take a
//! resource ahead of a higher-ranked one in the same batch.
//!
//! Per patient:
//! 1. reserve the first free bed (or room) in the recommended department,
//! 2. on a lost race or no capacity, try exactly one fallback department,
//! 3. with no bed anywhere the patient is `WAITING` and nothing else is reserved,
//! 4. otherwise assign the least-loaded staff per required specialty,
//! 5. and take one unit from each required equipment pool.
//!
//! Shortfalls in steps 4 and 5 are recorded on the result and never undo the bed.

use crate::error::{StoreError, TriageError, TriageResult};
use crate::resources::{Department, EquipmentKind, Specialty};
use crate::ranking::AllocationOrder;
use crate::scoring::{ClinicalAssessment, SeverityTier};
use crate::store::{HospitalStateStore, StaffAssignment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    /// Bed, staff and equipment secured.
    Admitted,
    /// Bed secured, some staff or equipment missing.
    Pending,
    /// No bed in the recommended or fallback department.
    Waiting,
}

/// Something that did not go to plan for one patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum AllocationIssue {
    /// A bed was taken between the query and the reservation.
    ResourceConflict {
        department: Department,
        bed_id: String,
        holder: String,
    },
    NoStaffAvailable { specialty: Specialty },
    InsufficientEquipment {
        equipment: EquipmentKind,
        requested: u32,
        available: u32,
    },
}

impl AllocationIssue {
    /// A required resource is missing, as opposed to a race that was routed around.
    pub fn is_shortfall(&self) -> bool {
        !matches!(self, AllocationIssue::ResourceConflict { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BedAssignment {
    pub department: Department,
    /// `None` for pooled departments, which have rooms without identity.
    pub bed_id: Option<String>,
    /// True when the patient was placed in the fallback department.
    pub fallback: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AllocationResult {
    pub patient_id: String,
    pub rank: u32,
    pub severity: SeverityTier,
    pub status: AllocationStatus,
    pub requested_department: Department,
    pub bed: Option<BedAssignment>,
    pub assigned_staff: Vec<StaffAssignment>,
    pub assigned_equipment: Vec<EquipmentKind>,
    pub issues: Vec<AllocationIssue>,
    pub estimated_ready_minutes: u32,
}

impl AllocationResult {
    pub fn has_issue(&self, predicate: impl Fn(&AllocationIssue) -> bool) -> bool {
        self.issues.iter().any(predicate)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BatchAllocationResult {
    pub batch_id: Uuid,
    /// In rank order.
    pub results: Vec<AllocationResult>,
    /// Any patient is waiting, or some pool reached zero during the run.
    pub resources_exhausted: bool,
    pub waiting_patients: Vec<String>,
    pub admitted_count: usize,
    pub pending_count: usize,
    pub completed_at: DateTime<Utc>,
}

impl BatchAllocationResult {
    pub fn result_for(&self, patient_id: &str) -> Option<&AllocationResult> {
        self.results.iter().find(|r| r.patient_id == patient_id)
    }
}

enum Placement {
    Placed(BedAssignment),
    Full,
    Lost(AllocationIssue),
}

/// Batch allocation operations.
pub struct ResourceAllocator;

impl ResourceAllocator {
    /// Walks `order` and reserves resources for each patient in turn.
    ///
    /// # Errors
    ///
    /// - [`TriageError::OrderMismatch`] if `order` is not a permutation of `assessments` with
    ///   contiguous ranks starting at 1. Nothing is reserved in that case.
    /// - [`TriageError::Store`] for a [`StoreError::NotFound`], which means the inventory and
    ///   the assessments disagree about what exists.
    ///
    /// Per-patient shortfalls are never errors; they are recorded on each result.
    pub fn allocate(
        order: &AllocationOrder,
        assessments: &[ClinicalAssessment],
        store: &HospitalStateStore,
    ) -> TriageResult<BatchAllocationResult> {
        let by_id = index_assessments(order, assessments)?;
        let batch_id = Uuid::new_v4();
        let mut exhausted = false;
        let mut results = Vec::with_capacity(order.entries.len());

        for entry in &order.entries {
            let assessment = by_id[entry.patient_id.as_str()];
            let result = Self::allocate_one(entry.rank, assessment, store, &mut exhausted)?;
            results.push(result);
        }

        let waiting_patients: Vec<String> = results
            .iter()
            .filter(|r| r.status == AllocationStatus::Waiting)
            .map(|r| r.patient_id.clone())
            .collect();
        let admitted_count = results
            .iter()
            .filter(|r| r.status == AllocationStatus::Admitted)
            .count();
        let pending_count = results
            .iter()
            .filter(|r| r.status == AllocationStatus::Pending)
            .count();
        let resources_exhausted = exhausted || !waiting_patients.is_empty();

        tracing::info!(
            %batch_id,
            patients = results.len(),
            admitted = admitted_count,
            pending = pending_count,
            waiting = waiting_patients.len(),
            resources_exhausted,
            "batch allocation complete"
        );

        Ok(BatchAllocationResult {
            batch_id,
            results,
            resources_exhausted,
            waiting_patients,
            admitted_count,
            pending_count,
            completed_at: Utc::now(),
        })
    }

    fn allocate_one(
        rank: u32,
        assessment: &ClinicalAssessment,
        store: &HospitalStateStore,
        exhausted: &mut bool,
    ) -> TriageResult<AllocationResult> {
        let patient_id = assessment.patient_id.as_str();
        let requested = assessment.recommended_department;
        let mut issues = Vec::new();

        let first = place(requested, requested, patient_id, store, exhausted)?;
        let bed = with_fallback(first, requested, patient_id, store, exhausted, &mut issues)?;
        Self::complete(rank, assessment, bed, issues, store, exhausted)
    }

    // Staff and equipment for a patient whose bed search is settled.
    fn complete(
        rank: u32,
        assessment: &ClinicalAssessment,
        bed: Option<BedAssignment>,
        mut issues: Vec<AllocationIssue>,
        store: &HospitalStateStore,
        exhausted: &mut bool,
    ) -> TriageResult<AllocationResult> {
        let patient_id = assessment.patient_id.as_str();
        let requested = assessment.recommended_department;

        let Some(bed) = bed else {
            tracing::warn!(patient_id, %requested, "no bed available, patient waiting");
            return Ok(AllocationResult {
                patient_id: patient_id.to_string(),
                rank,
                severity: assessment.severity,
                status: AllocationStatus::Waiting,
                requested_department: requested,
                bed: None,
                assigned_staff: Vec::new(),
                assigned_equipment: Vec::new(),
                issues,
                estimated_ready_minutes: requested.wait_minutes_when_full(),
            });
        };

        let mut assigned_staff = Vec::new();
        for specialty in assessment.required_staff() {
            match assign_least_loaded(specialty, patient_id, store)? {
                Some(assignment) => assigned_staff.push(assignment),
                None => {
                    tracing::warn!(patient_id, %specialty, "no staff available");
                    issues.push(AllocationIssue::NoStaffAvailable { specialty });
                }
            }
        }

        let mut assigned_equipment = Vec::new();
        for kind in &assessment.required_equipment {
            match store.reserve_equipment(*kind, 1) {
                Ok(remaining) => {
                    *exhausted |= remaining == 0;
                    assigned_equipment.push(*kind);
                }
                Err(StoreError::Insufficient {
                    requested,
                    available,
                    ..
                }) => {
                    tracing::warn!(patient_id, equipment = %kind, "insufficient equipment");
                    issues.push(AllocationIssue::InsufficientEquipment {
                        equipment: *kind,
                        requested,
                        available,
                    });
                }
                Err(other) => return Err(other.into()),
            }
        }

        let fully_resourced = !issues.iter().any(AllocationIssue::is_shortfall);
        let (status, estimated_ready_minutes) = if fully_resourced {
            (AllocationStatus::Admitted, 0)
        } else {
            (AllocationStatus::Pending, bed.department.wait_minutes_when_full())
        };

        Ok(AllocationResult {
            patient_id: patient_id.to_string(),
            rank,
            severity: assessment.severity,
            status,
            requested_department: requested,
            bed: Some(bed),
            assigned_staff,
            assigned_equipment,
            issues,
            estimated_ready_minutes,
        })
    }
}

fn index_assessments<'a>(
    order: &AllocationOrder,
    assessments: &'a [ClinicalAssessment],
) -> TriageResult<HashMap<&'a str, &'a ClinicalAssessment>> {
    let mut by_id = HashMap::with_capacity(assessments.len());
    for assessment in assessments {
        if by_id.insert(assessment.patient_id.as_str(), assessment).is_some() {
            return Err(TriageError::OrderMismatch(format!(
                "duplicate assessment for {}",
                assessment.patient_id
            )));
        }
    }

    if order.entries.len() != assessments.len() {
        return Err(TriageError::OrderMismatch(format!(
            "order has {} entries for {} assessments",
            order.entries.len(),
            assessments.len()
        )));
    }

    let mut seen = std::collections::HashSet::with_capacity(order.entries.len());
    for (position, entry) in order.entries.iter().enumerate() {
        if entry.rank as usize != position + 1 {
            return Err(TriageError::OrderMismatch(format!(
                "rank {} at position {}",
                entry.rank,
                position + 1
            )));
        }
        if !by_id.contains_key(entry.patient_id.as_str()) {
            return Err(TriageError::OrderMismatch(format!(
                "{} was not assessed",
                entry.patient_id
            )));
        }
        if !seen.insert(entry.patient_id.as_str()) {
            return Err(TriageError::OrderMismatch(format!(
                "{} ranked twice",
                entry.patient_id
            )));
        }
    }

    Ok(by_id)
}

fn place(
    department: Department,
    requested: Department,
    patient_id: &str,
    store: &HospitalStateStore,
    exhausted: &mut bool,
) -> TriageResult<Placement> {
    let fallback = department != requested;

    if department.is_pooled() {
        return match store.reserve_room(department, patient_id) {
            Ok(remaining) => {
                *exhausted |= remaining == 0;
                Ok(Placement::Placed(BedAssignment {
                    department,
                    bed_id: None,
                    fallback,
                }))
            }
            Err(StoreError::Insufficient { .. }) => Ok(Placement::Full),
            Err(other) => Err(other.into()),
        };
    }

    let beds = store.query_beds(department);
    let Some(bed_id) = beds.available_beds.first() else {
        return Ok(Placement::Full);
    };
    let last_free = beds.available_count == 1;
    reserve_named(department, bed_id, requested, patient_id, store, exhausted, last_free)
}

// Commits a bed picked from an earlier query; the bed may have been taken since.
fn reserve_named(
    department: Department,
    bed_id: &str,
    requested: Department,
    patient_id: &str,
    store: &HospitalStateStore,
    exhausted: &mut bool,
    last_free: bool,
) -> TriageResult<Placement> {
    match store.reserve_bed(bed_id, patient_id) {
        Ok(reservation) => {
            *exhausted |= last_free;
            Ok(Placement::Placed(BedAssignment {
                department,
                bed_id: Some(reservation.bed_id),
                fallback: department != requested,
            }))
        }
        Err(StoreError::AlreadyReserved { bed_id, holder }) => {
            Ok(Placement::Lost(AllocationIssue::ResourceConflict {
                department,
                bed_id,
                holder,
            }))
        }
        Err(StoreError::NotAvailable { bed_id, state }) => {
            Ok(Placement::Lost(AllocationIssue::ResourceConflict {
                department,
                bed_id,
                holder: state,
            }))
        }
        Err(other) => Err(other.into()),
    }
}

// Settles the requested department's outcome, trying its fallback once on failure.
fn with_fallback(
    first: Placement,
    requested: Department,
    patient_id: &str,
    store: &HospitalStateStore,
    exhausted: &mut bool,
    issues: &mut Vec<AllocationIssue>,
) -> TriageResult<Option<BedAssignment>> {
    let mut outcome = first;
    let mut department = requested;
    loop {
        match outcome {
            Placement::Placed(assignment) => return Ok(Some(assignment)),
            Placement::Lost(issue) => {
                tracing::warn!(patient_id, %department, "bed taken concurrently, trying fallback");
                issues.push(issue);
            }
            Placement::Full => {
                tracing::debug!(patient_id, %department, "no capacity");
            }
        }
        if department != requested {
            return Ok(None);
        }
        department = requested.fallback();
        outcome = place(department, requested, patient_id, store, exhausted)?;
    }
}

// One re-query if the chosen member was taken concurrently.
fn assign_least_loaded(
    specialty: Specialty,
    patient_id: &str,
    store: &HospitalStateStore,
) -> TriageResult<Option<StaffAssignment>> {
    for _ in 0..2 {
        let Some(candidate) = store.query_staff(specialty).least_busy else {
            return Ok(None);
        };
        match store.assign_staff(&candidate.id, patient_id) {
            Ok(assignment) => return Ok(Some(assignment)),
            Err(StoreError::StaffUnavailable { .. }) => continue,
            Err(other) => return Err(other.into()),
        }
    }
    Ok(None)
}
