//! Triage rounds over a shared hospital state store.
//!
//! `AdmissionService` chains the core components in their fixed order (score, detect, rank,
//! allocate) for one batch. It adds no retries and keeps nothing between rounds; all state
//! lives in the store.

use crate::types::{AdmissionRes, ReleaseRes};
use medflow_core::{
    validate_batch, ClinicalAssessment, ClinicalScorer, ConflictDetector, ConflictReport,
    Department, EquipmentKind, HospitalSnapshot, HospitalStateStore, Patient, PriorityRanker,
    QueryFilter, ResourceAllocator, TriageResult,
};
use std::sync::Arc;

/// Service for running triage rounds and releasing resources.
///
/// Clones share the same store, so one instance can be handed to every request handler.
#[derive(Clone, Debug)]
pub struct AdmissionService {
    store: Arc<HospitalStateStore>,
}

impl AdmissionService {
    pub fn new(store: Arc<HospitalStateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &HospitalStateStore {
        &self.store
    }

    /// Scores, ranks and allocates one arrival batch.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Validation` if the batch is empty, contains duplicate ids, or a
    /// patient record is malformed. Nothing is reserved in that case.
    pub fn admit(&self, patients: &[Patient]) -> TriageResult<AdmissionRes> {
        validate_batch(patients)?;
        let triage = ClinicalScorer::assess_batch(patients);
        tracing::info!(
            patients = triage.summary.total_patients,
            critical = triage.summary.critical_count,
            emergency = triage.summary.emergency_count,
            "triage round started"
        );

        let conflicts = ConflictDetector::detect(&triage.assessments, &self.store);
        let order = PriorityRanker::rank(&triage.assessments, Some(&conflicts));
        let allocation = ResourceAllocator::allocate(&order, &triage.assessments, &self.store)?;

        Ok(AdmissionRes {
            triage,
            conflicts,
            order,
            allocation,
        })
    }

    /// Assesses a single patient without touching the store.
    pub fn score(&self, patient: &Patient) -> TriageResult<ClinicalAssessment> {
        patient.validate()?;
        Ok(ClinicalScorer::assess(patient))
    }

    /// State-only conflict check, as a status dashboard would run it.
    pub fn conflicts(&self) -> ConflictReport {
        ConflictDetector::detect(&[], &self.store)
    }

    pub fn snapshot(&self, filter: QueryFilter) -> HospitalSnapshot {
        self.store.snapshot(filter)
    }

    pub fn release_bed(&self, bed_id: &str) -> TriageResult<ReleaseRes> {
        let holder = self.store.release_bed(bed_id)?;
        tracing::info!(bed_id, holder = %holder, "bed released");
        Ok(ReleaseRes {
            success: true,
            message: format!("{bed_id} released from {holder}"),
        })
    }

    pub fn release_room(&self, department: Department, quantity: u32) -> TriageResult<ReleaseRes> {
        let available = self.store.release_room(department, quantity)?;
        Ok(ReleaseRes {
            success: true,
            message: format!("{department}: {available} rooms available"),
        })
    }

    pub fn release_equipment(
        &self,
        kind: EquipmentKind,
        quantity: u32,
    ) -> TriageResult<ReleaseRes> {
        let available = self.store.release_equipment(kind, quantity)?;
        tracing::info!(equipment = %kind, quantity, available, "equipment released");
        Ok(ReleaseRes {
            success: true,
            message: format!("{kind}: {available} available"),
        })
    }

    pub fn release_staff(&self, staff_id: &str) -> TriageResult<ReleaseRes> {
        let load = self.store.release_staff(staff_id)?;
        Ok(ReleaseRes {
            success: true,
            message: format!("{staff_id} now has {load} patients"),
        })
    }
}
