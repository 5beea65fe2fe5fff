//! # MedFlow Core
//!
//! Deterministic core of the MedFlow triage and allocation system.
//!
//! Components, leaves first:
//! - [`ClinicalScorer`]: patient vitals and symptoms to a severity score and assessment
//! - [`HospitalStateStore`]: process-wide inventory of beds, staff and equipment with atomic
//!   reserve/release operations
//! - [`ConflictDetector`]: flags contention between a scored batch and the current inventory
//! - [`PriorityRanker`]: strict total order over a scored batch
//! - [`ResourceAllocator`]: walks the order and reserves resources for each patient in turn
//!
//! Data flows one way: scorer, then detector and ranker, then allocator.
//!
//! **No API concerns**: HTTP servers, CLI parsing and request/response wrapping belong in
//! `api-shared`, `api-rest` and `medflow-cli`.

pub mod allocation;
pub mod config;
pub mod conflict;
pub mod constants;
pub mod error;
pub mod patient;
pub mod ranking;
pub mod resources;
pub mod scoring;
pub mod snapshot;
pub mod store;

pub use allocation::{
    AllocationIssue, AllocationResult, AllocationStatus, BatchAllocationResult, BedAssignment,
    ResourceAllocator,
};
pub use config::{
    inventory_from_env_value, BedConfig, BedStatus, InventoryConfig, PoolConfig, StaffConfig,
};
pub use conflict::{Conflict, ConflictDetector, ConflictKind, ConflictReport, ConflictSeverity};
pub use error::{StoreError, TriageError, TriageResult};
pub use patient::{validate_batch, Patient, VitalSigns};
pub use ranking::{AllocationOrder, PriorityRanker, RankedPatient};
pub use resources::{Department, EquipmentKind, ResourceKind, Specialty};
pub use scoring::{
    BatchTriage, ClinicalAssessment, ClinicalScore, ClinicalScorer, SeverityLevel, SeverityTier,
    TriageSummary,
};
pub use snapshot::{CapacityStatus, CapacityView, HospitalSnapshot, QueryFilter};
pub use store::{
    BedAvailability, BedReservation, EquipmentState, EquipmentStatus, HospitalStateStore,
    StaffAssignment, StaffAvailability, StaffMember,
};
