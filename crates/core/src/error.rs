//! Error taxonomy for the triage core.
//!
//! Two layers:
//! - [`StoreError`] is the outcome of a single hospital state store operation. The allocator turns
//!   most of these into per-patient [`crate::allocation::AllocationIssue`] values instead of
//!   propagating them.
//! - [`TriageError`] is the crate-level error returned by configuration, validation and the
//!   batch entry points.

use crate::resources::ResourceKind;

/// Outcome taxonomy of hospital state store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("bed {bed_id} already reserved for {holder}")]
    AlreadyReserved { bed_id: String, holder: String },
    #[error("bed {bed_id} not available (status: {state})")]
    NotAvailable { bed_id: String, state: String },
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },
    #[error("insufficient {resource}: requested {requested}, only {available} available")]
    Insufficient {
        resource: String,
        requested: u32,
        available: u32,
    },
    #[error("staff member {staff_id} is not available")]
    StaffUnavailable { staff_id: String },
    #[error("releasing {resource} would exceed its total of {total}")]
    ExceedsTotal { resource: String, total: u32 },
    #[error("bed {bed_id} is not held by any patient")]
    NotHeld { bed_id: String },
    #[error("staff member {staff_id} has no assigned patients")]
    NotAssigned { staff_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid patient input: {0}")]
    Validation(String),
    #[error("invalid inventory configuration: {0}")]
    InvalidInventory(String),
    #[error("unknown {category}: '{value}'")]
    UnknownCategory {
        category: &'static str,
        value: String,
    },
    #[error("allocation order does not match the assessed batch: {0}")]
    OrderMismatch(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to read inventory file: {0}")]
    InventoryRead(std::io::Error),
    #[error("failed to parse inventory YAML: {0}")]
    InventoryParse(serde_yaml::Error),
    #[error("failed to serialise inventory YAML: {0}")]
    InventorySerialise(serde_yaml::Error),
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;
