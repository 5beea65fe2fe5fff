//! Request and response bodies shared by the REST API and the CLI.

use medflow_core::{AllocationOrder, BatchAllocationResult, BatchTriage, ConflictReport, Patient};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// One arrival batch, in submission order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdmissionReq {
    pub patients: Vec<Patient>,
}

/// Everything one triage round produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdmissionRes {
    pub triage: BatchTriage,
    pub conflicts: ConflictReport,
    pub order: AllocationOrder,
    pub allocation: BatchAllocationResult,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReleaseQuantityReq {
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReleaseRes {
    pub success: bool,
    pub message: String,
}
