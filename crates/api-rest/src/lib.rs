//! # API REST
//!
//! REST API implementation for MedFlow.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for the services and wire types. [`router`] builds the full application so
//! that both the standalone `medflow-api-rest` binary and the workspace's `medflow-run` binary
//! serve the same routes.

#![warn(rust_2018_idioms)]

use api_shared::{
    AdmissionReq, AdmissionRes, AdmissionService, HealthRes, HealthService, ReleaseQuantityReq,
    ReleaseRes,
};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use medflow_core::{
    ClinicalAssessment, ConflictReport, Department, EquipmentKind, HospitalSnapshot,
    HospitalStateStore, Patient, QueryFilter, StoreError, TriageError,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Every handler shares one `AdmissionService`, and through it one hospital state store.
#[derive(Clone)]
pub struct AppState {
    admissions: AdmissionService,
}

impl AppState {
    pub fn new(store: Arc<HospitalStateStore>) -> Self {
        Self {
            admissions: AdmissionService::new(store),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        hospital_state,
        conflicts,
        admit,
        score,
        release_bed,
        release_rooms,
        release_equipment,
        release_staff,
    ),
    components(schemas(
        HealthRes,
        AdmissionReq,
        AdmissionRes,
        ReleaseQuantityReq,
        ReleaseRes,
        Patient,
        medflow_core::VitalSigns,
        ClinicalAssessment,
        medflow_core::ClinicalScore,
        medflow_core::SeverityLevel,
        medflow_core::SeverityTier,
        medflow_core::BatchTriage,
        medflow_core::TriageSummary,
        Department,
        EquipmentKind,
        medflow_core::Specialty,
        medflow_core::BedStatus,
        ConflictReport,
        medflow_core::Conflict,
        medflow_core::ConflictKind,
        medflow_core::ConflictSeverity,
        medflow_core::AllocationOrder,
        medflow_core::RankedPatient,
        medflow_core::BatchAllocationResult,
        medflow_core::AllocationResult,
        medflow_core::AllocationIssue,
        medflow_core::AllocationStatus,
        medflow_core::BedAssignment,
        medflow_core::StaffAssignment,
        HospitalSnapshot,
        QueryFilter,
        medflow_core::CapacityStatus,
        medflow_core::BedAvailability,
        medflow_core::StaffMember,
        medflow_core::EquipmentStatus,
        medflow_core::EquipmentState,
        medflow_core::snapshot::BedSection,
        medflow_core::snapshot::StaffSection,
        medflow_core::snapshot::EquipmentSection,
        medflow_core::snapshot::WorkloadSummary,
    ))
)]
pub struct ApiDoc;

/// Builds the REST application with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(hospital_state))
        .route("/conflicts", get(conflicts))
        .route("/admissions", post(admit))
        .route("/score", post(score))
        .route("/beds/:id/release", post(release_bed))
        .route("/rooms/:department/release", post(release_rooms))
        .route("/equipment/:kind/release", post(release_equipment))
        .route("/staff/:id/release", post(release_staff))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, &'static str);

fn api_error(context: &str, err: &TriageError) -> ApiError {
    let mapped = match err {
        TriageError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid patient input"),
        TriageError::UnknownCategory { .. } => (StatusCode::BAD_REQUEST, "Unknown category"),
        TriageError::Store(StoreError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, "Resource not found")
        }
        TriageError::Store(_) => (StatusCode::CONFLICT, "Resource state conflict"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    };
    if mapped.0 == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("{context} error: {:?}", err);
    } else {
        tracing::warn!("{context} rejected: {}", err);
    }
    mapped
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct StateQuery {
    /// `beds_only`, `staff_only`, `equipment_only` or `full` (default).
    filter: Option<String>,
}

#[utoipa::path(
    get,
    path = "/state",
    params(StateQuery),
    responses(
        (status = 200, description = "Hospital status snapshot", body = HospitalSnapshot),
        (status = 400, description = "Unknown filter")
    )
)]
/// Read-only status snapshot of beds, staff and equipment
#[axum::debug_handler]
async fn hospital_state(
    State(state): State<AppState>,
    Query(query): Query<StateQuery>,
) -> Result<Json<HospitalSnapshot>, ApiError> {
    let filter = match query.filter.as_deref() {
        Some(raw) => raw
            .parse::<QueryFilter>()
            .map_err(|e| api_error("Snapshot filter", &e))?,
        None => QueryFilter::Full,
    };
    Ok(Json(state.admissions.snapshot(filter)))
}

#[utoipa::path(
    get,
    path = "/conflicts",
    responses(
        (status = 200, description = "Current resource conflicts", body = ConflictReport)
    )
)]
/// Runs the state-only conflict rules against the current inventory
#[axum::debug_handler]
async fn conflicts(State(state): State<AppState>) -> Json<ConflictReport> {
    Json(state.admissions.conflicts())
}

#[utoipa::path(
    post,
    path = "/admissions",
    request_body = AdmissionReq,
    responses(
        (status = 200, description = "Triage round completed", body = AdmissionRes),
        (status = 400, description = "Invalid patient batch"),
        (status = 500, description = "Internal server error")
    )
)]
/// Triage, rank and allocate one arrival batch
///
/// Patients are processed in rank order against the shared store. Patients who cannot be
/// placed are reported as `WAITING` in the response; that is not an error.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the batch is empty,
/// - patient ids are duplicated,
/// - a patient record is malformed.
#[axum::debug_handler]
async fn admit(
    State(state): State<AppState>,
    Json(req): Json<AdmissionReq>,
) -> Result<Json<AdmissionRes>, ApiError> {
    match state.admissions.admit(&req.patients) {
        Ok(res) => Ok(Json(res)),
        Err(e) => Err(api_error("Admission", &e)),
    }
}

#[utoipa::path(
    post,
    path = "/score",
    request_body = Patient,
    responses(
        (status = 200, description = "Clinical assessment", body = ClinicalAssessment),
        (status = 400, description = "Invalid patient")
    )
)]
/// Assess one patient without reserving anything
#[axum::debug_handler]
async fn score(
    State(state): State<AppState>,
    Json(patient): Json<Patient>,
) -> Result<Json<ClinicalAssessment>, ApiError> {
    state
        .admissions
        .score(&patient)
        .map(Json)
        .map_err(|e| api_error("Score", &e))
}

#[utoipa::path(
    post,
    path = "/beds/{id}/release",
    params(("id" = String, Path, description = "Bed id, e.g. ICU-3")),
    responses(
        (status = 200, description = "Bed released", body = ReleaseRes),
        (status = 404, description = "Unknown bed"),
        (status = 409, description = "Bed is not held")
    )
)]
#[axum::debug_handler]
async fn release_bed(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ReleaseRes>, ApiError> {
    state
        .admissions
        .release_bed(&id)
        .map(Json)
        .map_err(|e| api_error("Release bed", &e))
}

#[utoipa::path(
    post,
    path = "/rooms/{department}/release",
    params(("department" = String, Path, description = "ED_Treatment or General_Floor")),
    request_body = ReleaseQuantityReq,
    responses(
        (status = 200, description = "Rooms released", body = ReleaseRes),
        (status = 400, description = "Unknown department"),
        (status = 404, description = "Department has no room pool"),
        (status = 409, description = "Release would exceed total")
    )
)]
#[axum::debug_handler]
async fn release_rooms(
    State(state): State<AppState>,
    AxumPath(department): AxumPath<String>,
    Json(req): Json<ReleaseQuantityReq>,
) -> Result<Json<ReleaseRes>, ApiError> {
    let department = department
        .parse::<Department>()
        .map_err(|e| api_error("Release rooms", &e))?;
    state
        .admissions
        .release_room(department, req.quantity)
        .map(Json)
        .map_err(|e| api_error("Release rooms", &e))
}

#[utoipa::path(
    post,
    path = "/equipment/{kind}/release",
    params(("kind" = String, Path, description = "Equipment type, e.g. ventilators")),
    request_body = ReleaseQuantityReq,
    responses(
        (status = 200, description = "Equipment released", body = ReleaseRes),
        (status = 400, description = "Unknown equipment type"),
        (status = 409, description = "Release would exceed total")
    )
)]
#[axum::debug_handler]
async fn release_equipment(
    State(state): State<AppState>,
    AxumPath(kind): AxumPath<String>,
    Json(req): Json<ReleaseQuantityReq>,
) -> Result<Json<ReleaseRes>, ApiError> {
    let kind = kind
        .parse::<EquipmentKind>()
        .map_err(|e| api_error("Release equipment", &e))?;
    state
        .admissions
        .release_equipment(kind, req.quantity)
        .map(Json)
        .map_err(|e| api_error("Release equipment", &e))
}

#[utoipa::path(
    post,
    path = "/staff/{id}/release",
    params(("id" = String, Path, description = "Staff id, e.g. dr-patel")),
    responses(
        (status = 200, description = "Patient released from staff member", body = ReleaseRes),
        (status = 404, description = "Unknown staff member"),
        (status = 409, description = "Staff member has no patients")
    )
)]
#[axum::debug_handler]
async fn release_staff(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ReleaseRes>, ApiError> {
    state
        .admissions
        .release_staff(&id)
        .map(Json)
        .map_err(|e| api_error("Release staff", &e))
}
