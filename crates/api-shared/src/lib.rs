//! # API Shared
//!
//! Shared services and wire types for the MedFlow surfaces.
//!
//! Contains:
//! - `HealthService`
//! - `AdmissionService`, which runs one triage round against a shared store
//! - Request/response types used by both the REST API and the CLI
//!
//! Used by `api-rest`, `medflow-cli` and the `medflow-run` binary.

pub mod admission;
pub mod health;
pub mod types;

pub use admission::AdmissionService;
pub use health::HealthService;
pub use types::*;
