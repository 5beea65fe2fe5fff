use crate::types::HealthRes;

/// Simple health service that can be used by every MedFlow surface
///
/// This service provides a standardised way to check the health status of the MedFlow system.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "MedFlow is alive".into(),
        }
    }
}
