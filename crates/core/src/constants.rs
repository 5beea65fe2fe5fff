//! Constants used throughout the MedFlow core crate.
//!
//! Clinical defaults, thresholds and table-driven cut-offs live here so the scoring,
//! detection and reporting code reads against named values.

/// Heart rate assumed when none was recorded (bpm).
pub const DEFAULT_HEART_RATE: f64 = 80.0;

/// Systolic blood pressure assumed when none was recorded (mmHg).
pub const DEFAULT_BP_SYSTOLIC: f64 = 120.0;

/// Oxygen saturation assumed when none was recorded (%).
pub const DEFAULT_OXYGEN_SATURATION: f64 = 98.0;

/// Oldest accepted patient age at the batch boundary.
pub const MAX_PATIENT_AGE: u32 = 130;

/// Score at or above which a patient is CRITICAL.
pub const CRITICAL_SCORE: u32 = 12;

/// Score at or above which a patient is EMERGENCY.
pub const EMERGENCY_SCORE: u32 = 8;

/// Score at or above which a patient is URGENT.
pub const URGENT_SCORE: u32 = 5;

/// Concurrent patients at which a physician counts as overloaded.
pub const PHYSICIAN_OVERLOAD_THRESHOLD: u32 = 5;

/// ICU occupancy (%) that raises a CRITICAL capacity conflict.
pub const ICU_CRITICAL_OCCUPANCY: f64 = 90.0;

/// ICU occupancy (%) that raises a HIGH capacity conflict.
pub const ICU_HIGH_OCCUPANCY: f64 = 75.0;

/// Equipment utilisation (%) reported as a shortage in status snapshots.
pub const EQUIPMENT_SHORTAGE_UTILISATION: f64 = 80.0;

/// Filename used when the CLI writes out the default inventory.
pub const DEFAULT_INVENTORY_FILENAME: &str = "inventory.yaml";
