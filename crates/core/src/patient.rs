//! Patient input records.
//!
//! A [`Patient`] is read-only input to scoring. Vital signs are optional; the scorer substitutes
//! clinically normal values for anything missing so that scoring stays total. Validation here is
//! for the batch boundary, where a malformed record should be rejected before a round starts.

use crate::constants::{
    DEFAULT_BP_SYSTOLIC, DEFAULT_HEART_RATE, DEFAULT_OXYGEN_SATURATION, MAX_PATIENT_AGE,
};
use crate::error::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Vital signs as recorded at triage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VitalSigns {
    /// Beats per minute.
    #[serde(default)]
    pub heart_rate: Option<f64>,
    /// Systolic blood pressure in mmHg.
    #[serde(default)]
    pub bp_systolic: Option<f64>,
    /// Peripheral oxygen saturation in percent.
    #[serde(default)]
    pub oxygen_saturation: Option<f64>,
}

impl VitalSigns {
    pub fn new(heart_rate: f64, bp_systolic: f64, oxygen_saturation: f64) -> Self {
        Self {
            heart_rate: Some(heart_rate),
            bp_systolic: Some(bp_systolic),
            oxygen_saturation: Some(oxygen_saturation),
        }
    }

    pub fn heart_rate_or_default(&self) -> f64 {
        finite_or(self.heart_rate, DEFAULT_HEART_RATE)
    }

    pub fn bp_systolic_or_default(&self) -> f64 {
        finite_or(self.bp_systolic, DEFAULT_BP_SYSTOLIC)
    }

    pub fn oxygen_saturation_or_default(&self) -> f64 {
        finite_or(self.oxygen_saturation, DEFAULT_OXYGEN_SATURATION)
    }
}

// NaN and infinities count as missing.
fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

/// A patient presenting for triage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Patient {
    /// Name or identifier, unique within a batch.
    pub id: String,
    /// Age in whole years; infants under one year are `0`.
    pub age: u32,
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub vital_signs: VitalSigns,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
}

impl Patient {
    pub fn new(id: impl Into<String>, age: u32, vital_signs: VitalSigns) -> Self {
        Self {
            id: id.into(),
            age,
            chief_complaint: None,
            vital_signs,
            symptoms: Vec::new(),
            medical_history: Vec::new(),
        }
    }

    pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symptoms = symptoms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_history<I, S>(mut self, history: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.medical_history = history.into_iter().map(Into::into).collect();
        self
    }

    /// Checks that this record is usable as batch input.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Validation`] if:
    /// - the identifier is empty or whitespace,
    /// - the age is beyond any plausible human age,
    /// - a supplied vital sign is negative, non-finite, or oxygen saturation exceeds 100%.
    pub fn validate(&self) -> TriageResult<()> {
        if self.id.trim().is_empty() {
            return Err(TriageError::Validation("patient id cannot be empty".into()));
        }

        if self.age > MAX_PATIENT_AGE {
            return Err(TriageError::Validation(format!(
                "{}: age {} exceeds maximum of {}",
                self.id, self.age, MAX_PATIENT_AGE
            )));
        }

        let vitals = [
            ("heart_rate", self.vital_signs.heart_rate),
            ("bp_systolic", self.vital_signs.bp_systolic),
            ("oxygen_saturation", self.vital_signs.oxygen_saturation),
        ];
        for (name, value) in vitals {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(TriageError::Validation(format!(
                        "{}: {name} must be a non-negative number, got {v}",
                        self.id
                    )));
                }
            }
        }

        if matches!(self.vital_signs.oxygen_saturation, Some(v) if v > 100.0) {
            return Err(TriageError::Validation(format!(
                "{}: oxygen_saturation cannot exceed 100%",
                self.id
            )));
        }

        Ok(())
    }
}

/// Validates every record of a batch and rejects duplicate identifiers.
///
/// Submission order is significant (it is the final ranking tie-break), so the batch is
/// only inspected, never reordered.
pub fn validate_batch(patients: &[Patient]) -> TriageResult<()> {
    if patients.is_empty() {
        return Err(TriageError::Validation("batch contains no patients".into()));
    }

    let mut seen = HashSet::with_capacity(patients.len());
    for patient in patients {
        patient.validate()?;
        if !seen.insert(patient.id.trim()) {
            return Err(TriageError::Validation(format!(
                "duplicate patient id in batch: {}",
                patient.id
            )));
        }
    }

    Ok(())
}
