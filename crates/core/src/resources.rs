//! Closed resource categories.
//!
//! Departments, staff specialties and equipment types are enumerations rather than free strings.
//! External identifiers (CLI arguments, REST paths, inventory YAML) are mapped through
//! [`std::str::FromStr`], which rejects unknown categories with
//! [`TriageError::UnknownCategory`] instead of quietly returning nothing.

use crate::error::TriageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowercases and folds `-`/space separators to `_` so `ED-Trauma`, `ed trauma` and `ED_Trauma`
/// all compare equal.
fn normalise(input: &str) -> String {
    input
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Hospital department a patient can be placed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Department {
    #[serde(rename = "ICU")]
    Icu,
    #[serde(rename = "ED_Trauma")]
    EdTrauma,
    #[serde(rename = "ED_Treatment")]
    EdTreatment,
    #[serde(rename = "General_Floor")]
    GeneralFloor,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::Icu,
        Department::EdTrauma,
        Department::EdTreatment,
        Department::GeneralFloor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Department::Icu => "ICU",
            Department::EdTrauma => "ED_Trauma",
            Department::EdTreatment => "ED_Treatment",
            Department::GeneralFloor => "General_Floor",
        }
    }

    /// Pooled departments hold identity-less rooms counted as `{available, total}`; the others
    /// hold individually named beds.
    pub fn is_pooled(self) -> bool {
        matches!(self, Department::EdTreatment | Department::GeneralFloor)
    }

    /// The single fallback tried when this department has no free bed.
    pub fn fallback(self) -> Department {
        match self {
            Department::Icu => Department::EdTrauma,
            Department::EdTrauma => Department::EdTreatment,
            Department::EdTreatment => Department::GeneralFloor,
            Department::GeneralFloor => Department::EdTreatment,
        }
    }

    /// Estimated wait when the department has nothing free. Also used as the ready-time delay
    /// for a partially resourced placement.
    pub fn wait_minutes_when_full(self) -> u32 {
        match self {
            Department::Icu => 45,
            Department::EdTrauma => 20,
            Department::EdTreatment => 35,
            Department::GeneralFloor => 60,
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "icu" => Ok(Department::Icu),
            "ed_trauma" => Ok(Department::EdTrauma),
            "ed_treatment" => Ok(Department::EdTreatment),
            "general_floor" => Ok(Department::GeneralFloor),
            _ => Err(TriageError::UnknownCategory {
                category: "department",
                value: s.to_string(),
            }),
        }
    }
}

/// Staff specialty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Specialty {
    #[serde(rename = "ED_Physician")]
    EdPhysician,
    #[serde(rename = "ED_Nurse")]
    EdNurse,
    #[serde(rename = "Cardiologist")]
    Cardiologist,
    #[serde(rename = "Trauma_Surgeon")]
    TraumaSurgeon,
    #[serde(rename = "Neurologist")]
    Neurologist,
}

impl Specialty {
    pub const ALL: [Specialty; 5] = [
        Specialty::EdPhysician,
        Specialty::EdNurse,
        Specialty::Cardiologist,
        Specialty::TraumaSurgeon,
        Specialty::Neurologist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Specialty::EdPhysician => "ED_Physician",
            Specialty::EdNurse => "ED_Nurse",
            Specialty::Cardiologist => "Cardiologist",
            Specialty::TraumaSurgeon => "Trauma_Surgeon",
            Specialty::Neurologist => "Neurologist",
        }
    }

    /// Load-balanced roles take any number of patients and are picked by lowest load.
    /// Other specialists are on call and become unavailable once assigned.
    pub fn is_load_balanced(self) -> bool {
        matches!(self, Specialty::EdPhysician | Specialty::EdNurse)
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Specialty {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "ed_physician" | "physician" => Ok(Specialty::EdPhysician),
            "ed_nurse" | "nurse" => Ok(Specialty::EdNurse),
            "cardiologist" => Ok(Specialty::Cardiologist),
            "trauma_surgeon" => Ok(Specialty::TraumaSurgeon),
            "neurologist" => Ok(Specialty::Neurologist),
            _ => Err(TriageError::UnknownCategory {
                category: "specialty",
                value: s.to_string(),
            }),
        }
    }
}

/// Countable equipment type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EquipmentKind {
    #[serde(rename = "ventilators")]
    Ventilator,
    #[serde(rename = "cardiac_monitors")]
    CardiacMonitor,
    #[serde(rename = "defibrillators")]
    Defibrillator,
}

impl EquipmentKind {
    pub const ALL: [EquipmentKind; 3] = [
        EquipmentKind::Ventilator,
        EquipmentKind::CardiacMonitor,
        EquipmentKind::Defibrillator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentKind::Ventilator => "ventilators",
            EquipmentKind::CardiacMonitor => "cardiac_monitors",
            EquipmentKind::Defibrillator => "defibrillators",
        }
    }
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentKind {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "ventilators" | "ventilator" => Ok(EquipmentKind::Ventilator),
            "cardiac_monitors" | "cardiac_monitor" => Ok(EquipmentKind::CardiacMonitor),
            "defibrillators" | "defibrillator" => Ok(EquipmentKind::Defibrillator),
            _ => Err(TriageError::UnknownCategory {
                category: "equipment type",
                value: s.to_string(),
            }),
        }
    }
}

/// What a [`crate::StoreError::NotFound`] failed to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Bed,
    Staff,
    Equipment,
    Department,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Bed => "bed",
            ResourceKind::Staff => "staff member",
            ResourceKind::Equipment => "equipment type",
            ResourceKind::Department => "department",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_parses_common_spellings() {
        assert_eq!("ICU".parse::<Department>().unwrap(), Department::Icu);
        assert_eq!("ed-trauma".parse::<Department>().unwrap(), Department::EdTrauma);
        assert_eq!(
            "ED_Treatment".parse::<Department>().unwrap(),
            Department::EdTreatment
        );
        assert_eq!(
            " general floor ".parse::<Department>().unwrap(),
            Department::GeneralFloor
        );
    }

    #[test]
    fn unknown_categories_are_rejected() {
        let err = "Maternity".parse::<Department>().expect_err("should reject");
        assert!(matches!(
            err,
            TriageError::UnknownCategory {
                category: "department",
                ref value,
            } if value == "Maternity"
        ));

        let err = "Dermatologist".parse::<Specialty>().expect_err("should reject");
        assert!(matches!(err, TriageError::UnknownCategory { category: "specialty", .. }));

        let err = "infusion_pumps".parse::<EquipmentKind>().expect_err("should reject");
        assert!(matches!(
            err,
            TriageError::UnknownCategory { category: "equipment type", .. }
        ));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for dept in Department::ALL {
            assert_eq!(dept.to_string().parse::<Department>().unwrap(), dept);
        }
        for specialty in Specialty::ALL {
            assert_eq!(specialty.to_string().parse::<Specialty>().unwrap(), specialty);
        }
        for kind in EquipmentKind::ALL {
            assert_eq!(kind.to_string().parse::<EquipmentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn every_department_has_a_different_fallback() {
        for dept in Department::ALL {
            assert_ne!(dept.fallback(), dept);
        }
        assert_eq!(Department::Icu.fallback(), Department::EdTrauma);
        assert_eq!(Department::EdTrauma.fallback(), Department::EdTreatment);
    }

    #[test]
    fn wire_names_match_serde() {
        assert_eq!(
            serde_json::to_string(&Department::EdTrauma).unwrap(),
            "\"ED_Trauma\""
        );
        assert_eq!(
            serde_json::to_string(&EquipmentKind::CardiacMonitor).unwrap(),
            "\"cardiac_monitors\""
        );
        assert_eq!(
            serde_json::to_string(&Specialty::TraumaSurgeon).unwrap(),
            "\"Trauma_Surgeon\""
        );
    }
}
