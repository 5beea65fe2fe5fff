//! Point-in-time views of the hospital state for reporting collaborators.

use crate::conflict::{ConflictDetector, ConflictSeverity};
use crate::constants::{EQUIPMENT_SHORTAGE_UTILISATION, PHYSICIAN_OVERLOAD_THRESHOLD};
use crate::error::TriageError;
use crate::resources::{Department, EquipmentKind, Specialty};
use crate::store::{BedAvailability, EquipmentStatus, StaffMember};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every department, staff member and equipment pool as read under one store lock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacityView {
    pub taken_at: DateTime<Utc>,
    /// One entry per department, in [`Department::ALL`] order.
    pub departments: Vec<BedAvailability>,
    /// The full roster in configuration order.
    pub staff: Vec<StaffMember>,
    pub equipment: Vec<EquipmentStatus>,
}

impl CapacityView {
    pub fn department(&self, department: Department) -> Option<&BedAvailability> {
        self.departments.iter().find(|d| d.department == department)
    }

    pub fn equipment(&self, kind: EquipmentKind) -> Option<&EquipmentStatus> {
        self.equipment.iter().find(|e| e.equipment_type == kind)
    }

    pub fn staff_with(&self, specialty: Specialty) -> impl Iterator<Item = &StaffMember> {
        self.staff.iter().filter(move |s| s.specialty == specialty)
    }
}

/// Which sections a snapshot includes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum QueryFilter {
    BedsOnly,
    StaffOnly,
    EquipmentOnly,
    #[default]
    Full,
}

impl QueryFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryFilter::BedsOnly => "beds_only",
            QueryFilter::StaffOnly => "staff_only",
            QueryFilter::EquipmentOnly => "equipment_only",
            QueryFilter::Full => "full",
        }
    }

    fn includes_beds(self) -> bool {
        matches!(self, QueryFilter::BedsOnly | QueryFilter::Full)
    }

    fn includes_staff(self) -> bool {
        matches!(self, QueryFilter::StaffOnly | QueryFilter::Full)
    }

    fn includes_equipment(self) -> bool {
        matches!(self, QueryFilter::EquipmentOnly | QueryFilter::Full)
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryFilter {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "beds_only" | "beds" => Ok(QueryFilter::BedsOnly),
            "staff_only" | "staff" => Ok(QueryFilter::StaffOnly),
            "equipment_only" | "equipment" => Ok(QueryFilter::EquipmentOnly),
            "full" | "" => Ok(QueryFilter::Full),
            _ => Err(TriageError::UnknownCategory {
                category: "snapshot filter",
                value: s.to_string(),
            }),
        }
    }
}

/// Overall capacity label derived from the state-only conflict severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CapacityStatus {
    Normal,
    Stressed,
    Critical,
}

impl From<ConflictSeverity> for CapacityStatus {
    fn from(severity: ConflictSeverity) -> Self {
        match severity {
            ConflictSeverity::None => CapacityStatus::Normal,
            ConflictSeverity::Moderate | ConflictSeverity::High => CapacityStatus::Stressed,
            ConflictSeverity::Critical => CapacityStatus::Critical,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BedSection {
    pub departments: Vec<BedAvailability>,
    pub icu_occupancy_rate: f64,
}

/// Load spread across one load-balanced role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkloadSummary {
    pub specialty: Specialty,
    pub least_busy: String,
    pub least_load: u32,
    pub most_busy: String,
    pub most_load: u32,
    pub average_load: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StaffSection {
    pub members: Vec<StaffMember>,
    pub workload: Vec<WorkloadSummary>,
    /// Names of staff at or above the overload threshold.
    pub overloaded_staff: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EquipmentSection {
    pub pools: Vec<EquipmentStatus>,
    pub shortages: Vec<String>,
}

/// Filtered, timestamped status report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HospitalSnapshot {
    pub timestamp: DateTime<Utc>,
    pub filter: QueryFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beds: Option<BedSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<StaffSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<EquipmentSection>,
    pub capacity_status: CapacityStatus,
}

impl HospitalSnapshot {
    pub fn from_capacity(filter: QueryFilter, view: &CapacityView) -> Self {
        let severity = ConflictSeverity::max_of(
            ConflictDetector::state_conflicts(view)
                .iter()
                .map(|c| c.severity),
        );

        Self {
            timestamp: view.taken_at,
            filter,
            beds: filter.includes_beds().then(|| bed_section(view)),
            staff: filter.includes_staff().then(|| staff_section(view)),
            equipment: filter.includes_equipment().then(|| equipment_section(view)),
            capacity_status: CapacityStatus::from(severity),
        }
    }
}

fn bed_section(view: &CapacityView) -> BedSection {
    BedSection {
        departments: view.departments.clone(),
        icu_occupancy_rate: view
            .department(Department::Icu)
            .map_or(0.0, |icu| icu.occupancy_rate),
    }
}

fn staff_section(view: &CapacityView) -> StaffSection {
    let workload = Specialty::ALL
        .iter()
        .filter(|s| s.is_load_balanced())
        .filter_map(|specialty| workload_of(view, *specialty))
        .collect();

    let overloaded_staff = view
        .staff
        .iter()
        .filter(|s| {
            s.specialty.is_load_balanced() && s.current_load >= PHYSICIAN_OVERLOAD_THRESHOLD
        })
        .map(|s| s.name.clone())
        .collect();

    StaffSection {
        members: view.staff.clone(),
        workload,
        overloaded_staff,
    }
}

fn workload_of(view: &CapacityView, specialty: Specialty) -> Option<WorkloadSummary> {
    let members: Vec<&StaffMember> = view.staff_with(specialty).collect();
    // First member wins ties on both ends.
    let least = members
        .iter()
        .copied()
        .reduce(|a, b| if b.current_load < a.current_load { b } else { a })?;
    let most = members
        .iter()
        .copied()
        .reduce(|a, b| if b.current_load > a.current_load { b } else { a })?;
    let total: u32 = members.iter().map(|s| s.current_load).sum();

    Some(WorkloadSummary {
        specialty,
        least_busy: least.name.clone(),
        least_load: least.current_load,
        most_busy: most.name.clone(),
        most_load: most.current_load,
        average_load: f64::from(total) / members.len() as f64,
    })
}

fn equipment_section(view: &CapacityView) -> EquipmentSection {
    let shortages = view
        .equipment
        .iter()
        .filter_map(|e| {
            if e.available == 0 {
                Some(format!("{}: NONE AVAILABLE", e.equipment_type))
            } else if e.utilization_rate >= EQUIPMENT_SHORTAGE_UTILISATION {
                Some(format!(
                    "{}: {}/{} available ({:.0}% utilized)",
                    e.equipment_type, e.available, e.total, e.utilization_rate
                ))
            } else {
                None
            }
        })
        .collect();

    EquipmentSection {
        pools: view.equipment.clone(),
        shortages,
    }
}
