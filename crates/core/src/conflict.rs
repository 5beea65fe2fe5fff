//! Resource contention detection.
//!
//! Two groups of rules, each evaluated independently:
//! - state rules look only at the hospital (ICU occupancy, trauma bays, physician load,
//!   ventilators),
//! - demand rules compare what a scored batch asks for against what is free.
//!
//! The overall severity is the maximum across triggered rules. Detection only reads the store.

use crate::constants::{ICU_CRITICAL_OCCUPANCY, ICU_HIGH_OCCUPANCY, PHYSICIAN_OVERLOAD_THRESHOLD};
use crate::resources::{Department, EquipmentKind, Specialty};
use crate::scoring::ClinicalAssessment;
use crate::snapshot::CapacityView;
use crate::store::HospitalStateStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    None,
    Moderate,
    High,
    Critical,
}

impl ConflictSeverity {
    pub fn max_of(severities: impl IntoIterator<Item = ConflictSeverity>) -> Self {
        severities
            .into_iter()
            .max()
            .unwrap_or(ConflictSeverity::None)
    }

    pub fn requires_intervention(self) -> bool {
        matches!(self, ConflictSeverity::High | ConflictSeverity::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConflictSeverity::None => "NONE",
            ConflictSeverity::Moderate => "MODERATE",
            ConflictSeverity::High => "HIGH",
            ConflictSeverity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    IcuCapacity,
    TraumaBayShortage,
    PhysicianOverload,
    VentilatorShortage,
    VentilatorLimited,
    IcuDemand,
    SpecialistContention,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::IcuCapacity => "ICU_CAPACITY",
            ConflictKind::TraumaBayShortage => "TRAUMA_BAY_SHORTAGE",
            ConflictKind::PhysicianOverload => "PHYSICIAN_OVERLOAD",
            ConflictKind::VentilatorShortage => "VENTILATOR_SHORTAGE",
            ConflictKind::VentilatorLimited => "VENTILATOR_LIMITED",
            ConflictKind::IcuDemand => "ICU_DEMAND",
            ConflictKind::SpecialistContention => "SPECIALIST_CONTENTION",
        }
    }

    /// True for rules driven by what a batch asks for rather than by hospital state alone.
    pub fn is_demand(self) -> bool {
        matches!(self, ConflictKind::IcuDemand | ConflictKind::SpecialistContention)
    }

    /// Fixed mitigation text. ICU capacity is the one kind whose advice depends on severity.
    pub fn mitigation(self, severity: ConflictSeverity) -> &'static str {
        match (self, severity) {
            (ConflictKind::IcuCapacity, ConflictSeverity::Critical) => {
                "Consider ED holding or transfer to partner facility"
            }
            (ConflictKind::IcuCapacity, _) => "Monitor for potential shortage",
            (ConflictKind::TraumaBayShortage, _) => {
                "Use ED treatment rooms for non-trauma critical patients"
            }
            (ConflictKind::PhysicianOverload, _) => {
                "Redistribute new admissions or call additional staff"
            }
            (ConflictKind::VentilatorShortage, _) => {
                "Use BiPAP or manual ventilation; prepare for transfer"
            }
            (ConflictKind::VentilatorLimited, _) => "Reserve for most critical patients only",
            (ConflictKind::IcuDemand, _) => {
                "Admit in rank order; route overflow to ED_Trauma or arrange transfer"
            }
            (ConflictKind::SpecialistContention, _) => {
                "Sequence consults by rank and page backup on-call specialists"
            }
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One triggered rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub severity: ConflictSeverity,
    pub details: String,
    pub recommendation: String,
}

impl Conflict {
    fn new(kind: ConflictKind, severity: ConflictSeverity, details: String) -> Self {
        Self {
            kind,
            severity,
            details,
            recommendation: kind.mitigation(severity).to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConflictReport {
    pub detected: bool,
    pub conflict_count: usize,
    pub severity: ConflictSeverity,
    pub items: Vec<Conflict>,
    pub requires_intervention: bool,
    pub timestamp: DateTime<Utc>,
}

impl ConflictReport {
    fn from_items(items: Vec<Conflict>, timestamp: DateTime<Utc>) -> Self {
        let severity = ConflictSeverity::max_of(items.iter().map(|c| c.severity));
        Self {
            detected: !items.is_empty(),
            conflict_count: items.len(),
            severity,
            requires_intervention: severity.requires_intervention(),
            items,
            timestamp,
        }
    }

    /// The contention a ranking should be explained against.
    ///
    /// Demand conflicts win over state conflicts; within a group the most severe wins and the
    /// earlier rule breaks ties.
    pub fn dominant(&self) -> Option<&Conflict> {
        fn most_severe<'a>(group: Vec<&'a Conflict>) -> Option<&'a Conflict> {
            group.into_iter().rev().max_by_key(|c| c.severity)
        }
        most_severe(self.items.iter().filter(|c| c.kind.is_demand()).collect())
            .or_else(|| most_severe(self.items.iter().collect()))
    }
}

/// Conflict detection operations.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Evaluates every rule against one consistent view of the store.
    pub fn detect(
        assessments: &[ClinicalAssessment],
        store: &HospitalStateStore,
    ) -> ConflictReport {
        Self::detect_in(assessments, &store.capacity())
    }

    pub fn detect_in(assessments: &[ClinicalAssessment], view: &CapacityView) -> ConflictReport {
        let mut items = Self::state_conflicts(view);
        items.extend(Self::demand_conflicts(assessments, view));
        let report = ConflictReport::from_items(items, view.taken_at);

        if report.requires_intervention {
            tracing::warn!(
                severity = %report.severity,
                conflicts = report.conflict_count,
                "resource conflicts require intervention"
            );
        } else {
            tracing::debug!(
                severity = %report.severity,
                conflicts = report.conflict_count,
                "conflict check complete"
            );
        }
        report
    }

    /// Rules that depend on hospital state only.
    pub fn state_conflicts(view: &CapacityView) -> Vec<Conflict> {
        let mut items = Vec::new();

        if let Some(icu) = view.department(Department::Icu) {
            let occupancy = icu.occupancy_rate;
            if occupancy >= ICU_CRITICAL_OCCUPANCY {
                items.push(Conflict::new(
                    ConflictKind::IcuCapacity,
                    ConflictSeverity::Critical,
                    format!(
                        "ICU at {occupancy:.0}% capacity - only {} beds available",
                        icu.available_count
                    ),
                ));
            } else if occupancy >= ICU_HIGH_OCCUPANCY {
                items.push(Conflict::new(
                    ConflictKind::IcuCapacity,
                    ConflictSeverity::High,
                    format!("ICU at {occupancy:.0}% capacity"),
                ));
            }
        }

        if matches!(
            view.department(Department::EdTrauma),
            Some(bays) if bays.available_count == 0
        ) {
            items.push(Conflict::new(
                ConflictKind::TraumaBayShortage,
                ConflictSeverity::High,
                "No trauma bays available".to_string(),
            ));
        }

        let overloaded = view
            .staff_with(Specialty::EdPhysician)
            .filter(|p| p.current_load >= PHYSICIAN_OVERLOAD_THRESHOLD)
            .count();
        if overloaded > 0 {
            items.push(Conflict::new(
                ConflictKind::PhysicianOverload,
                ConflictSeverity::Moderate,
                format!(
                    "{overloaded} physicians at capacity ({PHYSICIAN_OVERLOAD_THRESHOLD}+ patients)"
                ),
            ));
        }

        match view.equipment(EquipmentKind::Ventilator).map(|v| v.available) {
            Some(0) => items.push(Conflict::new(
                ConflictKind::VentilatorShortage,
                ConflictSeverity::Critical,
                "No ventilators available".to_string(),
            )),
            Some(1) => items.push(Conflict::new(
                ConflictKind::VentilatorLimited,
                ConflictSeverity::High,
                "Only 1 ventilator(s) available".to_string(),
            )),
            _ => {}
        }

        items
    }

    fn demand_conflicts(assessments: &[ClinicalAssessment], view: &CapacityView) -> Vec<Conflict> {
        let mut items = Vec::new();

        let icu_demand = assessments
            .iter()
            .filter(|a| a.recommended_department == Department::Icu)
            .count();
        let icu_free = view
            .department(Department::Icu)
            .map_or(0, |icu| icu.available_count as usize);
        if icu_demand > icu_free {
            items.push(Conflict::new(
                ConflictKind::IcuDemand,
                ConflictSeverity::High,
                format!("{icu_demand} patients need ICU with {icu_free} ICU beds available"),
            ));
        }

        for specialty in Specialty::ALL.iter().filter(|s| !s.is_load_balanced()) {
            let demand = assessments
                .iter()
                .filter(|a| a.required_specialists.contains(specialty))
                .count();
            let on_call = view.staff_with(*specialty).filter(|s| s.available).count();
            if demand > on_call {
                items.push(Conflict::new(
                    ConflictKind::SpecialistContention,
                    ConflictSeverity::Moderate,
                    format!("{demand} patients need {specialty} with {on_call} available"),
                ));
            }
        }

        items
    }
}
