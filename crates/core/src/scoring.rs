//! Clinical severity scoring.
//!
//! An additive point scale over age, vital signs and symptom keywords (higher is more severe),
//! mapped onto a severity tier and a survival estimate. Everything here is deterministic and
//! side-effect free: the same patient always produces the same assessment apart from the
//! `assessed_at` timestamp.
//!
//! Department, specialist, test and equipment recommendations are table lookups keyed on the
//! tier and on the symptom keywords that matched, so they are reproducible too.

use crate::constants::{CRITICAL_SCORE, EMERGENCY_SCORE, URGENT_SCORE};
use crate::patient::{Patient, VitalSigns};
use crate::resources::{Department, EquipmentKind, Specialty};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal four-level severity produced by the point scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl SeverityLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= CRITICAL_SCORE {
            SeverityLevel::Critical
        } else if score >= EMERGENCY_SCORE {
            SeverityLevel::High
        } else if score >= URGENT_SCORE {
            SeverityLevel::Moderate
        } else {
            SeverityLevel::Low
        }
    }

    /// Survival estimate in percent for a score at this level.
    pub fn survival_probability(self, score: u32) -> u32 {
        match self {
            SeverityLevel::Critical => 95u32.saturating_sub(score.saturating_mul(4)).max(40),
            SeverityLevel::High => 100u32.saturating_sub(score.saturating_mul(3)).max(60),
            SeverityLevel::Moderate => 100u32.saturating_sub(score.saturating_mul(2)).max(80),
            SeverityLevel::Low => 95,
        }
    }
}

/// Ordinal clinical urgency used for ranking.
///
/// `NonUrgent` is never produced by the point scale (its lowest band maps to `Standard`); it is
/// accepted from assessments supplied by collaborators, such as a re-triage override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityTier {
    Critical,
    Emergency,
    Urgent,
    Standard,
    NonUrgent,
}

impl SeverityTier {
    /// Higher is more urgent.
    pub fn acuity(self) -> u8 {
        match self {
            SeverityTier::Critical => 4,
            SeverityTier::Emergency => 3,
            SeverityTier::Urgent => 2,
            SeverityTier::Standard => 1,
            SeverityTier::NonUrgent => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityTier::Critical => "CRITICAL",
            SeverityTier::Emergency => "EMERGENCY",
            SeverityTier::Urgent => "URGENT",
            SeverityTier::Standard => "STANDARD",
            SeverityTier::NonUrgent => "NON_URGENT",
        }
    }

    /// Longest clinically safe wait before treatment starts.
    pub fn max_wait_minutes(self) -> u32 {
        match self {
            SeverityTier::Critical => 0,
            SeverityTier::Emergency => 10,
            SeverityTier::Urgent => 30,
            SeverityTier::Standard => 60,
            SeverityTier::NonUrgent => 120,
        }
    }

    pub fn default_department(self) -> Department {
        match self {
            SeverityTier::Critical => Department::Icu,
            SeverityTier::Emergency => Department::EdTrauma,
            SeverityTier::Urgent | SeverityTier::Standard => Department::EdTreatment,
            SeverityTier::NonUrgent => Department::GeneralFloor,
        }
    }
}

impl From<SeverityLevel> for SeverityTier {
    fn from(level: SeverityLevel) -> Self {
        match level {
            SeverityLevel::Critical => SeverityTier::Critical,
            SeverityLevel::High => SeverityTier::Emergency,
            SeverityLevel::Moderate => SeverityTier::Urgent,
            SeverityLevel::Low => SeverityTier::Standard,
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the symptom keyword table.
struct SymptomRule {
    keyword: &'static str,
    points: u32,
    specialists: &'static [Specialty],
    tests: &'static [&'static str],
    trauma: bool,
}

// Order matters: a symptom string scores against the first keyword it contains.
const SYMPTOM_RULES: &[SymptomRule] = &[
    SymptomRule {
        keyword: "chest pain",
        points: 3,
        specialists: &[Specialty::Cardiologist],
        tests: &["ECG", "Troponin"],
        trauma: false,
    },
    SymptomRule {
        keyword: "unresponsive",
        points: 4,
        specialists: &[],
        tests: &["CT Head", "Arterial Blood Gas", "Blood Glucose"],
        trauma: false,
    },
    SymptomRule {
        keyword: "stroke",
        points: 4,
        specialists: &[Specialty::Neurologist],
        tests: &["CT Head", "Blood Glucose"],
        trauma: false,
    },
    SymptomRule {
        keyword: "seizure",
        points: 3,
        specialists: &[Specialty::Neurologist],
        tests: &["Blood Glucose", "Electrolytes"],
        trauma: false,
    },
    SymptomRule {
        keyword: "severe bleeding",
        points: 3,
        specialists: &[Specialty::TraumaSurgeon],
        tests: &["Full Blood Count", "Type and Crossmatch"],
        trauma: true,
    },
    SymptomRule {
        keyword: "head trauma",
        points: 3,
        specialists: &[Specialty::TraumaSurgeon],
        tests: &["CT Head"],
        trauma: true,
    },
    SymptomRule {
        keyword: "difficulty breathing",
        points: 2,
        specialists: &[],
        tests: &["Chest X-Ray", "Arterial Blood Gas"],
        trauma: false,
    },
    SymptomRule {
        keyword: "altered mental",
        points: 2,
        specialists: &[],
        tests: &["Blood Glucose", "CT Head"],
        trauma: false,
    },
];

fn match_symptom(symptom: &str) -> Option<&'static SymptomRule> {
    let lower = symptom.to_lowercase();
    SYMPTOM_RULES.iter().find(|rule| lower.contains(rule.keyword))
}

fn heart_rate_critical(hr: f64) -> bool {
    hr > 130.0 || hr < 50.0
}

/// Numeric output of the point scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClinicalScore {
    pub score: u32,
    pub severity: SeverityLevel,
    /// Percent, 0-100.
    pub survival_probability: u32,
    pub risk_factors: Vec<String>,
    /// Symptom keywords that matched, one per matching symptom, in symptom order.
    pub matched_keywords: Vec<String>,
}

/// Full triage assessment of one patient.
///
/// Created once per patient per round and never mutated; a re-triage produces a new one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClinicalAssessment {
    pub patient_id: String,
    pub clinical_score: u32,
    pub severity: SeverityTier,
    pub survival_probability: u32,
    pub recommended_department: Department,
    pub required_specialists: Vec<Specialty>,
    pub required_tests: Vec<String>,
    pub required_equipment: Vec<EquipmentKind>,
    pub max_wait_time_minutes: u32,
    pub risk_factors: Vec<String>,
    pub clinical_reasoning: String,
    pub assessed_at: DateTime<Utc>,
}

impl ClinicalAssessment {
    /// Returns a copy routed to another department, for a clinician override.
    pub fn with_department(mut self, department: Department) -> Self {
        self.recommended_department = department;
        self
    }

    /// Returns a copy with a different equipment requirement.
    pub fn with_equipment(mut self, equipment: Vec<EquipmentKind>) -> Self {
        self.required_equipment = equipment;
        self
    }

    /// Every specialty that must be staffed: an ED physician and nurse, then specialists.
    pub fn required_staff(&self) -> Vec<Specialty> {
        let mut staff = vec![Specialty::EdPhysician, Specialty::EdNurse];
        for specialty in &self.required_specialists {
            if !staff.contains(specialty) {
                staff.push(*specialty);
            }
        }
        staff
    }
}

/// Aggregate counts for a triaged batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TriageSummary {
    pub total_patients: usize,
    pub critical_count: usize,
    pub emergency_count: usize,
    pub triaged_at: DateTime<Utc>,
}

/// Assessments for a whole batch, in submission order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BatchTriage {
    pub assessments: Vec<ClinicalAssessment>,
    pub summary: TriageSummary,
}

/// Clinical scoring operations.
///
/// Zero-sized namespace; all methods are associated functions.
pub struct ClinicalScorer;

impl ClinicalScorer {
    /// Scores age, vitals and symptoms on the additive point scale.
    ///
    /// Never fails: missing or non-finite vitals are replaced by heart rate 80, systolic BP 120
    /// and oxygen saturation 98%.
    pub fn score<S: AsRef<str>>(age: u32, vitals: &VitalSigns, symptoms: &[S]) -> ClinicalScore {
        let mut score = 0u32;
        let mut risk_factors = Vec::new();
        let mut matched_keywords = Vec::new();

        if age > 75 {
            score += 3;
            risk_factors.push(format!("Advanced age ({age}y)"));
        } else if age > 65 {
            score += 2;
            risk_factors.push(format!("Elderly ({age}y)"));
        } else if age < 1 {
            score += 2;
            risk_factors.push("Infant".to_string());
        }

        let hr = vitals.heart_rate_or_default();
        let bp = vitals.bp_systolic_or_default();
        let o2 = vitals.oxygen_saturation_or_default();

        if heart_rate_critical(hr) {
            score += 3;
            risk_factors.push(format!("Critical heart rate ({hr} bpm)"));
        } else if hr > 110.0 || hr < 60.0 {
            score += 2;
            risk_factors.push(format!("Abnormal heart rate ({hr} bpm)"));
        }

        if bp < 90.0 {
            score += 4;
            risk_factors.push(format!("Hypotension ({bp} mmHg)"));
        } else if bp > 180.0 {
            score += 2;
            risk_factors.push(format!("Severe hypertension ({bp} mmHg)"));
        }

        if o2 < 88.0 {
            score += 5;
            risk_factors.push(format!("Critical hypoxia ({o2}%)"));
        } else if o2 < 92.0 {
            score += 3;
            risk_factors.push(format!("Hypoxia ({o2}%)"));
        } else if o2 < 95.0 {
            score += 1;
            risk_factors.push(format!("Low oxygen ({o2}%)"));
        }

        for symptom in symptoms {
            let symptom = symptom.as_ref();
            if let Some(rule) = match_symptom(symptom) {
                score += rule.points;
                risk_factors.push(format!("Critical symptom: {symptom}"));
                matched_keywords.push(rule.keyword.to_string());
            }
        }

        let severity = SeverityLevel::from_score(score);
        ClinicalScore {
            score,
            severity,
            survival_probability: severity.survival_probability(score),
            risk_factors,
            matched_keywords,
        }
    }

    /// Produces the full assessment for one patient.
    pub fn assess(patient: &Patient) -> ClinicalAssessment {
        let scored = Self::score(patient.age, &patient.vital_signs, &patient.symptoms);
        let tier = SeverityTier::from(scored.severity);

        let rules: Vec<&SymptomRule> = scored
            .matched_keywords
            .iter()
            .filter_map(|k| SYMPTOM_RULES.iter().find(|r| r.keyword == k.as_str()))
            .collect();

        let mut department = tier.default_department();
        if matches!(tier, SeverityTier::Urgent) && rules.iter().any(|r| r.trauma) {
            department = Department::EdTrauma;
        }

        let mut required_specialists = Vec::new();
        let mut required_tests: Vec<String> = Vec::new();
        for rule in &rules {
            for specialty in rule.specialists {
                if !required_specialists.contains(specialty) {
                    required_specialists.push(*specialty);
                }
            }
            for test in rule.tests {
                if !required_tests.iter().any(|t| t == test) {
                    required_tests.push((*test).to_string());
                }
            }
        }

        let required_equipment =
            Self::equipment_for(tier, &patient.vital_signs, &scored.matched_keywords);

        let clinical_reasoning = if scored.risk_factors.is_empty() {
            format!(
                "Score {} with no risk factors; {} ({}% estimated survival)",
                scored.score, tier, scored.survival_probability
            )
        } else {
            format!(
                "Score {} from {}; {} ({}% estimated survival)",
                scored.score,
                scored.risk_factors.join("; "),
                tier,
                scored.survival_probability
            )
        };

        ClinicalAssessment {
            patient_id: patient.id.trim().to_string(),
            clinical_score: scored.score,
            severity: tier,
            survival_probability: scored.survival_probability,
            recommended_department: department,
            required_specialists,
            required_tests,
            required_equipment,
            max_wait_time_minutes: tier.max_wait_minutes(),
            risk_factors: scored.risk_factors,
            clinical_reasoning,
            assessed_at: Utc::now(),
        }
    }

    /// Assesses every patient independently, preserving submission order.
    pub fn assess_batch(patients: &[Patient]) -> BatchTriage {
        let assessments: Vec<ClinicalAssessment> = patients.iter().map(Self::assess).collect();
        let summary = TriageSummary {
            total_patients: assessments.len(),
            critical_count: assessments
                .iter()
                .filter(|a| a.severity == SeverityTier::Critical)
                .count(),
            emergency_count: assessments
                .iter()
                .filter(|a| a.severity == SeverityTier::Emergency)
                .count(),
            triaged_at: Utc::now(),
        };
        tracing::debug!(
            total = summary.total_patients,
            critical = summary.critical_count,
            emergency = summary.emergency_count,
            "triaged batch"
        );
        BatchTriage {
            assessments,
            summary,
        }
    }

    fn equipment_for(
        tier: SeverityTier,
        vitals: &VitalSigns,
        matched_keywords: &[String],
    ) -> Vec<EquipmentKind> {
        let matched = |keyword: &str| matched_keywords.iter().any(|k| k == keyword);
        let mut equipment = Vec::new();

        if vitals.oxygen_saturation_or_default() < 88.0 || matched("unresponsive") {
            equipment.push(EquipmentKind::Ventilator);
        }
        if matches!(tier, SeverityTier::Critical | SeverityTier::Emergency) || matched("chest pain")
        {
            equipment.push(EquipmentKind::CardiacMonitor);
        }
        if matched("chest pain") && heart_rate_critical(vitals.heart_rate_or_default()) {
            equipment.push(EquipmentKind::Defibrillator);
        }

        equipment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_symptoms() -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn healthy_adult_scores_zero_and_is_standard() {
        let scored = ClinicalScorer::score(30, &VitalSigns::default(), &no_symptoms());
        assert_eq!(scored.score, 0);
        assert_eq!(scored.severity, SeverityLevel::Low);
        assert_eq!(scored.survival_probability, 95);
        assert!(scored.risk_factors.is_empty());
        assert_eq!(SeverityTier::from(scored.severity), SeverityTier::Standard);
    }

    #[test]
    fn age_bands() {
        let v = VitalSigns::default();
        assert_eq!(ClinicalScorer::score(80, &v, &no_symptoms()).score, 3);
        assert_eq!(ClinicalScorer::score(76, &v, &no_symptoms()).score, 3);
        assert_eq!(ClinicalScorer::score(75, &v, &no_symptoms()).score, 2);
        assert_eq!(ClinicalScorer::score(66, &v, &no_symptoms()).score, 2);
        assert_eq!(ClinicalScorer::score(65, &v, &no_symptoms()).score, 0);
        assert_eq!(ClinicalScorer::score(0, &v, &no_symptoms()).score, 2);
    }

    #[test]
    fn heart_rate_bands_do_not_stack() {
        let score = |hr| {
            ClinicalScorer::score(30, &VitalSigns::new(hr, 120.0, 98.0), &no_symptoms()).score
        };
        assert_eq!(score(140.0), 3);
        assert_eq!(score(45.0), 3);
        assert_eq!(score(120.0), 2);
        assert_eq!(score(55.0), 2);
        assert_eq!(score(75.0), 0);
    }

    #[test]
    fn blood_pressure_and_oxygen_bands() {
        let score = |bp, o2| {
            ClinicalScorer::score(30, &VitalSigns::new(80.0, bp, o2), &no_symptoms()).score
        };
        assert_eq!(score(85.0, 98.0), 4);
        assert_eq!(score(190.0, 98.0), 2);
        assert_eq!(score(120.0, 85.0), 5);
        assert_eq!(score(120.0, 90.0), 3);
        assert_eq!(score(120.0, 94.0), 1);
        assert_eq!(score(120.0, 95.0), 0);
    }

    #[test]
    fn each_symptom_scores_its_first_matching_keyword_only() {
        // "chest pain" precedes "difficulty breathing" in the table.
        let symptoms = vec!["Chest pain with difficulty breathing".to_string()];
        let scored = ClinicalScorer::score(30, &VitalSigns::default(), &symptoms);
        assert_eq!(scored.score, 3);
        assert_eq!(scored.matched_keywords, vec!["chest pain".to_string()]);

        let symptoms = vec![
            "UNRESPONSIVE on arrival".to_string(),
            "seizure".to_string(),
            "mild headache".to_string(),
        ];
        let scored = ClinicalScorer::score(30, &VitalSigns::default(), &symptoms);
        assert_eq!(scored.score, 7);
        assert_eq!(scored.risk_factors.len(), 2);
    }

    #[test]
    fn severity_thresholds_and_survival() {
        assert_eq!(SeverityLevel::from_score(12), SeverityLevel::Critical);
        assert_eq!(SeverityLevel::from_score(11), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_score(8), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_score(7), SeverityLevel::Moderate);
        assert_eq!(SeverityLevel::from_score(5), SeverityLevel::Moderate);
        assert_eq!(SeverityLevel::from_score(4), SeverityLevel::Low);

        assert_eq!(SeverityLevel::Critical.survival_probability(12), 47);
        assert_eq!(SeverityLevel::Critical.survival_probability(20), 40);
        assert_eq!(SeverityLevel::High.survival_probability(8), 76);
        assert_eq!(SeverityLevel::High.survival_probability(11), 67);
        assert_eq!(SeverityLevel::Moderate.survival_probability(5), 90);
        assert_eq!(SeverityLevel::Moderate.survival_probability(7), 86);
        assert_eq!(SeverityLevel::Low.survival_probability(4), 95);
    }

    #[test]
    fn assess_critical_patient_recommends_icu_and_ventilator() {
        let patient = Patient::new("Maria", 80, VitalSigns::new(80.0, 120.0, 85.0))
            .with_symptoms(["unresponsive"]);
        let assessment = ClinicalScorer::assess(&patient);

        assert_eq!(assessment.clinical_score, 12);
        assert_eq!(assessment.severity, SeverityTier::Critical);
        assert_eq!(assessment.survival_probability, 47);
        assert_eq!(assessment.recommended_department, Department::Icu);
        assert_eq!(assessment.max_wait_time_minutes, 0);
        assert!(assessment.required_equipment.contains(&EquipmentKind::Ventilator));
        assert!(assessment.required_equipment.contains(&EquipmentKind::CardiacMonitor));
    }

    #[test]
    fn chest_pain_pulls_in_cardiology_and_ecg() {
        let patient = Patient::new("John", 55, VitalSigns::new(140.0, 120.0, 97.0))
            .with_symptoms(["crushing chest pain"]);
        let assessment = ClinicalScorer::assess(&patient);

        assert_eq!(assessment.clinical_score, 6);
        assert_eq!(assessment.severity, SeverityTier::Urgent);
        assert_eq!(assessment.required_specialists, vec![Specialty::Cardiologist]);
        assert!(assessment.required_tests.contains(&"ECG".to_string()));
        assert_eq!(
            assessment.required_equipment,
            vec![EquipmentKind::CardiacMonitor, EquipmentKind::Defibrillator]
        );
        assert_eq!(
            assessment.required_staff(),
            vec![
                Specialty::EdPhysician,
                Specialty::EdNurse,
                Specialty::Cardiologist
            ]
        );
    }

    #[test]
    fn urgent_trauma_goes_to_trauma_bay() {
        let patient = Patient::new("Sam", 30, VitalSigns::new(115.0, 120.0, 98.0))
            .with_symptoms(["head trauma after fall"]);
        let assessment = ClinicalScorer::assess(&patient);

        assert_eq!(assessment.clinical_score, 5);
        assert_eq!(assessment.severity, SeverityTier::Urgent);
        assert_eq!(assessment.recommended_department, Department::EdTrauma);
        assert_eq!(assessment.required_specialists, vec![Specialty::TraumaSurgeon]);
    }

    #[test]
    fn batch_summary_counts_tiers() {
        let patients = vec![
            Patient::new("A", 80, VitalSigns::new(80.0, 120.0, 85.0)).with_symptoms(["stroke"]),
            Patient::new("B", 30, VitalSigns::new(140.0, 85.0, 98.0)).with_symptoms(["seizure"]),
            Patient::new("C", 30, VitalSigns::default()),
        ];
        let batch = ClinicalScorer::assess_batch(&patients);

        assert_eq!(batch.summary.total_patients, 3);
        assert_eq!(batch.summary.critical_count, 1);
        assert_eq!(batch.summary.emergency_count, 1);
        let ids: Vec<&str> = batch.assessments.iter().map(|a| a.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    proptest! {
        #[test]
        fn prop_lower_saturation_never_lowers_score(
            age in 0u32..110,
            hr in 30.0f64..180.0,
            bp in 60.0f64..220.0,
            o2 in 70.0f64..100.0,
            drop in 0.0f64..30.0,
        ) {
            let symptoms = vec!["seizure".to_string()];
            let higher = ClinicalScorer::score(age, &VitalSigns::new(hr, bp, o2), &symptoms);
            let lower = ClinicalScorer::score(age, &VitalSigns::new(hr, bp, o2 - drop), &symptoms);
            prop_assert!(lower.score >= higher.score);
        }

        #[test]
        fn prop_crossing_65_adds_at_least_two(
            young in 1u32..=65,
            old in 66u32..110,
            o2 in 80.0f64..100.0,
        ) {
            let vitals = VitalSigns::new(80.0, 120.0, o2);
            let before = ClinicalScorer::score(young, &vitals, &no_symptoms()).score;
            let after = ClinicalScorer::score(old, &vitals, &no_symptoms()).score;
            prop_assert!(after >= before + 2);
        }

        #[test]
        fn prop_tier_is_a_function_of_score(
            a_age in 0u32..100, a_o2 in 75.0f64..100.0, a_bp in 70.0f64..200.0,
            b_age in 0u32..100, b_o2 in 75.0f64..100.0, b_bp in 70.0f64..200.0,
        ) {
            let a = Patient::new("a", a_age, VitalSigns::new(80.0, a_bp, a_o2));
            let b = Patient::new("b", b_age, VitalSigns::new(80.0, b_bp, b_o2));
            let a = ClinicalScorer::assess(&a);
            let b = ClinicalScorer::assess(&b);
            if a.clinical_score == b.clinical_score {
                prop_assert_eq!(a.severity, b.severity);
                prop_assert_eq!(a.survival_probability, b.survival_probability);
            }
        }
    }
}
