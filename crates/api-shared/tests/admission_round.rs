use api_shared::{AdmissionReq, AdmissionService};
use medflow_core::{
    AllocationStatus, CapacityStatus, Department, HospitalStateStore, InventoryConfig, QueryFilter,
    SeverityTier,
};
use std::sync::Arc;

const BATCH: &str = r#"{
  "patients": [
    {
      "id": "John",
      "age": 45,
      "vital_signs": {"heart_rate": 88, "bp_systolic": 130, "oxygen_saturation": 97},
      "symptoms": ["chest pain"]
    },
    {
      "id": "Maria",
      "age": 80,
      "vital_signs": {"heart_rate": 120, "bp_systolic": 85, "oxygen_saturation": 85},
      "symptoms": ["unresponsive"],
      "medical_history": ["COPD"]
    },
    {
      "id": "Ana",
      "age": 30
    }
  ]
}"#;

fn service() -> AdmissionService {
    let store = HospitalStateStore::new(&InventoryConfig::default()).expect("inventory");
    AdmissionService::new(Arc::new(store))
}

#[test]
fn full_round_ranks_and_allocates_a_json_batch() {
    let service = service();
    let req: AdmissionReq = serde_json::from_str(BATCH).expect("batch json");

    let res = service.admit(&req.patients).expect("round");

    assert_eq!(res.triage.summary.total_patients, 3);
    assert_eq!(res.triage.summary.critical_count, 1);
    let ranked: Vec<&str> = res.order.patient_ids().collect();
    assert_eq!(ranked[0], "Maria");
    assert_eq!(res.order.entries[0].priority, SeverityTier::Critical);

    let maria = res.allocation.result_for("Maria").expect("Maria");
    assert_eq!(maria.status, AllocationStatus::Admitted);
    assert_eq!(
        maria.bed.as_ref().map(|b| b.department),
        Some(Department::Icu)
    );

    let john = res.allocation.result_for("John").expect("John");
    assert!(john
        .assigned_staff
        .iter()
        .any(|s| s.staff_id == "dr-patel"));

    assert!(res.allocation.waiting_patients.is_empty());
    assert_eq!(res.allocation.results.len(), 3);
}

#[test]
fn later_waves_see_capacity_taken_by_earlier_ones() {
    let service = service();
    let req: AdmissionReq = serde_json::from_str(BATCH).expect("batch json");
    service.admit(&req.patients).expect("first wave");

    let snapshot = service.snapshot(QueryFilter::BedsOnly);
    let beds = snapshot.beds.expect("bed section");
    assert_eq!(beds.icu_occupancy_rate, 75.0);
    assert_eq!(snapshot.capacity_status, CapacityStatus::Stressed);

    let conflicts = service.conflicts();
    assert!(conflicts.detected);
    assert!(conflicts.requires_intervention);
}

#[test]
fn admission_response_serialises_to_json() {
    let service = service();
    let req: AdmissionReq = serde_json::from_str(BATCH).expect("batch json");
    let res = service.admit(&req.patients).expect("round");

    let json = serde_json::to_value(&res).expect("serialise");
    assert_eq!(json["order"]["entries"][0]["patient_id"], "Maria");
    assert_eq!(json["allocation"]["results"][0]["status"], "ADMITTED");
    assert_eq!(json["triage"]["assessments"][1]["severity"], "CRITICAL");
}
