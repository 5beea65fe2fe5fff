use medflow_core::{
    ClinicalAssessment, ClinicalScorer, Department, EquipmentKind, HospitalStateStore,
    InventoryConfig, Patient, PriorityRanker, ResourceAllocator, StoreError, VitalSigns,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn default_store() -> Arc<HospitalStateStore> {
    Arc::new(HospitalStateStore::new(&InventoryConfig::default()).expect("inventory"))
}

#[test]
fn concurrent_reservations_of_one_bed_have_exactly_one_winner() {
    let store = default_store();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.reserve_bed("ICU-3", &format!("patient-{i}")))
        })
        .collect();

    let outcomes: Vec<Result<_, StoreError>> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    let winners: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    let holder = winners[0].patient_id.clone();

    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert_eq!(
                err,
                &StoreError::AlreadyReserved {
                    bed_id: "ICU-3".into(),
                    holder: holder.clone()
                }
            );
        }
    }
}

#[test]
fn concurrent_equipment_reservations_never_overdraw_the_pool() {
    let store = default_store();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.reserve_equipment(EquipmentKind::Defibrillator, 1).is_ok())
        })
        .collect();

    let granted = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .filter(|ok| *ok)
        .count();

    assert_eq!(granted, 6);
    let status = store
        .query_equipment(EquipmentKind::Defibrillator)
        .expect("pool");
    assert_eq!(status.available, 0);
    assert_eq!(status.in_use, status.total);
}

fn critical_batch(prefix: &str) -> Vec<ClinicalAssessment> {
    (0..3)
        .map(|i| {
            let vitals = VitalSigns::new(80.0, 120.0, 85.0);
            let patient =
                Patient::new(format!("{prefix}-{i}"), 80, vitals).with_symptoms(["unresponsive"]);
            ClinicalScorer::assess(&patient)
        })
        .collect()
}

#[test]
fn overlapping_batches_never_share_a_bed() {
    let store = default_store();

    let handles: Vec<_> = ["wave-a", "wave-b"]
        .into_iter()
        .map(|prefix| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let batch = critical_batch(prefix);
                let order = PriorityRanker::rank(&batch, None);
                ResourceAllocator::allocate(&order, &batch, &store).expect("allocation")
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    let mut beds = HashSet::new();
    for result in results.iter().flat_map(|batch| batch.results.iter()) {
        if let Some(bed_id) = result.bed.as_ref().and_then(|b| b.bed_id.clone()) {
            assert!(beds.insert(bed_id.clone()), "{bed_id} assigned twice");
        }
    }

    // Two free ICU beds and two free trauma bays.
    assert!(beds.len() <= 4);
    let icu = store.query_beds(Department::Icu);
    let trauma = store.query_beds(Department::EdTrauma);
    assert_eq!(
        icu.reserved_beds.len() + trauma.reserved_beds.len(),
        beds.len()
    );
}
