//! Hospital state store.
//!
//! The single source of truth for bed states, staff workload and equipment pools. All state
//! sits behind one store-wide [`RwLock`]:
//! - every mutation takes the write lock, re-checks the current state and either applies the
//!   whole change or returns a [`StoreError`] without touching anything,
//! - every query takes the read lock and returns an owned copy, so a caller never sees a
//!   partially applied mutation and never holds the lock after returning.
//!
//! Nothing here waits for a resource to free up. Unavailability is reported immediately.
//!
//! Bed lifecycle: `available -> reserved -> occupied -> available`. This store only performs
//! `available -> reserved` and the release back to `available`; occupied beds come from the
//! starting inventory.

use crate::config::{BedStatus, InventoryConfig};
use crate::error::{StoreError, TriageResult};
use crate::resources::{Department, EquipmentKind, ResourceKind, Specialty};
use crate::snapshot::{CapacityView, HospitalSnapshot, QueryFilter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone, Debug)]
struct BedRecord {
    id: String,
    department: Department,
    status: BedStatus,
    patient: Option<String>,
    reserved_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug)]
struct Pool {
    available: u32,
    total: u32,
}

#[derive(Clone, Debug)]
struct Inventory {
    beds: Vec<BedRecord>,
    rooms: BTreeMap<Department, Pool>,
    staff: Vec<StaffMember>,
    equipment: BTreeMap<EquipmentKind, Pool>,
}

/// Availability of one department's beds or rooms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BedAvailability {
    pub department: Department,
    /// Free bed ids; always empty for pooled departments.
    pub available_beds: Vec<String>,
    pub reserved_beds: Vec<String>,
    pub occupied_beds: Vec<String>,
    pub available_count: u32,
    pub total_beds: u32,
    /// Percentage of beds that are reserved or occupied.
    pub occupancy_rate: f64,
    pub estimated_wait_minutes: u32,
}

/// A staff member as currently recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub specialty: Specialty,
    pub current_load: u32,
    pub available: bool,
}

/// Staff of one specialty in selection order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StaffAvailability {
    pub specialty: Specialty,
    /// Available members only; load-balanced roles are ordered least loaded first.
    pub available_staff: Vec<StaffMember>,
    pub total_count: usize,
    pub least_busy: Option<StaffMember>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EquipmentState {
    Available,
    AllInUse,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EquipmentStatus {
    pub equipment_type: EquipmentKind,
    pub available: u32,
    pub total: u32,
    pub in_use: u32,
    pub utilization_rate: f64,
    pub status: EquipmentState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BedReservation {
    pub bed_id: String,
    pub department: Department,
    pub patient_id: String,
    pub reserved_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StaffAssignment {
    pub staff_id: String,
    pub name: String,
    pub specialty: Specialty,
    pub patient_id: String,
    pub new_load: u32,
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

impl Inventory {
    fn from_config(config: &InventoryConfig) -> Self {
        let mut beds = Vec::new();
        for department in [Department::Icu, Department::EdTrauma] {
            for bed in config.beds(department) {
                beds.push(BedRecord {
                    id: bed.id.clone(),
                    department,
                    status: bed.status,
                    patient: bed.patient.clone(),
                    reserved_at: None,
                });
            }
        }

        let mut rooms = BTreeMap::new();
        for department in [Department::EdTreatment, Department::GeneralFloor] {
            if let Some(pool) = config.room_pool(department) {
                rooms.insert(
                    department,
                    Pool {
                        available: pool.available,
                        total: pool.total,
                    },
                );
            }
        }

        let staff = config
            .staff
            .iter()
            .map(|s| StaffMember {
                id: s.id.clone(),
                name: s.name.clone(),
                specialty: s.specialty,
                current_load: s.current_load,
                available: s.available,
            })
            .collect();

        let equipment = config
            .equipment
            .iter()
            .map(|(kind, pool)| {
                (
                    *kind,
                    Pool {
                        available: pool.available,
                        total: pool.total,
                    },
                )
            })
            .collect();

        Self {
            beds,
            rooms,
            staff,
            equipment,
        }
    }

    fn beds_in(&self, department: Department) -> BedAvailability {
        if let Some(pool) = self.rooms.get(&department) {
            return BedAvailability {
                department,
                available_beds: Vec::new(),
                reserved_beds: Vec::new(),
                occupied_beds: Vec::new(),
                available_count: pool.available,
                total_beds: pool.total,
                occupancy_rate: percent(pool.total - pool.available, pool.total),
                estimated_wait_minutes: if pool.available > 0 {
                    0
                } else {
                    department.wait_minutes_when_full()
                },
            };
        }

        let mut available = Vec::new();
        let mut reserved = Vec::new();
        let mut occupied = Vec::new();
        for bed in self.beds.iter().filter(|b| b.department == department) {
            match bed.status {
                BedStatus::Available => available.push(bed.id.clone()),
                BedStatus::Reserved => reserved.push(bed.id.clone()),
                BedStatus::Occupied => occupied.push(bed.id.clone()),
            }
        }
        let total = (available.len() + reserved.len() + occupied.len()) as u32;
        let available_count = available.len() as u32;

        BedAvailability {
            department,
            estimated_wait_minutes: if available.is_empty() {
                department.wait_minutes_when_full()
            } else {
                0
            },
            available_beds: available,
            reserved_beds: reserved,
            occupied_beds: occupied,
            available_count,
            total_beds: total,
            occupancy_rate: percent(total - available_count, total),
        }
    }

    fn staff_of(&self, specialty: Specialty) -> StaffAvailability {
        let mut members: Vec<StaffMember> = self
            .staff
            .iter()
            .filter(|s| s.specialty == specialty && s.available)
            .cloned()
            .collect();

        if specialty.is_load_balanced() {
            // Stable sort keeps roster order between equally loaded members.
            members.sort_by_key(|s| s.current_load);
        }

        StaffAvailability {
            specialty,
            total_count: members.len(),
            least_busy: members.first().cloned(),
            available_staff: members,
        }
    }

    fn equipment_of(&self, kind: EquipmentKind) -> Option<EquipmentStatus> {
        self.equipment.get(&kind).map(|pool| EquipmentStatus {
            equipment_type: kind,
            available: pool.available,
            total: pool.total,
            in_use: pool.total - pool.available,
            utilization_rate: percent(pool.total - pool.available, pool.total),
            status: if pool.available > 0 {
                EquipmentState::Available
            } else {
                EquipmentState::AllInUse
            },
        })
    }

    fn capacity(&self) -> CapacityView {
        CapacityView {
            taken_at: Utc::now(),
            departments: Department::ALL.iter().map(|d| self.beds_in(*d)).collect(),
            staff: self.staff.clone(),
            equipment: EquipmentKind::ALL
                .iter()
                .filter_map(|k| self.equipment_of(*k))
                .collect(),
        }
    }
}

/// Process-wide inventory of beds, staff and equipment.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct HospitalStateStore {
    inner: RwLock<Inventory>,
}

impl HospitalStateStore {
    /// Builds a store from a validated inventory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TriageError::InvalidInventory`] if the inventory fails validation. This
    /// is the fail-fast startup check: no store exists for an invalid inventory.
    pub fn new(config: &InventoryConfig) -> TriageResult<Self> {
        config.validate()?;
        tracing::info!(
            beds = config.icu_beds.len() + config.trauma_bays.len(),
            staff = config.staff.len(),
            "hospital state store initialised"
        );
        Ok(Self {
            inner: RwLock::new(Inventory::from_config(config)),
        })
    }

    // Mutations validate before writing, so a poisoned lock still guards consistent state.
    fn read(&self) -> RwLockReadGuard<'_, Inventory> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inventory> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn query_beds(&self, department: Department) -> BedAvailability {
        self.read().beds_in(department)
    }

    pub fn query_staff(&self, specialty: Specialty) -> StaffAvailability {
        self.read().staff_of(specialty)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the equipment type has no pool.
    pub fn query_equipment(&self, kind: EquipmentKind) -> Result<EquipmentStatus, StoreError> {
        self.read()
            .equipment_of(kind)
            .ok_or_else(|| StoreError::NotFound {
                kind: ResourceKind::Equipment,
                id: kind.to_string(),
            })
    }

    /// Point-in-time copy of every department, staff member and equipment pool, taken under a
    /// single read lock.
    pub fn capacity(&self) -> CapacityView {
        self.read().capacity()
    }

    /// Filtered status snapshot for reporting collaborators.
    pub fn snapshot(&self, filter: QueryFilter) -> HospitalSnapshot {
        HospitalSnapshot::from_capacity(filter, &self.capacity())
    }

    /// Reserves a named bed for a patient (`available -> reserved`).
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no bed has this id.
    /// - [`StoreError::AlreadyReserved`] if another patient holds the reservation.
    /// - [`StoreError::NotAvailable`] if the bed is occupied.
    pub fn reserve_bed(
        &self,
        bed_id: &str,
        patient_id: &str,
    ) -> Result<BedReservation, StoreError> {
        let mut inventory = self.write();
        let bed = inventory
            .beds
            .iter_mut()
            .find(|b| b.id == bed_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: ResourceKind::Bed,
                id: bed_id.to_string(),
            })?;

        match bed.status {
            BedStatus::Available => {
                let now = Utc::now();
                bed.status = BedStatus::Reserved;
                bed.patient = Some(patient_id.to_string());
                bed.reserved_at = Some(now);
                tracing::debug!(bed_id, patient_id, department = %bed.department, "bed reserved");
                Ok(BedReservation {
                    bed_id: bed.id.clone(),
                    department: bed.department,
                    patient_id: patient_id.to_string(),
                    reserved_at: now,
                })
            }
            BedStatus::Reserved => Err(StoreError::AlreadyReserved {
                bed_id: bed.id.clone(),
                holder: bed.patient.clone().unwrap_or_default(),
            }),
            BedStatus::Occupied => Err(StoreError::NotAvailable {
                bed_id: bed.id.clone(),
                state: bed.status.as_str().to_string(),
            }),
        }
    }

    /// Returns a reserved or occupied bed to `available` and reports who held it.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no bed has this id.
    /// - [`StoreError::NotHeld`] if the bed is already available.
    pub fn release_bed(&self, bed_id: &str) -> Result<String, StoreError> {
        let mut inventory = self.write();
        let bed = inventory
            .beds
            .iter_mut()
            .find(|b| b.id == bed_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: ResourceKind::Bed,
                id: bed_id.to_string(),
            })?;

        if bed.status == BedStatus::Available {
            return Err(StoreError::NotHeld {
                bed_id: bed_id.to_string(),
            });
        }

        bed.status = BedStatus::Available;
        bed.reserved_at = None;
        let holder = bed.patient.take().unwrap_or_default();
        tracing::debug!(bed_id, holder = %holder, "bed released");
        Ok(holder)
    }

    /// Takes one room from a pooled department and returns how many remain.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the department has named beds rather than a room pool.
    /// - [`StoreError::Insufficient`] if no room is free.
    pub fn reserve_room(
        &self,
        department: Department,
        patient_id: &str,
    ) -> Result<u32, StoreError> {
        let mut inventory = self.write();
        let pool = room_pool_mut(&mut inventory, department)?;
        if pool.available == 0 {
            return Err(StoreError::Insufficient {
                resource: department.to_string(),
                requested: 1,
                available: 0,
            });
        }
        pool.available -= 1;
        tracing::debug!(%department, patient_id, remaining = pool.available, "room reserved");
        Ok(pool.available)
    }

    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the department has no room pool.
    /// - [`StoreError::ExceedsTotal`] if the release would push `available` above `total`.
    pub fn release_room(&self, department: Department, quantity: u32) -> Result<u32, StoreError> {
        let mut inventory = self.write();
        let pool = room_pool_mut(&mut inventory, department)?;
        release_into(pool, quantity, department.as_str())
    }

    /// Takes `quantity` units from an equipment pool and returns how many remain.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the equipment type has no pool.
    /// - [`StoreError::Insufficient`] if fewer than `quantity` units are free; nothing is taken.
    pub fn reserve_equipment(&self, kind: EquipmentKind, quantity: u32) -> Result<u32, StoreError> {
        let mut inventory = self.write();
        let pool = equipment_pool_mut(&mut inventory, kind)?;
        if pool.available < quantity {
            return Err(StoreError::Insufficient {
                resource: kind.to_string(),
                requested: quantity,
                available: pool.available,
            });
        }
        pool.available -= quantity;
        tracing::debug!(
            equipment = %kind,
            quantity,
            remaining = pool.available,
            "equipment reserved"
        );
        Ok(pool.available)
    }

    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the equipment type has no pool.
    /// - [`StoreError::ExceedsTotal`] if the release would push `available` above `total`.
    pub fn release_equipment(&self, kind: EquipmentKind, quantity: u32) -> Result<u32, StoreError> {
        let mut inventory = self.write();
        let pool = equipment_pool_mut(&mut inventory, kind)?;
        release_into(pool, quantity, kind.as_str())
    }

    /// Assigns a staff member to a patient.
    ///
    /// Load-balanced roles gain one patient on their load counter. On-call specialists also
    /// become unavailable until released.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no staff member has this id.
    /// - [`StoreError::StaffUnavailable`] if a specialist was already taken.
    pub fn assign_staff(
        &self,
        staff_id: &str,
        patient_id: &str,
    ) -> Result<StaffAssignment, StoreError> {
        let mut inventory = self.write();
        let member = staff_mut(&mut inventory, staff_id)?;

        if !member.available {
            return Err(StoreError::StaffUnavailable {
                staff_id: staff_id.to_string(),
            });
        }

        member.current_load += 1;
        if !member.specialty.is_load_balanced() {
            member.available = false;
        }
        tracing::debug!(staff_id, patient_id, load = member.current_load, "staff assigned");

        Ok(StaffAssignment {
            staff_id: member.id.clone(),
            name: member.name.clone(),
            specialty: member.specialty,
            patient_id: patient_id.to_string(),
            new_load: member.current_load,
        })
    }

    /// Removes one patient from a staff member's load and frees an on-call specialist.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no staff member has this id.
    /// - [`StoreError::NotAssigned`] if the staff member has no patients to release.
    pub fn release_staff(&self, staff_id: &str) -> Result<u32, StoreError> {
        let mut inventory = self.write();
        let member = staff_mut(&mut inventory, staff_id)?;

        if member.current_load == 0 && member.available {
            return Err(StoreError::NotAssigned {
                staff_id: staff_id.to_string(),
            });
        }

        member.current_load = member.current_load.saturating_sub(1);
        if !member.specialty.is_load_balanced() {
            member.available = true;
        }
        tracing::debug!(staff_id, load = member.current_load, "staff released");
        Ok(member.current_load)
    }
}

fn room_pool_mut(
    inventory: &mut Inventory,
    department: Department,
) -> Result<&mut Pool, StoreError> {
    inventory
        .rooms
        .get_mut(&department)
        .ok_or_else(|| StoreError::NotFound {
            kind: ResourceKind::Department,
            id: format!("{department} room pool"),
        })
}

fn equipment_pool_mut(
    inventory: &mut Inventory,
    kind: EquipmentKind,
) -> Result<&mut Pool, StoreError> {
    inventory
        .equipment
        .get_mut(&kind)
        .ok_or_else(|| StoreError::NotFound {
            kind: ResourceKind::Equipment,
            id: kind.to_string(),
        })
}

fn staff_mut<'a>(
    inventory: &'a mut Inventory,
    staff_id: &str,
) -> Result<&'a mut StaffMember, StoreError> {
    inventory
        .staff
        .iter_mut()
        .find(|s| s.id == staff_id)
        .ok_or_else(|| StoreError::NotFound {
            kind: ResourceKind::Staff,
            id: staff_id.to_string(),
        })
}

fn release_into(pool: &mut Pool, quantity: u32, name: &str) -> Result<u32, StoreError> {
    match pool.available.checked_add(quantity) {
        Some(next) if next <= pool.total => {
            pool.available = next;
            tracing::debug!(resource = name, quantity, available = next, "pool released");
            Ok(next)
        }
        _ => Err(StoreError::ExceedsTotal {
            resource: name.to_string(),
            total: pool.total,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TriageError;
    use proptest::prelude::*;

    fn store() -> HospitalStateStore {
        HospitalStateStore::new(&InventoryConfig::default()).expect("default inventory")
    }

    #[test]
    fn new_rejects_invalid_inventory() {
        let mut config = InventoryConfig::default();
        config.trauma_bays.clear();
        let err = HospitalStateStore::new(&config).expect_err("should fail fast");
        assert!(matches!(err, TriageError::InvalidInventory(_)));
    }

    #[test]
    fn query_beds_reports_named_beds() {
        let icu = store().query_beds(Department::Icu);
        assert_eq!(icu.available_beds, vec!["ICU-3", "ICU-4"]);
        assert_eq!(icu.occupied_beds, vec!["ICU-1", "ICU-2"]);
        assert_eq!(icu.total_beds, 4);
        assert_eq!(icu.occupancy_rate, 50.0);
        assert_eq!(icu.estimated_wait_minutes, 0);
    }

    #[test]
    fn query_beds_reports_room_pools() {
        let rooms = store().query_beds(Department::EdTreatment);
        assert!(rooms.available_beds.is_empty());
        assert_eq!(rooms.available_count, 5);
        assert_eq!(rooms.total_beds, 15);
    }

    #[test]
    fn reserve_bed_transitions_and_rejects_second_reservation() {
        let store = store();
        let reservation = store.reserve_bed("ICU-3", "Maria").expect("reserve");
        assert_eq!(reservation.department, Department::Icu);

        let err = store.reserve_bed("ICU-3", "John").expect_err("already reserved");
        assert_eq!(
            err,
            StoreError::AlreadyReserved {
                bed_id: "ICU-3".into(),
                holder: "Maria".into()
            }
        );

        let icu = store.query_beds(Department::Icu);
        assert_eq!(icu.reserved_beds, vec!["ICU-3"]);
        assert_eq!(icu.available_beds, vec!["ICU-4"]);
    }

    #[test]
    fn reserve_bed_reports_occupied_and_unknown_beds() {
        let store = store();
        let err = store.reserve_bed("ICU-1", "Maria").expect_err("occupied");
        assert!(matches!(err, StoreError::NotAvailable { ref state, .. } if state == "occupied"));

        let err = store.reserve_bed("ICU-99", "Maria").expect_err("unknown");
        assert!(matches!(err, StoreError::NotFound { kind: ResourceKind::Bed, .. }));
    }

    #[test]
    fn release_bed_returns_holder_and_frees_bed() {
        let store = store();
        store.reserve_bed("TB-2", "Sam").expect("reserve");
        assert_eq!(store.release_bed("TB-2").expect("release"), "Sam");
        assert_eq!(
            store.release_bed("TB-2").expect_err("already free"),
            StoreError::NotHeld {
                bed_id: "TB-2".into()
            }
        );
        store.reserve_bed("TB-2", "Alex").expect("bed is reusable");
    }

    #[test]
    fn rooms_cannot_go_negative_or_exceed_total() {
        let store = store();
        for _ in 0..5 {
            store.reserve_room(Department::EdTreatment, "p").expect("room");
        }
        let err = store
            .reserve_room(Department::EdTreatment, "p")
            .expect_err("exhausted");
        assert!(matches!(err, StoreError::Insufficient { available: 0, .. }));

        assert_eq!(store.release_room(Department::EdTreatment, 15).expect("release"), 15);
        let err = store
            .release_room(Department::EdTreatment, 1)
            .expect_err("over total");
        assert!(matches!(err, StoreError::ExceedsTotal { total: 15, .. }));

        let err = store.reserve_room(Department::Icu, "p").expect_err("not pooled");
        assert!(matches!(err, StoreError::NotFound { kind: ResourceKind::Department, .. }));
    }

    #[test]
    fn equipment_reservation_is_all_or_nothing() {
        let store = store();
        let err = store
            .reserve_equipment(EquipmentKind::Ventilator, 3)
            .expect_err("only two available");
        assert_eq!(
            err,
            StoreError::Insufficient {
                resource: "ventilators".into(),
                requested: 3,
                available: 2
            }
        );
        assert_eq!(
            store.query_equipment(EquipmentKind::Ventilator).unwrap().available,
            2
        );

        assert_eq!(store.reserve_equipment(EquipmentKind::Ventilator, 2).unwrap(), 0);
        let status = store.query_equipment(EquipmentKind::Ventilator).unwrap();
        assert_eq!(status.status, EquipmentState::AllInUse);
        assert_eq!(status.in_use, 7);
    }

    #[test]
    fn query_staff_orders_by_load_and_filters_specialists() {
        let store = store();
        let nurses = store.query_staff(Specialty::EdNurse);
        let names: Vec<&str> = nurses.available_staff.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["RN Davis", "RN Williams", "RN Johnson"]);
        assert_eq!(nurses.least_busy.unwrap().id, "rn-davis");

        store.assign_staff("dr-patel", "John").expect("assign");
        let cardiologists = store.query_staff(Specialty::Cardiologist);
        assert_eq!(cardiologists.total_count, 0);
        assert!(cardiologists.least_busy.is_none());
    }

    #[test]
    fn query_staff_skips_unavailable_physicians() {
        let mut config = InventoryConfig::default();
        for member in &mut config.staff {
            if member.id == "dr-jones" {
                member.available = false;
            }
        }
        let store = HospitalStateStore::new(&config).expect("inventory");

        let physicians = store.query_staff(Specialty::EdPhysician);
        assert_eq!(physicians.total_count, 1);
        assert_eq!(physicians.least_busy.expect("dr-smith").id, "dr-smith");
    }

    #[test]
    fn assign_staff_updates_load_and_availability() {
        let store = store();
        let assignment = store.assign_staff("dr-jones", "Maria").expect("assign");
        assert_eq!(assignment.new_load, 3);

        store.assign_staff("dr-martinez", "Sam").expect("assign specialist");
        let err = store
            .assign_staff("dr-martinez", "Alex")
            .expect_err("specialist busy");
        assert!(matches!(err, StoreError::StaffUnavailable { .. }));

        let err = store.assign_staff("dr-nobody", "Alex").expect_err("unknown");
        assert!(matches!(err, StoreError::NotFound { kind: ResourceKind::Staff, .. }));

        assert_eq!(store.release_staff("dr-martinez").expect("release"), 0);
        store.assign_staff("dr-martinez", "Alex").expect("available again");
    }

    #[test]
    fn release_staff_rejects_idle_members() {
        let store = store();
        let err = store.release_staff("dr-okafor").expect_err("nothing to release");
        assert!(matches!(err, StoreError::NotAssigned { .. }));
    }

    #[derive(Debug, Clone)]
    enum PoolOp {
        Reserve(u32),
        Release(u32),
    }

    fn pool_op() -> impl Strategy<Value = PoolOp> {
        prop_oneof![
            (0u32..5).prop_map(PoolOp::Reserve),
            (0u32..5).prop_map(PoolOp::Release),
        ]
    }

    proptest! {
        #[test]
        fn prop_equipment_pool_stays_within_bounds(
            ops in proptest::collection::vec(pool_op(), 0..60),
        ) {
            let store = store();
            for op in ops {
                let _ = match op {
                    PoolOp::Reserve(n) => store.reserve_equipment(EquipmentKind::Defibrillator, n),
                    PoolOp::Release(n) => store.release_equipment(EquipmentKind::Defibrillator, n),
                };
                let status = store.query_equipment(EquipmentKind::Defibrillator).unwrap();
                prop_assert!(status.available <= status.total);
                prop_assert_eq!(status.total, 8);
            }
        }

        #[test]
        fn prop_a_bed_has_at_most_one_holder(
            attempts in proptest::collection::vec((0usize..4, 0usize..6, any::<bool>()), 0..40)
        ) {
            let store = store();
            let beds = ["ICU-3", "ICU-4", "TB-2", "TB-3"];
            let mut holders: BTreeMap<&str, String> = BTreeMap::new();
            for (bed, patient, release) in attempts {
                let bed_id = beds[bed];
                if release {
                    if store.release_bed(bed_id).is_ok() {
                        holders.remove(bed_id);
                    }
                } else {
                    let patient_id = format!("P{patient}");
                    match store.reserve_bed(bed_id, &patient_id) {
                        Ok(_) => {
                            prop_assert!(!holders.contains_key(bed_id));
                            holders.insert(bed_id, patient_id);
                        }
                        Err(StoreError::AlreadyReserved { holder, .. }) => {
                            prop_assert_eq!(Some(&holder), holders.get(bed_id));
                        }
                        Err(other) => prop_assert!(false, "unexpected error {other:?}"),
                    }
                }
            }
        }
    }
}
