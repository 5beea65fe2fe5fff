//! Hospital inventory configuration.
//!
//! The inventory is resolved once at process startup and handed to
//! [`crate::store::HospitalStateStore::new`]. It is the only fatal configuration in the core:
//! an inventory that fails [`InventoryConfig::validate`] stops the process before any patient
//! is processed.

use crate::error::{TriageError, TriageResult};
use crate::resources::{Department, EquipmentKind, Specialty};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// State of an individually identified bed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BedStatus {
    Available,
    Reserved,
    Occupied,
}

impl BedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BedStatus::Available => "available",
            BedStatus::Reserved => "reserved",
            BedStatus::Occupied => "occupied",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedConfig {
    pub id: String,
    #[serde(default = "default_bed_status")]
    pub status: BedStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
}

fn default_bed_status() -> BedStatus {
    BedStatus::Available
}

/// A countable, identity-less inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub available: u32,
    pub total: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffConfig {
    pub id: String,
    pub name: String,
    pub specialty: Specialty,
    #[serde(default)]
    pub current_load: u32,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Complete starting inventory of the hospital.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryConfig {
    pub icu_beds: Vec<BedConfig>,
    pub trauma_bays: Vec<BedConfig>,
    pub ed_treatment_rooms: PoolConfig,
    pub general_floor: PoolConfig,
    pub staff: Vec<StaffConfig>,
    pub equipment: BTreeMap<EquipmentKind, PoolConfig>,
}

impl InventoryConfig {
    /// Reads, parses and validates an inventory YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InventoryRead`] or [`TriageError::InventoryParse`] if the file
    /// cannot be read or parsed, and [`TriageError::InvalidInventory`] if it fails validation.
    pub fn load(path: &Path) -> TriageResult<Self> {
        let text = std::fs::read_to_string(path).map_err(TriageError::InventoryRead)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> TriageResult<Self> {
        let config: Self = serde_yaml::from_str(text).map_err(TriageError::InventoryParse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> TriageResult<String> {
        serde_yaml::to_string(self).map_err(TriageError::InventorySerialise)
    }

    pub fn beds(&self, department: Department) -> &[BedConfig] {
        match department {
            Department::Icu => &self.icu_beds,
            Department::EdTrauma => &self.trauma_bays,
            Department::EdTreatment | Department::GeneralFloor => &[],
        }
    }

    pub fn room_pool(&self, department: Department) -> Option<PoolConfig> {
        match department {
            Department::EdTreatment => Some(self.ed_treatment_rooms),
            Department::GeneralFloor => Some(self.general_floor),
            Department::Icu | Department::EdTrauma => None,
        }
    }

    /// Checks the inventory is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInventory`] if:
    /// - any department has zero beds or rooms in total,
    /// - a bed or staff id is empty or duplicated,
    /// - a bed's holder does not agree with its status,
    /// - a pool's `available` exceeds its `total`,
    /// - an equipment type is missing,
    /// - a staff member has an empty name.
    pub fn validate(&self) -> TriageResult<()> {
        let mut bed_ids = HashSet::new();
        for department in [Department::Icu, Department::EdTrauma] {
            let beds = self.beds(department);
            if beds.is_empty() {
                return Err(TriageError::InvalidInventory(format!(
                    "{department} has zero beds configured"
                )));
            }
            for bed in beds {
                if bed.id.trim().is_empty() {
                    return Err(TriageError::InvalidInventory(format!(
                        "{department} has a bed with an empty id"
                    )));
                }
                if !bed_ids.insert(bed.id.as_str()) {
                    return Err(TriageError::InvalidInventory(format!(
                        "duplicate bed id: {}",
                        bed.id
                    )));
                }
                match (bed.status, bed.patient.as_deref()) {
                    (BedStatus::Available, Some(holder)) => {
                        return Err(TriageError::InvalidInventory(format!(
                            "bed {} is available but held by {holder}",
                            bed.id
                        )));
                    }
                    (BedStatus::Reserved | BedStatus::Occupied, None) => {
                        return Err(TriageError::InvalidInventory(format!(
                            "bed {} is {} but has no patient",
                            bed.id,
                            bed.status.as_str()
                        )));
                    }
                    _ => {}
                }
            }
        }

        for department in [Department::EdTreatment, Department::GeneralFloor] {
            if let Some(pool) = self.room_pool(department) {
                validate_pool(department.as_str(), pool)?;
                if pool.total == 0 {
                    return Err(TriageError::InvalidInventory(format!(
                        "{department} has zero rooms configured"
                    )));
                }
            }
        }

        for kind in EquipmentKind::ALL {
            match self.equipment.get(&kind) {
                Some(pool) => validate_pool(kind.as_str(), *pool)?,
                None => {
                    return Err(TriageError::InvalidInventory(format!(
                        "equipment pool missing: {kind}"
                    )));
                }
            }
        }

        let mut staff_ids = HashSet::new();
        for member in &self.staff {
            if member.id.trim().is_empty() || member.name.trim().is_empty() {
                return Err(TriageError::InvalidInventory(
                    "staff members need a non-empty id and name".into(),
                ));
            }
            if !staff_ids.insert(member.id.as_str()) {
                return Err(TriageError::InvalidInventory(format!(
                    "duplicate staff id: {}",
                    member.id
                )));
            }
        }

        Ok(())
    }
}

fn validate_pool(name: &str, pool: PoolConfig) -> TriageResult<()> {
    if pool.available > pool.total {
        return Err(TriageError::InvalidInventory(format!(
            "{name}: available ({}) exceeds total ({})",
            pool.available, pool.total
        )));
    }
    Ok(())
}

fn bed(id: &str, holder: Option<&str>) -> BedConfig {
    BedConfig {
        id: id.to_string(),
        status: if holder.is_some() {
            BedStatus::Occupied
        } else {
            BedStatus::Available
        },
        patient: holder.map(str::to_string),
    }
}

fn staff(id: &str, name: &str, specialty: Specialty, current_load: u32) -> StaffConfig {
    StaffConfig {
        id: id.to_string(),
        name: name.to_string(),
        specialty,
        current_load,
        available: true,
    }
}

impl Default for InventoryConfig {
    /// The reference hospital used when no inventory file is configured.
    fn default() -> Self {
        let mut equipment = BTreeMap::new();
        equipment.insert(
            EquipmentKind::Ventilator,
            PoolConfig {
                available: 2,
                total: 7,
            },
        );
        equipment.insert(
            EquipmentKind::CardiacMonitor,
            PoolConfig {
                available: 8,
                total: 15,
            },
        );
        equipment.insert(
            EquipmentKind::Defibrillator,
            PoolConfig {
                available: 6,
                total: 8,
            },
        );

        Self {
            icu_beds: vec![
                bed("ICU-1", Some("P001")),
                bed("ICU-2", Some("P002")),
                bed("ICU-3", None),
                bed("ICU-4", None),
            ],
            trauma_bays: vec![
                bed("TB-1", Some("P003")),
                bed("TB-2", None),
                bed("TB-3", None),
            ],
            ed_treatment_rooms: PoolConfig {
                available: 5,
                total: 15,
            },
            general_floor: PoolConfig {
                available: 12,
                total: 30,
            },
            staff: vec![
                staff("dr-smith", "Dr. Smith", Specialty::EdPhysician, 3),
                staff("dr-jones", "Dr. Jones", Specialty::EdPhysician, 2),
                staff("rn-johnson", "RN Johnson", Specialty::EdNurse, 4),
                staff("rn-williams", "RN Williams", Specialty::EdNurse, 3),
                staff("rn-davis", "RN Davis", Specialty::EdNurse, 2),
                staff("dr-patel", "Dr. Patel", Specialty::Cardiologist, 0),
                staff("dr-martinez", "Dr. Martinez", Specialty::TraumaSurgeon, 0),
                staff("dr-okafor", "Dr. Okafor", Specialty::Neurologist, 0),
            ],
            equipment,
        }
    }
}

/// Resolve the inventory from an optional file path (for example `MEDFLOW_INVENTORY`).
///
/// If `value` is `None` or empty/whitespace, returns the default inventory.
pub fn inventory_from_env_value(value: Option<String>) -> TriageResult<InventoryConfig> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(path) => InventoryConfig::load(Path::new(&path)),
        None => Ok(InventoryConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_inventory_is_valid() {
        InventoryConfig::default()
            .validate()
            .expect("default inventory should validate");
    }

    #[test]
    fn default_inventory_survives_yaml() {
        let config = InventoryConfig::default();
        let yaml = config.to_yaml().expect("serialise");
        let parsed = InventoryConfig::from_yaml_str(&yaml).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_department_with_zero_beds() {
        let mut config = InventoryConfig::default();
        config.icu_beds.clear();
        let err = config.validate().expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidInventory(msg) if msg.contains("ICU has zero beds"))
        );

        let mut config = InventoryConfig::default();
        config.general_floor = PoolConfig {
            available: 0,
            total: 0,
        };
        let err = config.validate().expect_err("should reject");
        assert!(matches!(err, TriageError::InvalidInventory(msg) if msg.contains("zero rooms")));
    }

    #[test]
    fn rejects_pool_with_more_available_than_total() {
        let mut config = InventoryConfig::default();
        config.equipment.insert(
            EquipmentKind::Ventilator,
            PoolConfig {
                available: 8,
                total: 7,
            },
        );
        let err = config.validate().expect_err("should reject");
        assert!(matches!(err, TriageError::InvalidInventory(msg) if msg.contains("exceeds total")));
    }

    #[test]
    fn rejects_duplicate_ids_and_inconsistent_holders() {
        let mut config = InventoryConfig::default();
        config.trauma_bays.push(bed("ICU-3", None));
        let err = config.validate().expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidInventory(msg) if msg.contains("duplicate bed id"))
        );

        let mut config = InventoryConfig::default();
        config.icu_beds[2].patient = Some("ghost".into());
        let err = config.validate().expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidInventory(msg) if msg.contains("available but held"))
        );

        let mut config = InventoryConfig::default();
        config.staff.push(staff("dr-smith", "Dr. Smith II", Specialty::EdPhysician, 0));
        let err = config.validate().expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidInventory(msg) if msg.contains("duplicate staff id"))
        );
    }

    #[test]
    fn rejects_missing_equipment_pool() {
        let mut config = InventoryConfig::default();
        config.equipment.remove(&EquipmentKind::Defibrillator);
        let err = config.validate().expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidInventory(msg) if msg.contains("defibrillators"))
        );
    }

    #[test]
    fn rejects_unknown_categories_in_yaml() {
        let yaml = InventoryConfig::default()
            .to_yaml()
            .expect("serialise")
            .replace("Cardiologist", "Dermatologist");
        let err = InventoryConfig::from_yaml_str(&yaml).expect_err("should reject");
        assert!(matches!(err, TriageError::InventoryParse(_)));
    }

    #[test]
    fn loads_inventory_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let yaml = InventoryConfig::default().to_yaml().expect("serialise");
        file.write_all(yaml.as_bytes()).expect("write");

        let path = file.path().to_string_lossy().to_string();
        let loaded = inventory_from_env_value(Some(path)).expect("load");
        assert_eq!(loaded, InventoryConfig::default());

        let fallback = inventory_from_env_value(Some("   ".into())).expect("default");
        assert_eq!(fallback, InventoryConfig::default());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = inventory_from_env_value(Some("/definitely/not/here.yaml".into()))
            .expect_err("should fail");
        assert!(matches!(err, TriageError::InventoryRead(_)));
    }
}
