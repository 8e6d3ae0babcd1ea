//! Bottom-up energy estimates from an equipment inventory.
//!
//! Each equipment class has its own engineering model; the inventory totals are always a
//! wholesale recomputation over the current inventory.

pub mod hvac;
pub mod lighting;
pub mod major_equipment;

use crate::core::units::kw_to_tons;
use crate::input::{EquipmentCondition, EquipmentId, HvacUnit, LightingZone, MajorEquipmentItem};
use serde::{Deserialize, Serialize};

pub fn condition_factor(condition: EquipmentCondition) -> f64 {
    match condition {
        EquipmentCondition::Excellent => 0.95,
        EquipmentCondition::Good => 1.0,
        EquipmentCondition::Fair => 1.1,
        EquipmentCondition::Poor => 1.25,
    }
}

/// The equipment recorded for a building. Every edit returns a new inventory.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EquipmentInventory {
    #[serde(default)]
    pub hvac_units: Vec<HvacUnit>,
    #[serde(default)]
    pub lighting_zones: Vec<LightingZone>,
    #[serde(default)]
    pub major_equipment: Vec<MajorEquipmentItem>,
}

/// Replaces the entry with a matching id, leaving the list untouched if there is none.
fn replace_by_id<T: Clone>(items: &[T], replacement: T, id_of: impl Fn(&T) -> EquipmentId) -> Vec<T> {
    let id = id_of(&replacement);
    items
        .iter()
        .map(|item| {
            if id_of(item) == id {
                replacement.clone()
            } else {
                item.clone()
            }
        })
        .collect()
}

impl EquipmentInventory {
    pub fn is_empty(&self) -> bool {
        self.hvac_units.is_empty() && self.lighting_zones.is_empty() && self.major_equipment.is_empty()
    }

    pub fn with_hvac_unit(mut self, unit: HvacUnit) -> Self {
        self.hvac_units.push(unit);
        self
    }

    pub fn with_lighting_zone(mut self, zone: LightingZone) -> Self {
        self.lighting_zones.push(zone);
        self
    }

    pub fn with_equipment_item(mut self, item: MajorEquipmentItem) -> Self {
        self.major_equipment.push(item);
        self
    }

    pub fn updated_hvac_unit(&self, unit: HvacUnit) -> Self {
        Self {
            hvac_units: replace_by_id(&self.hvac_units, unit, |unit| unit.id),
            ..self.clone()
        }
    }

    pub fn updated_lighting_zone(&self, zone: LightingZone) -> Self {
        Self {
            lighting_zones: replace_by_id(&self.lighting_zones, zone, |zone| zone.id),
            ..self.clone()
        }
    }

    pub fn updated_equipment_item(&self, item: MajorEquipmentItem) -> Self {
        Self {
            major_equipment: replace_by_id(&self.major_equipment, item, |item| item.id),
            ..self.clone()
        }
    }

    pub fn without_hvac_unit(&self, id: EquipmentId) -> Self {
        Self {
            hvac_units: self.hvac_units.iter().filter(|unit| unit.id != id).cloned().collect(),
            ..self.clone()
        }
    }

    pub fn without_lighting_zone(&self, id: EquipmentId) -> Self {
        Self {
            lighting_zones: self
                .lighting_zones
                .iter()
                .filter(|zone| zone.id != id)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    pub fn without_equipment_item(&self, id: EquipmentId) -> Self {
        Self {
            major_equipment: self
                .major_equipment
                .iter()
                .filter(|item| item.id != id)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Recomputes the aggregate figures for the whole inventory.
    pub fn totals(&self) -> EquipmentTotals {
        let hvac_capacity_kw: f64 = self.hvac_units.iter().map(hvac::capacity_kw).sum();
        let lighting_watts: f64 = self.lighting_zones.iter().map(lighting::zone_wattage).sum();
        let equipment_kw: f64 = self
            .major_equipment
            .iter()
            .map(|item| item.power_rating_kw * item.quantity as f64)
            .sum();

        let hvac_kwh = hvac::estimate_hvac_kwh(&self.hvac_units);
        let lighting_kwh = lighting::estimate_lighting_kwh(&self.lighting_zones);
        let equipment_kwh = major_equipment::estimate_equipment_kwh(&self.major_equipment);

        EquipmentTotals {
            hvac_capacity_kw,
            hvac_capacity_tons: kw_to_tons(hvac_capacity_kw),
            lighting_watts,
            equipment_kw,
            hvac_kwh,
            lighting_kwh,
            equipment_kwh,
            total_kwh: hvac_kwh + lighting_kwh + equipment_kwh,
        }
    }
}

/// Aggregate connected load and annual energy for an inventory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct EquipmentTotals {
    pub hvac_capacity_kw: f64,
    pub hvac_capacity_tons: f64,
    pub lighting_watts: f64,
    pub equipment_kw: f64,
    pub hvac_kwh: f64,
    pub lighting_kwh: f64,
    /// major equipment, fed into the equipment-driven end-use bucket
    pub equipment_kwh: f64,
    pub total_kwh: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{
        new_equipment_id, CapacityUnit, HvacFuelType, HvacSystemType, LightingControl,
        MajorEquipmentType,
    };
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn inventory() -> EquipmentInventory {
        EquipmentInventory::default()
            .with_hvac_unit(HvacUnit {
                id: new_equipment_id(),
                name: None,
                system_type: HvacSystemType::SplitSystem,
                capacity: 5.,
                capacity_unit: CapacityUnit::Tons,
                efficiency_rating: None,
                age_years: Some(20.),
                condition: EquipmentCondition::Poor,
                fuel_type: HvacFuelType::Electric,
            })
            .with_lighting_zone(LightingZone {
                id: new_equipment_id(),
                name: None,
                fixture_type: None,
                fixture_count: 40,
                watts_per_fixture: 32.,
                lamps_per_fixture: 2,
                hours_per_day: 10.,
                days_per_week: 5.,
                control: LightingControl::Manual,
            })
            .with_equipment_item(MajorEquipmentItem {
                id: new_equipment_id(),
                name: None,
                equipment_type: MajorEquipmentType::WalkInCooler,
                power_rating_kw: 3.,
                quantity: 2,
                hours_per_day: 24.,
                days_per_week: 7.,
                has_vfd: false,
                condition: EquipmentCondition::Good,
                age_years: None,
            })
    }

    #[rstest]
    fn test_totals(inventory: EquipmentInventory) {
        let totals = inventory.totals();
        assert_relative_eq!(totals.hvac_capacity_tons, 5., max_relative = 1e-12);
        assert_eq!(totals.lighting_watts, 2560.);
        assert_eq!(totals.equipment_kw, 6.);
        assert_eq!(totals.hvac_kwh, 43_259.);
        assert_eq!(totals.lighting_kwh, 6656.);
        assert_eq!(totals.equipment_kwh, 31_450.);
        assert_eq!(totals.total_kwh, 81_365.);
    }

    #[rstest]
    fn test_empty_inventory() {
        let inventory = EquipmentInventory::default();
        assert!(inventory.is_empty());
        assert_eq!(inventory.totals(), EquipmentTotals::default());
    }

    #[rstest]
    fn test_update_replaces_only_matching_entry(inventory: EquipmentInventory) {
        let mut zone = inventory.lighting_zones[0].clone();
        zone.control = LightingControl::OccupancySensor;
        let updated = inventory.updated_lighting_zone(zone);

        assert_eq!(updated.lighting_zones.len(), 1);
        assert_eq!(updated.lighting_zones[0].control, LightingControl::OccupancySensor);
        assert_eq!(updated.totals().lighting_kwh, 4659.);
        // the original is untouched
        assert_eq!(inventory.lighting_zones[0].control, LightingControl::Manual);
    }

    #[rstest]
    fn test_update_with_unknown_id_is_a_no_op(inventory: EquipmentInventory) {
        let mut unit = inventory.hvac_units[0].clone();
        unit.id = new_equipment_id();
        unit.capacity = 50.;
        assert_eq!(inventory.updated_hvac_unit(unit), inventory);
    }

    #[rstest]
    fn test_remove(inventory: EquipmentInventory) {
        let hvac_id = inventory.hvac_units[0].id;
        let item_id = inventory.major_equipment[0].id;
        let zone_id = inventory.lighting_zones[0].id;

        let trimmed = inventory
            .without_hvac_unit(hvac_id)
            .without_equipment_item(item_id)
            .without_lighting_zone(zone_id);
        assert!(trimmed.is_empty());
        assert_eq!(inventory.totals().total_kwh, 81_365.);
    }
}
