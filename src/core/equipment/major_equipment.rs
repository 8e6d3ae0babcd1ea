use crate::core::equipment::condition_factor;
use crate::core::units::annual_operating_hours;
use crate::input::{MajorEquipmentItem, MajorEquipmentType};

/// Energy use multiplier for equipment fitted with a variable frequency drive
const VFD_FACTOR: f64 = 0.75;

/// Average fraction of rated power drawn while operating.
pub fn load_factor(equipment_type: MajorEquipmentType) -> f64 {
    match equipment_type {
        MajorEquipmentType::WalkInCooler => 0.6,
        MajorEquipmentType::WalkInFreezer => 0.7,
        MajorEquipmentType::ReachInRefrigerator => 0.5,
        MajorEquipmentType::IceMachine => 0.5,
        MajorEquipmentType::CommercialOven => 0.45,
        MajorEquipmentType::Dishwasher => 0.4,
        MajorEquipmentType::AirCompressor => 0.7,
        MajorEquipmentType::Pump => 0.65,
        MajorEquipmentType::Fan => 0.6,
        MajorEquipmentType::Conveyor => 0.4,
        MajorEquipmentType::ProcessMotor => 0.7,
        MajorEquipmentType::DataCenter => 0.85,
        MajorEquipmentType::Other => 0.5,
    }
}

pub fn vfd_factor(has_vfd: bool) -> f64 {
    if has_vfd {
        VFD_FACTOR
    } else {
        1.
    }
}

/// Annual energy for a single equipment line item, in kWh, unrounded.
pub fn item_annual_kwh(item: &MajorEquipmentItem) -> f64 {
    item.power_rating_kw
        * item.quantity as f64
        * annual_operating_hours(item.hours_per_day, item.days_per_week)
        * load_factor(item.equipment_type)
        * vfd_factor(item.has_vfd)
        * condition_factor(item.condition)
}

/// Annual energy across all major equipment, rounded to the nearest kWh.
pub fn estimate_equipment_kwh(items: &[MajorEquipmentItem]) -> f64 {
    items.iter().map(item_annual_kwh).sum::<f64>().round()
}
