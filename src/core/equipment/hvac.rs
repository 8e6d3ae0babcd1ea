use crate::core::equipment::condition_factor;
use crate::core::units::{btu_per_hour_to_kw, tons_to_kw};
use crate::input::{CapacityUnit, HvacFuelType, HvacSystemType, HvacUnit};
use serde::Serialize;

/// Equivalent full-load cooling hours per year
const COOLING_FULL_LOAD_HOURS: f64 = 1000.;
/// Equivalent full-load heating hours per year
const HEATING_FULL_LOAD_HOURS: f64 = 800.;
/// Heating capacity as a fraction of rated cooling capacity
const HEATING_CAPACITY_RATIO: f64 = 0.8;
/// Age beyond which performance degrades, in years
const DEGRADATION_THRESHOLD_YEARS: f64 = 10.;
/// Fractional increase in energy use per year beyond the threshold
const DEGRADATION_PER_YEAR: f64 = 0.02;

/// Typical installed efficiency rating (EER-style) for each system type.
pub fn benchmark_efficiency(system_type: HvacSystemType) -> f64 {
    match system_type {
        HvacSystemType::PackagedRooftop => 11.,
        HvacSystemType::SplitSystem => 13.,
        HvacSystemType::HeatPump => 14.,
        HvacSystemType::Chiller => 10.,
        HvacSystemType::Ptac => 10.,
        HvacSystemType::Vrf => 16.,
        HvacSystemType::Other => 12.,
    }
}

pub fn capacity_kw(unit: &HvacUnit) -> f64 {
    match unit.capacity_unit {
        CapacityUnit::Tons => tons_to_kw(unit.capacity),
        CapacityUnit::BtuPerHour => btu_per_hour_to_kw(unit.capacity),
        CapacityUnit::Kilowatts => unit.capacity,
    }
}

/// Ratio of the benchmark efficiency to the unit's own rating; a less efficient unit than the
/// benchmark uses proportionally more energy.
pub fn efficiency_factor(unit: &HvacUnit) -> f64 {
    match unit.efficiency_rating {
        Some(rating) if rating > 0. => benchmark_efficiency(unit.system_type) / rating,
        _ => 1.,
    }
}

pub fn age_factor(age_years: Option<f64>) -> f64 {
    match age_years {
        Some(age) if age > DEGRADATION_THRESHOLD_YEARS => {
            1. + (age - DEGRADATION_THRESHOLD_YEARS) * DEGRADATION_PER_YEAR
        }
        _ => 1.,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct HvacEstimate {
    pub cooling_kwh: f64,
    pub heating_kwh: f64,
    /// cooling plus heating, rounded to the nearest kWh
    pub total_kwh: f64,
}

/// Annual cooling and (electric) heating energy for a single unit.
pub fn estimate_unit(unit: &HvacUnit) -> HvacEstimate {
    let capacity_kw = capacity_kw(unit);
    let performance =
        efficiency_factor(unit) * age_factor(unit.age_years) * condition_factor(unit.condition);

    let cooling_kwh = capacity_kw * COOLING_FULL_LOAD_HOURS * performance;
    let heating_kwh = match unit.fuel_type {
        HvacFuelType::Electric => {
            capacity_kw * HEATING_CAPACITY_RATIO * HEATING_FULL_LOAD_HOURS * performance
        }
        _ => 0.,
    };

    HvacEstimate {
        cooling_kwh,
        heating_kwh,
        total_kwh: (cooling_kwh + heating_kwh).round(),
    }
}

/// Annual HVAC energy across all units, rounded to the nearest kWh.
pub fn estimate_hvac_kwh(units: &[HvacUnit]) -> f64 {
    units
        .iter()
        .map(|unit| {
            let estimate = estimate_unit(unit);
            estimate.cooling_kwh + estimate.heating_kwh
        })
        .sum::<f64>()
        .round()
}
