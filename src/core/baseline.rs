use crate::core::reference_data::climate::{
    climate_zone_for_state, construction_adjustment_factor, state_from_zip, ClimateZone,
};
use crate::core::reference_data::eui::base_eui;
use crate::core::reference_data::utility_rates::electricity_rate;
use crate::input::{is_valid_floor_area, BuildingProfile, BusinessType, ConstructionYearBand};
use serde::Serialize;
use tracing::debug;

/// Benchmark energy use and cost for a building.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnergyBaseline {
    pub business_type: BusinessType,
    pub floor_area_sq_ft: f64,
    /// kWh per square foot per year
    pub base_eui: f64,
    pub construction_adjustment: f64,
    pub climate_zone: ClimateZone,
    pub climate_adjustment: f64,
    /// kWh per square foot per year
    pub adjusted_eui: f64,
    pub annual_energy_use_kwh: f64,
    pub state_code: Option<&'static str>,
    /// $ per kWh
    pub electricity_rate: f64,
    pub annual_energy_cost_usd: f64,
}

/// Estimates the annual energy baseline for a building.
///
/// Returns `None` when the floor area is not a positive finite number.
pub fn estimate_baseline(
    business_type: BusinessType,
    floor_area_sq_ft: f64,
    construction_year: Option<ConstructionYearBand>,
    zip_code: Option<&str>,
) -> Option<EnergyBaseline> {
    if !is_valid_floor_area(floor_area_sq_ft) {
        return None;
    }

    let base_eui = base_eui(business_type);
    let construction_adjustment = construction_adjustment_factor(construction_year);

    let state_code = zip_code.and_then(state_from_zip);
    let climate_zone = match state_code.and_then(climate_zone_for_state) {
        Some(zone) => zone,
        None => {
            if zip_code.is_some_and(|zip| !zip.trim().is_empty()) {
                debug!("ZIP code {zip_code:?} not recognised; assuming mixed climate and average rate");
            }
            ClimateZone::default()
        }
    };
    let climate_adjustment = climate_zone.adjustment_factor();

    let adjusted_eui = base_eui * construction_adjustment * climate_adjustment;
    let annual_energy_use_kwh = adjusted_eui * floor_area_sq_ft;
    let electricity_rate = electricity_rate(state_code);
    let annual_energy_cost_usd = annual_energy_use_kwh * electricity_rate;

    Some(EnergyBaseline {
        business_type,
        floor_area_sq_ft,
        base_eui,
        construction_adjustment,
        climate_zone,
        climate_adjustment,
        adjusted_eui,
        annual_energy_use_kwh,
        state_code,
        electricity_rate,
        annual_energy_cost_usd,
    })
}

impl BuildingProfile {
    /// The energy baseline for this profile, or `None` if the profile lacks a business type or a
    /// usable floor area.
    pub fn baseline(&self) -> Option<EnergyBaseline> {
        estimate_baseline(
            self.business_type?,
            self.floor_area_sq_ft,
            self.construction_year,
            self.zip_code.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference_data::utility_rates::DEFAULT_ELECTRICITY_RATE;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use strum::IntoEnumIterator;

    #[rstest]
    fn test_office_with_no_location_or_year() {
        let baseline = estimate_baseline(BusinessType::Office, 10_000., None, None).unwrap();
        assert_eq!(baseline.base_eui, 14.);
        assert_eq!(baseline.adjusted_eui, 14.);
        assert_eq!(baseline.annual_energy_use_kwh, 140_000.);
        assert_eq!(baseline.state_code, None);
        assert_eq!(baseline.climate_zone, ClimateZone::Mixed);
        assert_eq!(baseline.electricity_rate, DEFAULT_ELECTRICITY_RATE);
        assert_relative_eq!(baseline.annual_energy_cost_usd, 21_000.);
    }

    #[rstest]
    fn test_office_built_before_2000() {
        let baseline = estimate_baseline(
            BusinessType::Office,
            10_000.,
            Some(ConstructionYearBand::Before2000),
            None,
        )
        .unwrap();
        assert_relative_eq!(baseline.adjusted_eui, 16.1);
        assert_relative_eq!(baseline.annual_energy_use_kwh, 161_000.);
    }

    #[rstest]
    fn test_climate_and_rate_from_zip() {
        let baseline = estimate_baseline(
            BusinessType::Retail,
            5_000.,
            Some(ConstructionYearBand::After2010),
            Some("33101"),
        )
        .unwrap();
        assert_eq!(baseline.state_code, Some("FL"));
        assert_eq!(baseline.climate_zone, ClimateZone::Hot);
        assert_relative_eq!(baseline.adjusted_eui, 13. * 0.9 * 1.15);
        assert_relative_eq!(baseline.annual_energy_use_kwh, 13. * 0.9 * 1.15 * 5_000.);
        assert_eq!(baseline.electricity_rate, 0.12);
        assert_relative_eq!(
            baseline.annual_energy_cost_usd,
            baseline.annual_energy_use_kwh * 0.12
        );
    }

    #[rstest]
    fn test_unrecognised_zip_falls_back_to_mixed_and_default_rate() {
        let baseline =
            estimate_baseline(BusinessType::Office, 1_000., None, Some("00000")).unwrap();
        assert_eq!(baseline.state_code, None);
        assert_eq!(baseline.climate_adjustment, 1.0);
        assert_eq!(baseline.electricity_rate, DEFAULT_ELECTRICITY_RATE);
    }

    #[rstest]
    #[case(0.)]
    #[case(-100.)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_unusable_floor_area(#[case] floor_area: f64) {
        assert_eq!(
            estimate_baseline(BusinessType::Office, floor_area, None, None),
            None
        );
    }

    #[rstest]
    fn test_adjusted_eui_is_product_of_factors() {
        for business_type in BusinessType::iter() {
            for band in ConstructionYearBand::iter() {
                for zip in ["10001", "85001", "55401", "27601", "94105"] {
                    let baseline =
                        estimate_baseline(business_type, 2_345., Some(band), Some(zip)).unwrap();
                    assert_eq!(
                        baseline.adjusted_eui,
                        baseline.base_eui
                            * baseline.construction_adjustment
                            * baseline.climate_adjustment
                    );
                    assert_relative_eq!(
                        baseline.annual_energy_use_kwh,
                        baseline.adjusted_eui * 2_345.
                    );
                }
            }
        }
    }

    #[rstest]
    fn test_profile_without_business_type_is_unavailable() {
        let profile = BuildingProfile {
            business_type: None,
            ..BuildingProfile::new(BusinessType::Office, 1_000.)
        };
        assert_eq!(profile.baseline(), None);
    }

    #[rstest]
    fn test_repeated_calls_are_identical() {
        let profile = BuildingProfile::new(BusinessType::Hotel, 42_000.)
            .with_zip_code("98101")
            .with_construction_year(ConstructionYearBand::From2000To2010);
        assert_eq!(profile.baseline(), profile.baseline());
    }
}
