use crate::core::units::{annual_operating_hours, watts_to_kw};
use crate::input::{LightingControl, LightingZone};

/// Fraction of scheduled hours lights actually draw power under each control strategy.
pub fn control_multiplier(control: LightingControl) -> f64 {
    match control {
        LightingControl::Manual => 1.0,
        LightingControl::OccupancySensor => 0.7,
        LightingControl::DaylightSensor => 0.75,
        LightingControl::Timer => 0.85,
        LightingControl::Dimmer => 0.8,
        LightingControl::Smart => 0.65,
        // uncontrolled lighting tends to be left on past the schedule
        LightingControl::None => 1.1,
    }
}

/// Connected load of a zone, in W.
pub fn zone_wattage(zone: &LightingZone) -> f64 {
    zone.fixture_count as f64 * zone.watts_per_fixture * zone.lamps_per_fixture as f64
}

/// Annual energy for a zone, in kWh, unrounded.
pub fn zone_annual_kwh(zone: &LightingZone) -> f64 {
    watts_to_kw(zone_wattage(zone))
        * annual_operating_hours(zone.hours_per_day, zone.days_per_week)
        * control_multiplier(zone.control)
}

/// Annual lighting energy across all zones, rounded to the nearest kWh.
pub fn estimate_lighting_kwh(zones: &[LightingZone]) -> f64 {
    zones.iter().map(zone_annual_kwh).sum::<f64>().round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{new_equipment_id, FixtureType};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn office_zone() -> LightingZone {
        LightingZone {
            id: new_equipment_id(),
            name: Some("Open office".to_string()),
            fixture_type: Some(FixtureType::T8),
            fixture_count: 40,
            watts_per_fixture: 32.,
            lamps_per_fixture: 2,
            hours_per_day: 10.,
            days_per_week: 5.,
            control: LightingControl::Manual,
        }
    }

    #[rstest]
    fn test_manual_zone(office_zone: LightingZone) {
        assert_eq!(zone_wattage(&office_zone), 2560.);
        // 2.56 kW * 2600 h
        assert_relative_eq!(zone_annual_kwh(&office_zone), 6656.);
        assert_eq!(estimate_lighting_kwh(&[office_zone]), 6656.);
    }

    #[rstest]
    #[case(LightingControl::OccupancySensor, 4659.)]
    #[case(LightingControl::DaylightSensor, 4992.)]
    #[case(LightingControl::Timer, 5658.)]
    #[case(LightingControl::Dimmer, 5325.)]
    #[case(LightingControl::Smart, 4326.)]
    #[case(LightingControl::None, 7322.)]
    fn test_control_multipliers(
        office_zone: LightingZone,
        #[case] control: LightingControl,
        #[case] expected_kwh: f64,
    ) {
        let zone = LightingZone {
            control,
            ..office_zone
        };
        assert_eq!(estimate_lighting_kwh(&[zone]), expected_kwh);
    }

    #[rstest]
    fn test_zones_are_summed(office_zone: LightingZone) {
        let warehouse = LightingZone {
            fixture_count: 12,
            watts_per_fixture: 400.,
            lamps_per_fixture: 1,
            hours_per_day: 24.,
            days_per_week: 7.,
            control: LightingControl::None,
            ..office_zone.clone()
        };
        // 4.8 kW * 8736 h * 1.1 = 46126.08
        assert_eq!(estimate_lighting_kwh(&[office_zone, warehouse]), 52_782.);
    }
}
