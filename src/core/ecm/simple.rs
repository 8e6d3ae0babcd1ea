use crate::core::baseline::EnergyBaseline;
use crate::core::ecm::{sort_by_priority_then_payback, Payback, Priority};
use crate::core::end_use::{EndUseBreakdown, EndUseCategory};
use crate::core::reference_data::ecm_catalog::{SimpleEcmDefinition, SIMPLE_ECM_DEFINITIONS};
use serde::Serialize;
use tracing::debug;

/// A single-point energy conservation measure recommendation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimpleEcm {
    pub name: &'static str,
    pub category: EndUseCategory,
    pub energy_saved_kwh: f64,
    pub cost_saved_usd: f64,
    pub implementation_cost_usd: f64,
    pub payback: Payback,
    pub priority: Priority,
}

impl SimpleEcm {
    pub fn new(
        name: &'static str,
        category: EndUseCategory,
        energy_saved_kwh: f64,
        cost_saved_usd: f64,
        implementation_cost_usd: f64,
    ) -> Self {
        let payback = Payback::from_cost_and_savings(implementation_cost_usd, cost_saved_usd);
        Self {
            name,
            category,
            energy_saved_kwh,
            cost_saved_usd,
            implementation_cost_usd,
            payback,
            priority: Priority::from_payback(payback),
        }
    }

    /// Applies a measure definition to its target category's energy use. Returns `None` when
    /// the category has no energy to save.
    pub fn from_definition(
        definition: &SimpleEcmDefinition,
        category_kwh: Option<f64>,
        floor_area_sq_ft: f64,
        electricity_rate: f64,
    ) -> Option<Self> {
        let category_kwh = category_kwh.filter(|kwh| *kwh > 0.)?;
        let energy_saved_kwh = category_kwh * definition.savings_fraction;

        Some(Self::new(
            definition.name,
            definition.category,
            energy_saved_kwh,
            energy_saved_kwh * electricity_rate,
            floor_area_sq_ft * definition.cost_per_sq_ft,
        ))
    }
}

pub fn sort_simple_ecms(ecms: &mut [SimpleEcm]) {
    sort_by_priority_then_payback(ecms, |ecm| (ecm.priority, ecm.payback));
}

/// Recommends the fixed set of single-point measures against an end-use breakdown, sorted
/// by priority then payback.
pub fn calculate_simple_ecms(
    baseline: &EnergyBaseline,
    breakdown: &EndUseBreakdown,
) -> Vec<SimpleEcm> {
    let mut ecms = SIMPLE_ECM_DEFINITIONS
        .iter()
        .filter_map(|definition| {
            let ecm = SimpleEcm::from_definition(
                definition,
                breakdown.kwh(definition.category),
                baseline.floor_area_sq_ft,
                baseline.electricity_rate,
            );
            if ecm.is_none() {
                debug!(
                    "Skipping {}: no {} energy for {}",
                    definition.name,
                    definition.category,
                    breakdown.business_type()
                );
            }
            ecm
        })
        .collect::<Vec<_>>();

    sort_simple_ecms(&mut ecms);
    ecms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::baseline::estimate_baseline;
    use crate::core::end_use::decompose;
    use crate::input::BusinessType;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn office_baseline() -> EnergyBaseline {
        estimate_baseline(BusinessType::Office, 10_000., None, None).unwrap()
    }

    #[rstest]
    fn test_office_recommendations(office_baseline: EnergyBaseline) {
        let breakdown =
            decompose(BusinessType::Office, office_baseline.annual_energy_use_kwh).unwrap();
        let ecms = calculate_simple_ecms(&office_baseline, &breakdown);

        let names: Vec<_> = ecms.iter().map(|ecm| ecm.name).collect();
        assert_eq!(
            names,
            vec![
                "Plug Load Reduction",
                "HVAC Tune-up",
                "LED Lighting Upgrade",
                "Weatherization"
            ]
        );

        let tune_up = &ecms[1];
        assert_relative_eq!(tune_up.energy_saved_kwh, 8_400., max_relative = 1e-9);
        assert_relative_eq!(tune_up.cost_saved_usd, 1_260., max_relative = 1e-9);
        assert_relative_eq!(tune_up.implementation_cost_usd, 1_500., max_relative = 1e-9);
        assert_eq!(tune_up.priority, Priority::High);

        let led = &ecms[2];
        assert_relative_eq!(led.energy_saved_kwh, 24_500., max_relative = 1e-9);
        assert_relative_eq!(led.cost_saved_usd, 3_675., max_relative = 1e-9);
        assert_relative_eq!(led.implementation_cost_usd, 7_500., max_relative = 1e-9);
        assert_eq!(led.priority, Priority::Medium);

        let weatherization = &ecms[3];
        assert_relative_eq!(weatherization.payback.years().unwrap(), 5000. / 840., max_relative = 1e-9);
        assert_eq!(weatherization.priority, Priority::Low);
    }

    #[rstest]
    fn test_measures_without_target_category_are_skipped() {
        let baseline = estimate_baseline(BusinessType::Warehouse, 50_000., None, None).unwrap();
        let breakdown =
            decompose(BusinessType::Warehouse, baseline.annual_energy_use_kwh).unwrap();
        let ecms = calculate_simple_ecms(&baseline, &breakdown);
        assert_eq!(ecms.len(), 4);

        let definition = &SIMPLE_ECM_DEFINITIONS[0];
        assert_eq!(SimpleEcm::from_definition(definition, None, 1000., 0.15), None);
        assert_eq!(
            SimpleEcm::from_definition(definition, Some(0.), 1000., 0.15),
            None
        );
    }

    #[rstest]
    fn test_high_priority_sorts_before_medium() {
        let mut ecms = vec![
            SimpleEcm::new("Medium measure", EndUseCategory::Hvac, 10_000., 1_000., 3_000.),
            SimpleEcm::new("High measure", EndUseCategory::Lighting, 12_000., 1_800., 3_000.),
        ];
        sort_simple_ecms(&mut ecms);

        assert_eq!(ecms[0].name, "High measure");
        assert_relative_eq!(ecms[0].payback.years().unwrap(), 1.6666666666666667, max_relative = 1e-9);
        assert_eq!(ecms[0].priority, Priority::High);
        assert_eq!(ecms[1].payback, Payback::Years(3.));
        assert_eq!(ecms[1].priority, Priority::Medium);
    }

    #[rstest]
    fn test_zero_cost_savings_gives_no_payback() {
        let ecm = SimpleEcm::new("Nothing saved", EndUseCategory::PlugLoads, 0., 0., 500.);
        assert_eq!(ecm.payback, Payback::NoPayback);
        assert_eq!(ecm.priority, Priority::Low);
    }

    #[rstest]
    fn test_idempotent(office_baseline: EnergyBaseline) {
        let breakdown =
            decompose(BusinessType::Office, office_baseline.annual_energy_use_kwh).unwrap();
        assert_eq!(
            calculate_simple_ecms(&office_baseline, &breakdown),
            calculate_simple_ecms(&office_baseline, &breakdown)
        );
    }
}
