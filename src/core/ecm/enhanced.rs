use crate::core::baseline::EnergyBaseline;
use crate::core::ecm::{sort_by_priority_then_payback, PaybackRange, Priority, ValueRange};
use crate::core::end_use::{EndUseBreakdown, EndUseCategory};
use crate::core::reference_data::ecm_catalog::{
    Complexity, EnhancedEcmDefinition, InteractiveEffect, RebateRule, ENHANCED_ECM_DEFINITIONS,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, instrument};

/// A range-based energy conservation measure recommendation.
///
/// Figures here are the measure's own savings only; reductions it causes in other
/// categories are accounted for once across all measures in [InteractiveSavings].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnhancedEcm {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: EndUseCategory,
    pub energy_saved_kwh: ValueRange,
    pub cost_saved_usd: ValueRange,
    pub implementation_cost_usd: ValueRange,
    pub rebate_usd: ValueRange,
    pub net_cost_usd: ValueRange,
    pub payback: PaybackRange,
    /// from the typical payback only
    pub priority: Priority,
    pub interactive_effects: &'static [InteractiveEffect],
    pub complexity: Complexity,
    pub lifespan_years: u32,
    /// typical annual savings over the lifespan, less typical net cost
    pub lifetime_net_savings_usd: f64,
}

fn rebate_for(rule: RebateRule, implementation_cost: &ValueRange, floor_area_sq_ft: f64) -> ValueRange {
    match rule {
        RebateRule::None => ValueRange::default(),
        RebateRule::PerSqFt(rate) => ValueRange::uniform(floor_area_sq_ft * rate),
        RebateRule::PercentOfCost(fraction) => implementation_cost.scale(fraction),
    }
}

impl EnhancedEcm {
    /// Applies a measure definition to its target category's energy use. Returns `None` when
    /// the category has no energy to save.
    pub fn from_definition(
        definition: &EnhancedEcmDefinition,
        category_kwh: Option<f64>,
        floor_area_sq_ft: f64,
        electricity_rate: f64,
    ) -> Option<Self> {
        let category_kwh = category_kwh.filter(|kwh| *kwh > 0.)?;

        let energy_saved_kwh = definition.savings_fraction.scale(category_kwh);
        let cost_saved_usd = energy_saved_kwh.scale(electricity_rate);
        let implementation_cost_usd = definition.cost_per_sq_ft.scale(floor_area_sq_ft);
        let rebate_usd = rebate_for(definition.rebate, &implementation_cost_usd, floor_area_sq_ft);
        let net_cost_usd = ValueRange::new(
            (implementation_cost_usd.low - rebate_usd.low).max(0.),
            (implementation_cost_usd.typical - rebate_usd.typical).max(0.),
            (implementation_cost_usd.high - rebate_usd.high).max(0.),
        );
        let payback = PaybackRange::from_cost_and_savings(&net_cost_usd, &cost_saved_usd);

        Some(Self {
            id: definition.id,
            name: definition.name,
            description: definition.description,
            category: definition.category,
            energy_saved_kwh,
            cost_saved_usd,
            implementation_cost_usd,
            rebate_usd,
            net_cost_usd,
            payback,
            priority: Priority::from_payback(payback.typical),
            interactive_effects: definition.interactive_effects,
            complexity: definition.complexity,
            lifespan_years: definition.lifespan_years,
            lifetime_net_savings_usd: cost_saved_usd.typical * definition.lifespan_years as f64
                - net_cost_usd.typical,
        })
    }
}

/// Savings from the combined secondary effects of all recommended measures.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InteractiveSavings {
    /// product of every multiplier declared against each affected category
    pub composed_multipliers: IndexMap<EndUseCategory, f64>,
    pub energy_saved_kwh_by_category: IndexMap<EndUseCategory, f64>,
    pub energy_saved_kwh: f64,
    pub cost_saved_usd: f64,
}

impl InteractiveSavings {
    /// Composes the multipliers declared by `ecms` per affected category, then applies each
    /// composed multiplier once against that category's energy use.
    pub fn compose(ecms: &[EnhancedEcm], breakdown: &EndUseBreakdown, electricity_rate: f64) -> Self {
        let mut composed_multipliers: IndexMap<EndUseCategory, f64> = IndexMap::new();
        for effect in ecms.iter().flat_map(|ecm| ecm.interactive_effects) {
            *composed_multipliers.entry(effect.category).or_insert(1.) *= effect.multiplier;
        }

        let energy_saved_kwh_by_category = composed_multipliers
            .iter()
            .map(|(category, multiplier)| {
                let category_kwh = breakdown.kwh(*category).unwrap_or(0.);
                (*category, category_kwh * (1. - multiplier))
            })
            .collect::<IndexMap<_, _>>();
        let energy_saved_kwh: f64 = energy_saved_kwh_by_category.values().sum();

        Self {
            composed_multipliers,
            energy_saved_kwh_by_category,
            energy_saved_kwh,
            cost_saved_usd: energy_saved_kwh * electricity_rate,
        }
    }
}

/// The interactive bonus is not counted in the low case.
fn bonus_range(value: f64) -> ValueRange {
    ValueRange::new(0., value, value)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnhancedEcmTotals {
    pub energy_saved_kwh: ValueRange,
    pub cost_saved_usd: ValueRange,
    pub implementation_cost_usd: ValueRange,
    pub rebate_usd: ValueRange,
    pub net_cost_usd: ValueRange,
    /// total net cost over total cost savings
    pub blended_payback: PaybackRange,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnhancedEcmAnalysis {
    pub ecms: Vec<EnhancedEcm>,
    pub interactive_savings: InteractiveSavings,
    pub totals: EnhancedEcmTotals,
}

/// Recommends every applicable range-based measure against an end-use breakdown.
#[instrument(skip_all, fields(business_type = %baseline.business_type))]
pub fn calculate_enhanced_ecms(
    baseline: &EnergyBaseline,
    breakdown: &EndUseBreakdown,
) -> EnhancedEcmAnalysis {
    // measures' own figures
    let mut ecms = ENHANCED_ECM_DEFINITIONS
        .iter()
        .filter(|definition| definition.applicability.applies_to(baseline.business_type))
        .filter_map(|definition| {
            let ecm = EnhancedEcm::from_definition(
                definition,
                breakdown.kwh(definition.category),
                baseline.floor_area_sq_ft,
                baseline.electricity_rate,
            );
            if ecm.is_none() {
                debug!("Skipping {}: no {} energy", definition.id, definition.category);
            }
            ecm
        })
        .collect::<Vec<_>>();
    sort_by_priority_then_payback(&mut ecms, |ecm| (ecm.priority, ecm.payback.typical));

    // cross-measure effects, applied once
    let interactive_savings = InteractiveSavings::compose(&ecms, breakdown, baseline.electricity_rate);

    let implementation_cost_usd: ValueRange = ecms.iter().map(|ecm| ecm.implementation_cost_usd).sum();
    let rebate_usd: ValueRange = ecms.iter().map(|ecm| ecm.rebate_usd).sum();
    let net_cost_usd: ValueRange = ecms.iter().map(|ecm| ecm.net_cost_usd).sum();
    let energy_saved_kwh = ecms.iter().map(|ecm| ecm.energy_saved_kwh).sum::<ValueRange>()
        + bonus_range(interactive_savings.energy_saved_kwh);
    let cost_saved_usd = ecms.iter().map(|ecm| ecm.cost_saved_usd).sum::<ValueRange>()
        + bonus_range(interactive_savings.cost_saved_usd);

    let totals = EnhancedEcmTotals {
        blended_payback: PaybackRange::from_cost_and_savings(&net_cost_usd, &cost_saved_usd),
        energy_saved_kwh,
        cost_saved_usd,
        implementation_cost_usd,
        rebate_usd,
        net_cost_usd,
    };

    EnhancedEcmAnalysis {
        ecms,
        interactive_savings,
        totals,
    }
}
