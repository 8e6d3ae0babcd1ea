use crate::core::equipment::EquipmentTotals;
use crate::core::reference_data::end_use_split::end_use_split;
use crate::input::BusinessType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use tracing::debug;

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum EndUseCategory {
    Lighting,
    #[serde(rename = "HVAC")]
    #[strum(serialize = "HVAC")]
    Hvac,
    #[serde(rename = "Plug Loads")]
    #[strum(serialize = "Plug Loads")]
    PlugLoads,
    Refrigeration,
    Process,
}

/// Order in which the equipment bottom-up figure claims an equipment-driven bucket. Only the
/// first of these present for a business type receives it.
const EQUIPMENT_LOAD_PRECEDENCE: [EndUseCategory; 3] = [
    EndUseCategory::Process,
    EndUseCategory::Refrigeration,
    EndUseCategory::PlugLoads,
];

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EstimateSource {
    #[serde(rename = "estimated")]
    Estimated,
    #[serde(rename = "equipment-derived")]
    EquipmentDerived,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct EndUseShare {
    pub kwh: f64,
    pub source: EstimateSource,
}

/// Annual energy use split by end-use category.
///
/// The category set is always exactly the set defined for the business type. When
/// equipment-derived figures are substituted the total may differ from the annual energy use
/// the breakdown was derived from; that difference is kept, not renormalised away.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EndUseBreakdown {
    business_type: BusinessType,
    categories: IndexMap<EndUseCategory, EndUseShare>,
}

impl EndUseBreakdown {
    pub fn business_type(&self) -> BusinessType {
        self.business_type
    }

    pub fn kwh(&self, category: EndUseCategory) -> Option<f64> {
        self.categories.get(&category).map(|share| share.kwh)
    }

    pub fn source(&self, category: EndUseCategory) -> Option<EstimateSource> {
        self.categories.get(&category).map(|share| share.source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EndUseCategory, &EndUseShare)> {
        self.categories.iter().map(|(category, share)| (*category, share))
    }

    pub fn categories(&self) -> impl Iterator<Item = EndUseCategory> + '_ {
        self.categories.keys().copied()
    }

    pub fn total_kwh(&self) -> f64 {
        self.categories.values().map(|share| share.kwh).sum()
    }

    pub fn has_equipment_derived_values(&self) -> bool {
        self.categories
            .values()
            .any(|share| share.source == EstimateSource::EquipmentDerived)
    }

    /// The category with the largest energy use; the first listed wins a tie.
    pub fn largest_category(&self) -> Option<(EndUseCategory, f64)> {
        self.categories
            .iter()
            .fold(None, |largest: Option<(EndUseCategory, f64)>, (category, share)| {
                match largest {
                    Some((_, kwh)) if kwh >= share.kwh => largest,
                    _ => Some((*category, share.kwh)),
                }
            })
    }
}

fn is_usable_energy(annual_energy_use_kwh: f64) -> bool {
    annual_energy_use_kwh.is_finite() && annual_energy_use_kwh > 0.
}

/// Splits annual energy use into end-use categories using the business type's percentage table.
pub fn decompose(
    business_type: BusinessType,
    annual_energy_use_kwh: f64,
) -> Option<EndUseBreakdown> {
    decompose_hybrid(business_type, annual_energy_use_kwh, None)
}

/// As [decompose], but substitutes equipment-derived figures for HVAC, lighting and the
/// equipment-driven bucket wherever those figures are positive.
pub fn decompose_hybrid(
    business_type: BusinessType,
    annual_energy_use_kwh: f64,
    equipment: Option<&EquipmentTotals>,
) -> Option<EndUseBreakdown> {
    if !is_usable_energy(annual_energy_use_kwh) {
        return None;
    }

    let split = end_use_split(business_type);
    let equipment_bucket = EQUIPMENT_LOAD_PRECEDENCE
        .into_iter()
        .find(|candidate| split.iter().any(|(category, _)| category == candidate));

    let categories = split
        .iter()
        .map(|&(category, fraction)| {
            let equipment_kwh = equipment.and_then(|totals| match category {
                EndUseCategory::Hvac => Some(totals.hvac_kwh),
                EndUseCategory::Lighting => Some(totals.lighting_kwh),
                _ if Some(category) == equipment_bucket => Some(totals.equipment_kwh),
                _ => None,
            });
            let share = match equipment_kwh {
                Some(kwh) if kwh > 0. => EndUseShare {
                    kwh,
                    source: EstimateSource::EquipmentDerived,
                },
                _ => EndUseShare {
                    kwh: annual_energy_use_kwh * fraction,
                    source: EstimateSource::Estimated,
                },
            };
            (category, share)
        })
        .collect::<IndexMap<_, _>>();

    let breakdown = EndUseBreakdown {
        business_type,
        categories,
    };
    if breakdown.has_equipment_derived_values() {
        debug!(
            "End-use breakdown for {business_type} uses equipment-derived figures, total {} kWh against {} kWh benchmark",
            breakdown.total_kwh(),
            annual_energy_use_kwh
        );
    }

    Some(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use strum::IntoEnumIterator;

    fn equipment_totals(hvac_kwh: f64, lighting_kwh: f64, equipment_kwh: f64) -> EquipmentTotals {
        EquipmentTotals {
            hvac_kwh,
            lighting_kwh,
            equipment_kwh,
            total_kwh: hvac_kwh + lighting_kwh + equipment_kwh,
            ..Default::default()
        }
    }

    #[rstest]
    fn test_office_breakdown() {
        let breakdown = decompose(BusinessType::Office, 140_000.).unwrap();
        assert_eq!(
            breakdown.categories().collect::<Vec<_>>(),
            vec![
                EndUseCategory::Lighting,
                EndUseCategory::Hvac,
                EndUseCategory::PlugLoads
            ]
        );
        assert_relative_eq!(breakdown.kwh(EndUseCategory::Lighting).unwrap(), 49_000.);
        assert_relative_eq!(breakdown.kwh(EndUseCategory::Hvac).unwrap(), 56_000.);
        assert_relative_eq!(breakdown.kwh(EndUseCategory::PlugLoads).unwrap(), 35_000.);
        assert_eq!(breakdown.kwh(EndUseCategory::Refrigeration), None);
    }

    #[rstest]
    fn test_percentage_breakdown_sums_to_annual_energy() {
        for business_type in BusinessType::iter() {
            let breakdown = decompose(business_type, 123_456.78).unwrap();
            assert_relative_eq!(breakdown.total_kwh(), 123_456.78, epsilon = 1e-6);
            assert!(!breakdown.has_equipment_derived_values());
        }
    }

    #[rstest]
    #[case(0.)]
    #[case(-1.)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_unusable_energy_is_unavailable(#[case] annual_energy_use_kwh: f64) {
        assert_eq!(decompose(BusinessType::Retail, annual_energy_use_kwh), None);
    }

    #[rstest]
    fn test_hybrid_breakdown_substitutes_and_does_not_renormalise() {
        let totals = equipment_totals(60_000., 20_000., 0.);
        let breakdown =
            decompose_hybrid(BusinessType::Office, 140_000., Some(&totals)).unwrap();

        assert_eq!(breakdown.kwh(EndUseCategory::Hvac), Some(60_000.));
        assert_eq!(
            breakdown.source(EndUseCategory::Hvac),
            Some(EstimateSource::EquipmentDerived)
        );
        assert_eq!(breakdown.kwh(EndUseCategory::Lighting), Some(20_000.));
        assert_relative_eq!(breakdown.kwh(EndUseCategory::PlugLoads).unwrap(), 35_000.);
        assert_eq!(
            breakdown.source(EndUseCategory::PlugLoads),
            Some(EstimateSource::Estimated)
        );
        assert_relative_eq!(breakdown.total_kwh(), 115_000.);
    }

    #[rstest]
    fn test_equipment_load_goes_to_refrigeration_before_plug_loads() {
        let totals = equipment_totals(0., 0., 30_000.);
        let breakdown =
            decompose_hybrid(BusinessType::Restaurant, 380_000., Some(&totals)).unwrap();

        assert_eq!(breakdown.kwh(EndUseCategory::Refrigeration), Some(30_000.));
        assert_eq!(
            breakdown.source(EndUseCategory::PlugLoads),
            Some(EstimateSource::Estimated)
        );
        assert_relative_eq!(breakdown.kwh(EndUseCategory::PlugLoads).unwrap(), 114_000.);
        assert_eq!(
            breakdown.source(EndUseCategory::Hvac),
            Some(EstimateSource::Estimated)
        );
    }

    #[rstest]
    fn test_equipment_load_goes_to_process_for_manufacturing() {
        let totals = equipment_totals(0., 0., 500_000.);
        let breakdown =
            decompose_hybrid(BusinessType::Manufacturing, 1_000_000., Some(&totals)).unwrap();

        assert_eq!(breakdown.kwh(EndUseCategory::Process), Some(500_000.));
        assert_eq!(
            breakdown.source(EndUseCategory::PlugLoads),
            Some(EstimateSource::Estimated)
        );
    }

    #[rstest]
    fn test_largest_category() {
        let breakdown = decompose(BusinessType::Office, 140_000.).unwrap();
        let (category, kwh) = breakdown.largest_category().unwrap();
        assert_eq!(category, EndUseCategory::Hvac);
        assert_relative_eq!(kwh, 56_000.);
    }

    #[rstest]
    fn test_breakdown_serialises_with_labels() {
        let breakdown = decompose(BusinessType::Office, 100.).unwrap();
        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["business_type"], "Office");
        assert_eq!(json["categories"]["Plug Loads"]["source"], "estimated");
    }
}
