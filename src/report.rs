//! Assembles the figures from a run into a single read-only report, together with the
//! aggregate ECM figures and rule-based insights a narrative summary is written from.

use crate::core::baseline::EnergyBaseline;
use crate::core::ecm::enhanced::EnhancedEcmAnalysis;
use crate::core::ecm::simple::SimpleEcm;
use crate::core::ecm::{
    sort_by_priority_then_payback, Payback, Priority, HIGH_PRIORITY_MAX_PAYBACK_YEARS,
};
use crate::core::end_use::{EndUseBreakdown, EndUseCategory};
use crate::core::equipment::EquipmentTotals;
use crate::core::utility_bills::UtilityReconciliation;
use crate::input::BuildingProfile;
use crate::statistics::mean;
use indexmap::IndexMap;
use serde::Serialize;
use strum::IntoEnumIterator;

/// Number of measures listed in a summary's top measures.
pub const TOP_ECM_COUNT: usize = 5;

/// Differences in EUI smaller than this percentage are reported as matching the benchmark.
const EUI_MATCH_TOLERANCE_PERCENT: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EcmSummaryItem {
    pub name: &'static str,
    pub category: EndUseCategory,
    pub energy_saved_kwh: f64,
    pub cost_saved_usd: f64,
    pub implementation_cost_usd: f64,
    pub payback: Payback,
    pub priority: Priority,
}

impl From<&SimpleEcm> for EcmSummaryItem {
    fn from(ecm: &SimpleEcm) -> Self {
        Self {
            name: ecm.name,
            category: ecm.category,
            energy_saved_kwh: ecm.energy_saved_kwh,
            cost_saved_usd: ecm.cost_saved_usd,
            implementation_cost_usd: ecm.implementation_cost_usd,
            payback: ecm.payback,
            priority: ecm.priority,
        }
    }
}

/// Aggregate figures over a set of recommended measures.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EcmSummary {
    pub ecm_count: usize,
    pub total_energy_saved_kwh: f64,
    pub total_cost_saved_usd: f64,
    pub total_implementation_cost_usd: f64,
    /// mean of the finite paybacks only
    pub average_payback: Payback,
    pub priority_counts: IndexMap<Priority, usize>,
    pub top_ecms: Vec<EcmSummaryItem>,
}

impl EcmSummary {
    pub fn from_items(mut items: Vec<EcmSummaryItem>, top_n: usize) -> Self {
        let finite_paybacks = items
            .iter()
            .filter_map(|item| item.payback.years())
            .collect::<Vec<_>>();
        let average_payback = mean(&finite_paybacks).map_or(Payback::NoPayback, Payback::Years);

        let priority_counts = Priority::iter()
            .map(|priority| {
                (
                    priority,
                    items.iter().filter(|item| item.priority == priority).count(),
                )
            })
            .collect();

        sort_by_priority_then_payback(&mut items, |item| (item.priority, item.payback));

        Self {
            ecm_count: items.len(),
            total_energy_saved_kwh: items.iter().map(|item| item.energy_saved_kwh).sum(),
            total_cost_saved_usd: items.iter().map(|item| item.cost_saved_usd).sum(),
            total_implementation_cost_usd: items
                .iter()
                .map(|item| item.implementation_cost_usd)
                .sum(),
            average_payback,
            priority_counts,
            top_ecms: items.into_iter().take(top_n).collect(),
        }
    }

    pub fn from_simple(ecms: &[SimpleEcm], top_n: usize) -> Self {
        Self::from_items(ecms.iter().map(EcmSummaryItem::from).collect(), top_n)
    }

    /// Summarises the typical figures of a range-based analysis. Savings totals include the
    /// interactive bonus; per-measure paybacks are on net cost.
    pub fn from_enhanced(analysis: &EnhancedEcmAnalysis, top_n: usize) -> Self {
        let items = analysis
            .ecms
            .iter()
            .map(|ecm| EcmSummaryItem {
                name: ecm.name,
                category: ecm.category,
                energy_saved_kwh: ecm.energy_saved_kwh.typical,
                cost_saved_usd: ecm.cost_saved_usd.typical,
                implementation_cost_usd: ecm.implementation_cost_usd.typical,
                payback: ecm.payback.typical,
                priority: ecm.priority,
            })
            .collect();

        Self {
            total_energy_saved_kwh: analysis.totals.energy_saved_kwh.typical,
            total_cost_saved_usd: analysis.totals.cost_saved_usd.typical,
            ..Self::from_items(items, top_n)
        }
    }

    pub fn count(&self, priority: Priority) -> usize {
        self.priority_counts.get(&priority).copied().unwrap_or(0)
    }
}

/// Everything a report is assembled from.
pub struct ReportParts {
    pub building: BuildingProfile,
    pub baseline: EnergyBaseline,
    pub breakdown: EndUseBreakdown,
    pub equipment_totals: Option<EquipmentTotals>,
    pub simple_ecms: Vec<SimpleEcm>,
    pub enhanced: Option<EnhancedEcmAnalysis>,
    pub utility: Option<UtilityReconciliation>,
    pub warnings: Vec<String>,
}

/// The consumer-facing result of a full run.
///
/// Headline energy and cost are the top-down baseline figures. The breakdown's own total,
/// which differs once equipment-derived figures are substituted, is carried alongside.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditReport {
    pub building: BuildingProfile,
    pub annual_energy_use_kwh: f64,
    pub annual_energy_cost_usd: f64,
    pub baseline: EnergyBaseline,
    pub breakdown: EndUseBreakdown,
    pub breakdown_total_kwh: f64,
    /// breakdown total minus the baseline annual energy use
    pub breakdown_variance_kwh: f64,
    pub equipment_totals: Option<EquipmentTotals>,
    pub simple_ecms: Vec<SimpleEcm>,
    pub enhanced: Option<EnhancedEcmAnalysis>,
    pub utility: Option<UtilityReconciliation>,
    pub summary: EcmSummary,
    pub insights: Vec<String>,
    pub warnings: Vec<String>,
}

impl AuditReport {
    pub fn new(parts: ReportParts) -> Self {
        let ReportParts {
            building,
            baseline,
            breakdown,
            equipment_totals,
            simple_ecms,
            enhanced,
            utility,
            warnings,
        } = parts;

        let summary = match &enhanced {
            Some(analysis) => EcmSummary::from_enhanced(analysis, TOP_ECM_COUNT),
            None => EcmSummary::from_simple(&simple_ecms, TOP_ECM_COUNT),
        };
        let breakdown_total_kwh = breakdown.total_kwh();
        let breakdown_variance_kwh = breakdown_total_kwh - baseline.annual_energy_use_kwh;
        let insights = derive_insights(
            &baseline,
            &breakdown,
            breakdown_variance_kwh,
            utility.as_ref(),
            &summary,
        );

        Self {
            building,
            annual_energy_use_kwh: baseline.annual_energy_use_kwh,
            annual_energy_cost_usd: baseline.annual_energy_cost_usd,
            baseline,
            breakdown,
            breakdown_total_kwh,
            breakdown_variance_kwh,
            equipment_totals,
            simple_ecms,
            enhanced,
            utility,
            summary,
            insights,
            warnings,
        }
    }
}

fn derive_insights(
    baseline: &EnergyBaseline,
    breakdown: &EndUseBreakdown,
    breakdown_variance_kwh: f64,
    utility: Option<&UtilityReconciliation>,
    summary: &EcmSummary,
) -> Vec<String> {
    let mut insights = vec![];

    let breakdown_total_kwh = breakdown.total_kwh();
    if let Some((category, kwh)) = breakdown.largest_category() {
        if breakdown_total_kwh > 0. {
            insights.push(format!(
                "{category} is the largest end use at {:.0}% of consumption ({kwh:.0} kWh/yr).",
                kwh / breakdown_total_kwh * 100.
            ));
        }
    }

    insights.push(match utility {
        Some(reconciliation) => eui_insight("Actual", reconciliation.actual_eui, baseline),
        None => eui_insight("Estimated", baseline.adjusted_eui, baseline),
    });

    if breakdown.has_equipment_derived_values() && breakdown_variance_kwh != 0. {
        insights.push(format!(
            "Equipment-based figures put total use {:.0} kWh/yr {} the benchmark estimate.",
            breakdown_variance_kwh.abs(),
            if breakdown_variance_kwh > 0. { "above" } else { "below" }
        ));
    }

    if let Some(reconciliation) = utility {
        let comparison = &reconciliation.comparison;
        insights.push(format!(
            "Actual electricity use differs from the estimate by {:+.1}% ({}). {}",
            comparison.variance_percent, comparison.assessment, comparison.note
        ));
    }

    insights.push(match summary.count(Priority::High) {
        0 => format!(
            "No measures pay back in under {HIGH_PRIORITY_MAX_PAYBACK_YEARS:.0} years."
        ),
        1 => format!(
            "1 measure pays back in under {HIGH_PRIORITY_MAX_PAYBACK_YEARS:.0} years."
        ),
        quick_wins => format!(
            "{quick_wins} measures pay back in under {HIGH_PRIORITY_MAX_PAYBACK_YEARS:.0} years."
        ),
    });

    insights
}

fn eui_insight(label: &str, eui: f64, baseline: &EnergyBaseline) -> String {
    let benchmark = baseline.base_eui;
    let difference_percent = (eui - benchmark) / benchmark * 100.;
    let comparison = if difference_percent.abs() < EUI_MATCH_TOLERANCE_PERCENT {
        "matches".to_string()
    } else if difference_percent > 0. {
        format!("is {difference_percent:.0}% above")
    } else {
        format!("is {:.0}% below", difference_percent.abs())
    };

    format!(
        "{label} EUI of {eui:.1} kWh/sq ft/yr {comparison} the {} benchmark of {benchmark:.1} kWh/sq ft/yr.",
        baseline.business_type
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::baseline::estimate_baseline;
    use crate::core::ecm::enhanced::calculate_enhanced_ecms;
    use crate::core::ecm::simple::calculate_simple_ecms;
    use crate::core::end_use::decompose;
    use crate::core::utility_bills::{reconcile, MonthlyBill, UtilityBillRecord};
    use crate::input::{BusinessType, ConstructionYearBand};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn office() -> ReportParts {
        let building = BuildingProfile::new(BusinessType::Office, 10_000.);
        let baseline = building.baseline().unwrap();
        let breakdown = decompose(BusinessType::Office, baseline.annual_energy_use_kwh).unwrap();
        ReportParts {
            simple_ecms: calculate_simple_ecms(&baseline, &breakdown),
            building,
            baseline,
            breakdown,
            equipment_totals: None,
            enhanced: None,
            utility: None,
            warnings: vec![],
        }
    }

    #[rstest]
    fn test_office_summary(office: ReportParts) {
        let report = AuditReport::new(office);
        let summary = &report.summary;

        assert_relative_eq!(report.annual_energy_use_kwh, 140_000., max_relative = 1e-9);
        assert_relative_eq!(report.annual_energy_cost_usd, 21_000., max_relative = 1e-9);
        assert_relative_eq!(report.breakdown_variance_kwh, 0., epsilon = 1e-6);

        assert_eq!(summary.ecm_count, 4);
        assert_relative_eq!(summary.total_energy_saved_kwh, 45_500., max_relative = 1e-9);
        assert_relative_eq!(summary.total_cost_saved_usd, 6_825., max_relative = 1e-9);
        assert_relative_eq!(summary.total_implementation_cost_usd, 15_000., max_relative = 1e-9);
        assert_relative_eq!(
            summary.average_payback.years().unwrap(),
            (1_000. / 1_050. + 1_500. / 1_260. + 7_500. / 3_675. + 5_000. / 840.) / 4.,
            max_relative = 1e-9
        );
        assert_eq!(
            summary.priority_counts,
            IndexMap::from([(Priority::High, 2), (Priority::Medium, 1), (Priority::Low, 1)])
        );
        assert_eq!(
            summary.top_ecms.iter().map(|item| item.name).collect::<Vec<_>>(),
            vec![
                "Plug Load Reduction",
                "HVAC Tune-up",
                "LED Lighting Upgrade",
                "Weatherization"
            ]
        );
    }

    #[rstest]
    fn test_office_insights(office: ReportParts) {
        let report = AuditReport::new(office);
        assert_eq!(
            report.insights,
            vec![
                "HVAC is the largest end use at 40% of consumption (56000 kWh/yr).",
                "Estimated EUI of 14.0 kWh/sq ft/yr matches the Office benchmark of 14.0 kWh/sq ft/yr.",
                "2 measures pay back in under 2 years.",
            ]
        );
    }

    #[rstest]
    fn test_adjusted_eui_insight() {
        let baseline = estimate_baseline(
            BusinessType::Office,
            10_000.,
            Some(ConstructionYearBand::Before2000),
            None,
        )
        .unwrap();
        assert_eq!(
            eui_insight("Estimated", baseline.adjusted_eui, &baseline),
            "Estimated EUI of 16.1 kWh/sq ft/yr is 15% above the Office benchmark of 14.0 kWh/sq ft/yr."
        );
    }

    #[rstest]
    fn test_top_n_is_limited_and_ordered() {
        let ecms = vec![
            SimpleEcm::new("Slow", EndUseCategory::Hvac, 1_000., 100., 1_000.),
            SimpleEcm::new("Nothing saved", EndUseCategory::Hvac, 0., 0., 1_000.),
            SimpleEcm::new("Quick", EndUseCategory::Lighting, 1_000., 1_000., 500.),
        ];
        let summary = EcmSummary::from_simple(&ecms, 2);

        assert_eq!(summary.ecm_count, 3);
        assert_eq!(
            summary.top_ecms.iter().map(|item| item.name).collect::<Vec<_>>(),
            vec!["Quick", "Slow"]
        );
        // no-payback measures are left out of the average
        assert_eq!(summary.average_payback, Payback::Years((0.5 + 10.) / 2.));
    }

    #[rstest]
    fn test_empty_summary() {
        let summary = EcmSummary::from_simple(&[], TOP_ECM_COUNT);
        assert_eq!(summary.ecm_count, 0);
        assert_eq!(summary.average_payback, Payback::NoPayback);
        assert_eq!(summary.count(Priority::High), 0);
        assert!(summary.top_ecms.is_empty());
    }

    #[rstest]
    fn test_enhanced_summary_includes_interactive_bonus(office: ReportParts) {
        let analysis = calculate_enhanced_ecms(&office.baseline, &office.breakdown);
        let report = AuditReport::new(ReportParts {
            enhanced: Some(analysis.clone()),
            ..office
        });

        assert_eq!(report.summary.ecm_count, analysis.ecms.len());
        assert_eq!(
            report.summary.total_cost_saved_usd,
            analysis.totals.cost_saved_usd.typical
        );
        assert!(
            report.summary.total_energy_saved_kwh
                > analysis.ecms.iter().map(|ecm| ecm.energy_saved_kwh.typical).sum::<f64>()
        );
    }

    #[rstest]
    fn test_utility_insights(office: ReportParts) {
        let record = UtilityBillRecord {
            months: [MonthlyBill {
                electricity_kwh: Some(130_000. / 12.),
                ..Default::default()
            }; 12],
        };
        let reconciliation = reconcile(&record, 10_000., office.baseline.annual_energy_use_kwh);
        let report = AuditReport::new(ReportParts {
            utility: Some(reconciliation),
            ..office
        });

        assert_eq!(
            report.insights[1],
            "Actual EUI of 13.0 kWh/sq ft/yr is 7% below the Office benchmark of 14.0 kWh/sq ft/yr."
        );
        assert!(report.insights[2]
            .starts_with("Actual electricity use differs from the estimate by -7.1% (within expected range)."));
    }
}
