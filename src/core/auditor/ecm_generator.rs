//! Recommendations generated from what an auditor recorded on site.
//!
//! A fixed, ordered list of templates each pair a trigger over the audit record with a
//! calculator for low/high savings and cost. Manually recorded findings that carry their own
//! savings estimate become recommendations too.

use crate::core::auditor::record::{
    AuditRecord, AuditorEcm, AuditorEcmSource, Finding, FindingCategory,
};
use crate::core::baseline::estimate_baseline;
use crate::core::ecm::{sort_by_priority_then_payback, Payback, Priority};
use crate::core::end_use::{decompose, EndUseCategory};
use crate::core::equipment::{hvac, lighting, major_equipment};
use crate::core::reference_data::climate::state_from_zip;
use crate::core::reference_data::utility_rates::electricity_rate;
use crate::core::units::kw_to_tons;
use crate::input::{EquipmentCondition, HvacUnit, LightingControl, LightingZone, MajorEquipmentItem};
use tracing::{debug, instrument};

/// Recommendations saving less than this, in $ per year, are not worth presenting.
pub const MIN_ANNUAL_SAVINGS_USD: f64 = 50.;
pub const MAX_PAYBACK_YEARS: f64 = 25.;

const FINDING_SAVINGS_UNCERTAINTY: f64 = 0.3;
const FINDING_COST_UNCERTAINTY: f64 = 0.2;

const HVAC_REPLACEMENT_MIN_AGE_YEARS: f64 = 15.;
const REFRIGERATION_UPGRADE_MIN_AGE_YEARS: f64 = 10.;

/// What a template calculator produces, in $ and $ per year.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimateRange {
    pub savings_low: f64,
    pub savings_high: f64,
    pub cost_low: f64,
    pub cost_high: f64,
    pub priority: Priority,
}

/// Figures the templates scale their estimates from.
pub struct SiteContext<'a> {
    pub record: &'a AuditRecord,
    /// $ per kWh
    pub electricity_rate: f64,
    pub hvac_annual_cost_usd: f64,
}

impl<'a> SiteContext<'a> {
    /// HVAC cost is the benchmark share for the building type and floor area. Recorded units
    /// only decide which share of it a measure addresses.
    pub fn new(record: &'a AuditRecord) -> Self {
        let building = &record.building;
        let rate = building
            .electricity_rate
            .filter(|rate| *rate > 0.)
            .unwrap_or_else(|| electricity_rate(building.zip_code.as_deref().and_then(state_from_zip)));

        let hvac_kwh = building
            .business_type
            .zip(building.floor_area_sq_ft)
            .and_then(|(business_type, floor_area)| {
                estimate_baseline(
                    business_type,
                    floor_area,
                    building.construction_year,
                    building.zip_code.as_deref(),
                )
            })
            .and_then(|baseline| decompose(baseline.business_type, baseline.annual_energy_use_kwh))
            .and_then(|breakdown| breakdown.kwh(EndUseCategory::Hvac))
            .unwrap_or(0.);
        debug!("benchmark HVAC use for auditor templates: {hvac_kwh:.0} kWh/yr");

        Self {
            record,
            electricity_rate: rate,
            hvac_annual_cost_usd: hvac_kwh * rate,
        }
    }

    fn hvac_capacity_kw(&self, filter: impl Fn(&HvacUnit) -> bool) -> f64 {
        self.record
            .equipment
            .hvac_units
            .iter()
            .filter(|unit| filter(unit))
            .map(hvac::capacity_kw)
            .sum()
    }

    /// Share of installed HVAC capacity matching `filter`.
    fn hvac_capacity_share(&self, filter: impl Fn(&HvacUnit) -> bool) -> f64 {
        let total = self.hvac_capacity_kw(|_| true);
        if total > 0. {
            self.hvac_capacity_kw(filter) / total
        } else {
            0.
        }
    }

    fn lighting_cost(&self, filter: impl Fn(&LightingZone) -> bool) -> f64 {
        self.record
            .equipment
            .lighting_zones
            .iter()
            .filter(|zone| filter(zone))
            .map(lighting::zone_annual_kwh)
            .sum::<f64>()
            * self.electricity_rate
    }

    fn equipment_cost(&self, filter: impl Fn(&MajorEquipmentItem) -> bool) -> f64 {
        self.major_equipment(filter).map(major_equipment::item_annual_kwh).sum::<f64>()
            * self.electricity_rate
    }

    fn major_equipment(
        &self,
        filter: impl Fn(&MajorEquipmentItem) -> bool,
    ) -> impl Iterator<Item = &MajorEquipmentItem> {
        self.record
            .equipment
            .major_equipment
            .iter()
            .filter(move |item| filter(item))
    }
}

fn is_aged_hvac(unit: &HvacUnit) -> bool {
    unit.age_years.is_some_and(|age| age >= HVAC_REPLACEMENT_MIN_AGE_YEARS)
}

fn needs_hvac_service(unit: &HvacUnit) -> bool {
    matches!(unit.condition, EquipmentCondition::Fair | EquipmentCondition::Poor)
}

fn has_legacy_fixtures(zone: &LightingZone) -> bool {
    zone.fixture_type.is_some_and(|fixture_type| !fixture_type.is_led())
}

fn lacks_lighting_controls(zone: &LightingZone) -> bool {
    matches!(zone.control, LightingControl::Manual | LightingControl::None)
}

fn is_motor_without_vfd(item: &MajorEquipmentItem) -> bool {
    item.equipment_type.is_motor_driven() && !item.has_vfd
}

fn is_aged_refrigeration(item: &MajorEquipmentItem) -> bool {
    item.equipment_type.is_refrigeration()
        && item.age_years.is_some_and(|age| age >= REFRIGERATION_UPGRADE_MIN_AGE_YEARS)
}

fn has_envelope_finding(record: &AuditRecord) -> bool {
    record
        .findings
        .iter()
        .any(|finding| finding.category == FindingCategory::Envelope)
}

struct EcmTemplate {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    category: FindingCategory,
    applies: fn(&AuditRecord) -> bool,
    calculate: fn(&SiteContext) -> EstimateRange,
}

const ECM_TEMPLATES: &[EcmTemplate] = &[
    EcmTemplate {
        id: "hvac-replacement",
        title: "Replace aging HVAC equipment",
        description: "Units 15 or more years old are well past their efficient life; replace with high-efficiency equipment.",
        category: FindingCategory::Hvac,
        applies: |record| record.equipment.hvac_units.iter().any(is_aged_hvac),
        calculate: |site| {
            let share = site.hvac_capacity_share(is_aged_hvac);
            let tons = kw_to_tons(site.hvac_capacity_kw(is_aged_hvac));
            EstimateRange {
                savings_low: site.hvac_annual_cost_usd * share * 0.20,
                savings_high: site.hvac_annual_cost_usd * share * 0.35,
                cost_low: tons * 1_500.,
                cost_high: tons * 2_500.,
                priority: Priority::Medium,
            }
        },
    },
    EcmTemplate {
        id: "hvac-tune-up",
        title: "HVAC tune-up and maintenance",
        description: "Clean coils, replace filters and check refrigerant charge on units in fair or poor condition.",
        category: FindingCategory::Hvac,
        applies: |record| record.equipment.hvac_units.iter().any(needs_hvac_service),
        calculate: |site| {
            let share = site.hvac_capacity_share(needs_hvac_service);
            let units = site
                .record
                .equipment
                .hvac_units
                .iter()
                .filter(|unit| needs_hvac_service(unit))
                .count() as f64;
            EstimateRange {
                savings_low: site.hvac_annual_cost_usd * share * 0.05,
                savings_high: site.hvac_annual_cost_usd * share * 0.15,
                cost_low: units * 300.,
                cost_high: units * 600.,
                priority: Priority::High,
            }
        },
    },
    EcmTemplate {
        id: "led-retrofit",
        title: "LED lighting retrofit",
        description: "Replace fluorescent, HID and incandescent fixtures with LED.",
        category: FindingCategory::Lighting,
        applies: |record| record.equipment.lighting_zones.iter().any(has_legacy_fixtures),
        calculate: |site| {
            let annual_cost = site.lighting_cost(has_legacy_fixtures);
            let fixtures = site
                .record
                .equipment
                .lighting_zones
                .iter()
                .filter(|zone| has_legacy_fixtures(zone))
                .map(|zone| zone.fixture_count as f64)
                .sum::<f64>();
            EstimateRange {
                savings_low: annual_cost * 0.40,
                savings_high: annual_cost * 0.60,
                cost_low: fixtures * 75.,
                cost_high: fixtures * 150.,
                priority: Priority::High,
            }
        },
    },
    EcmTemplate {
        id: "lighting-controls",
        title: "Add lighting controls",
        description: "Fit occupancy or daylight sensors to zones that are switched manually or left on.",
        category: FindingCategory::Lighting,
        applies: |record| record.equipment.lighting_zones.iter().any(lacks_lighting_controls),
        calculate: |site| {
            let annual_cost = site.lighting_cost(lacks_lighting_controls);
            let zones = site
                .record
                .equipment
                .lighting_zones
                .iter()
                .filter(|zone| lacks_lighting_controls(zone))
                .count() as f64;
            EstimateRange {
                savings_low: annual_cost * 0.20,
                savings_high: annual_cost * 0.30,
                cost_low: zones * 400.,
                cost_high: zones * 800.,
                priority: Priority::Medium,
            }
        },
    },
    EcmTemplate {
        id: "programmable-thermostat",
        title: "Install programmable thermostats",
        description: "Set back heating and cooling when the building is unoccupied.",
        category: FindingCategory::Hvac,
        applies: |record| !record.building.has_programmable_thermostat,
        calculate: |site| {
            let unoccupied = site.record.building.schedule.unoccupied_fraction();
            let thermostats = site.record.equipment.hvac_units.len().max(1) as f64;
            EstimateRange {
                savings_low: site.hvac_annual_cost_usd * unoccupied * 0.15,
                savings_high: site.hvac_annual_cost_usd * unoccupied * 0.25,
                cost_low: thermostats * 200.,
                cost_high: thermostats * 400.,
                priority: Priority::High,
            }
        },
    },
    EcmTemplate {
        id: "weatherization",
        title: "Weatherization and air sealing",
        description: "Seal the envelope deficiencies recorded during the walkthrough.",
        category: FindingCategory::Envelope,
        applies: has_envelope_finding,
        calculate: |site| {
            let floor_area = site.record.building.floor_area_sq_ft.unwrap_or(0.);
            EstimateRange {
                savings_low: site.hvac_annual_cost_usd * 0.05,
                savings_high: site.hvac_annual_cost_usd * 0.10,
                cost_low: floor_area * 0.25,
                cost_high: floor_area * 0.75,
                priority: Priority::Medium,
            }
        },
    },
    EcmTemplate {
        id: "vfd-retrofit",
        title: "Variable frequency drives",
        description: "Fit VFDs to motor-driven equipment running without speed control.",
        category: FindingCategory::Motors,
        applies: |record| record.equipment.major_equipment.iter().any(is_motor_without_vfd),
        calculate: |site| {
            let annual_cost = site.equipment_cost(is_motor_without_vfd);
            let motor_kw = site
                .major_equipment(is_motor_without_vfd)
                .map(|item| item.power_rating_kw * item.quantity as f64)
                .sum::<f64>();
            EstimateRange {
                savings_low: annual_cost * 0.20,
                savings_high: annual_cost * 0.35,
                cost_low: motor_kw * 150.,
                cost_high: motor_kw * 300.,
                priority: Priority::Medium,
            }
        },
    },
    EcmTemplate {
        id: "refrigeration-upgrade",
        title: "Refrigeration upgrades",
        description: "EC fan motors, door gaskets and controls for refrigeration equipment 10 or more years old.",
        category: FindingCategory::Refrigeration,
        applies: |record| record.equipment.major_equipment.iter().any(is_aged_refrigeration),
        calculate: |site| {
            let annual_cost = site.equipment_cost(is_aged_refrigeration);
            let units = site
                .major_equipment(is_aged_refrigeration)
                .map(|item| item.quantity as f64)
                .sum::<f64>();
            EstimateRange {
                savings_low: annual_cost * 0.15,
                savings_high: annual_cost * 0.30,
                cost_low: units * 1_000.,
                cost_high: units * 3_000.,
                priority: Priority::Medium,
            }
        },
    },
];

fn auditor_ecm(
    source: AuditorEcmSource,
    title: String,
    description: String,
    category: FindingCategory,
    estimate: EstimateRange,
) -> AuditorEcm {
    let mut ecm = AuditorEcm {
        source,
        title,
        description,
        category,
        annual_savings_low_usd: estimate.savings_low,
        annual_savings_high_usd: estimate.savings_high,
        cost_low_usd: estimate.cost_low,
        cost_high_usd: estimate.cost_high,
        priority: estimate.priority,
        payback: Payback::NoPayback,
    };
    ecm.payback =
        Payback::from_cost_and_savings(ecm.average_cost_usd(), ecm.average_annual_savings_usd())
            .capped_at(MAX_PAYBACK_YEARS);
    ecm
}

/// A finding with its own savings estimate, widened into a low/high band.
fn finding_ecm(finding: &Finding) -> Option<AuditorEcm> {
    let savings = finding
        .estimated_annual_savings_usd
        .filter(|savings| *savings >= MIN_ANNUAL_SAVINGS_USD)?;
    let cost = finding.estimated_cost_usd.unwrap_or(0.);

    Some(auditor_ecm(
        AuditorEcmSource::Finding {
            finding_id: finding.id,
        },
        format!("{} finding", finding.category),
        finding.description.clone(),
        finding.category,
        EstimateRange {
            savings_low: savings * (1. - FINDING_SAVINGS_UNCERTAINTY),
            savings_high: savings * (1. + FINDING_SAVINGS_UNCERTAINTY),
            cost_low: cost * (1. - FINDING_COST_UNCERTAINTY),
            cost_high: cost * (1. + FINDING_COST_UNCERTAINTY),
            priority: finding.priority,
        },
    ))
}

/// Generates recommendations for an audit, sorted by priority then payback.
#[instrument(skip_all, fields(audit = %record.id))]
pub fn generate(record: &AuditRecord) -> Vec<AuditorEcm> {
    let site = SiteContext::new(record);

    let templated = ECM_TEMPLATES
        .iter()
        .filter(|template| (template.applies)(record))
        .map(|template| {
            auditor_ecm(
                AuditorEcmSource::Template {
                    template_id: template.id.to_string(),
                },
                template.title.to_string(),
                template.description.to_string(),
                template.category,
                (template.calculate)(&site),
            )
        })
        .filter(|ecm| {
            let worthwhile = ecm.average_annual_savings_usd() >= MIN_ANNUAL_SAVINGS_USD;
            if !worthwhile {
                debug!(
                    "Discarding '{}': ${:.0} per year is below the minimum",
                    ecm.title,
                    ecm.average_annual_savings_usd()
                );
            }
            worthwhile
        });
    let from_findings = record.findings.iter().filter_map(finding_ecm);

    let mut ecms = templated.chain(from_findings).collect::<Vec<_>>();
    sort_by_priority_then_payback(&mut ecms, |ecm| (ecm.priority, ecm.payback));
    ecms
}
