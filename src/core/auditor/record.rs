use crate::core::ecm::{Payback, Priority};
use crate::core::equipment::EquipmentInventory;
use crate::core::units::{annual_operating_hours, DAYS_PER_WEEK, HOURS_PER_DAY};
use crate::input::{BusinessType, ConstructionYearBand};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use uuid::Uuid;

pub type AuditId = Uuid;
pub type FindingId = Uuid;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OperatingSchedule {
    pub hours_per_day: f64,
    pub days_per_week: f64,
}

impl Default for OperatingSchedule {
    fn default() -> Self {
        Self {
            hours_per_day: 10.,
            days_per_week: 5.,
        }
    }
}

impl OperatingSchedule {
    pub fn is_valid(&self) -> bool {
        (0. ..=HOURS_PER_DAY as f64).contains(&self.hours_per_day)
            && (0. ..=DAYS_PER_WEEK as f64).contains(&self.days_per_week)
    }

    pub fn annual_hours(&self) -> f64 {
        annual_operating_hours(self.hours_per_day, self.days_per_week)
    }

    /// Share of the week the building is unoccupied.
    pub fn unoccupied_fraction(&self) -> f64 {
        let weekly_hours = (HOURS_PER_DAY * DAYS_PER_WEEK) as f64;
        (1. - self.hours_per_day * self.days_per_week / weekly_hours).clamp(0., 1.)
    }
}

/// Site information gathered for an on-site audit. Everything is optional until inspected.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditBuildingInfo {
    pub business_name: String,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub business_type: Option<BusinessType>,
    pub floor_area_sq_ft: Option<f64>,
    pub zip_code: Option<String>,
    pub construction_year: Option<ConstructionYearBand>,
    pub schedule: OperatingSchedule,
    pub has_programmable_thermostat: bool,
    /// $/kWh from the customer's bill, overriding the state average
    pub electricity_rate: Option<f64>,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
pub enum FindingCategory {
    #[serde(rename = "HVAC")]
    #[strum(serialize = "HVAC")]
    Hvac,
    Lighting,
    Envelope,
    Refrigeration,
    #[serde(rename = "Motors and Drives")]
    #[strum(serialize = "Motors and Drives")]
    Motors,
    #[serde(rename = "Plug Loads")]
    #[strum(serialize = "Plug Loads")]
    PlugLoads,
    #[serde(rename = "Water Heating")]
    #[strum(serialize = "Water Heating")]
    WaterHeating,
    Other,
}

/// Something the auditor observed on site.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Finding {
    #[serde(default = "Uuid::new_v4")]
    pub id: FindingId,
    pub category: FindingCategory,
    pub description: String,
    #[serde(default = "default_finding_priority")]
    pub priority: Priority,
    /// the auditor's own estimate, in $ per year
    #[serde(default)]
    pub estimated_annual_savings_usd: Option<f64>,
    #[serde(default)]
    pub estimated_cost_usd: Option<f64>,
}

fn default_finding_priority() -> Priority {
    Priority::Medium
}

impl Finding {
    pub fn new(category: FindingCategory, description: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            description: description.to_string(),
            priority: default_finding_priority(),
            estimated_annual_savings_usd: None,
            estimated_cost_usd: None,
        }
    }

    pub fn with_estimates(self, annual_savings_usd: f64, cost_usd: f64) -> Self {
        Self {
            estimated_annual_savings_usd: Some(annual_savings_usd),
            estimated_cost_usd: Some(cost_usd),
            ..self
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditorEcmSource {
    Template { template_id: String },
    Finding { finding_id: FindingId },
}

/// A recommendation generated from an audit, with low/high savings and cost estimates.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AuditorEcm {
    pub source: AuditorEcmSource,
    pub title: String,
    pub description: String,
    pub category: FindingCategory,
    pub annual_savings_low_usd: f64,
    pub annual_savings_high_usd: f64,
    pub cost_low_usd: f64,
    pub cost_high_usd: f64,
    pub priority: Priority,
    pub payback: Payback,
}

impl AuditorEcm {
    pub fn average_annual_savings_usd(&self) -> f64 {
        (self.annual_savings_low_usd + self.annual_savings_high_usd) / 2.
    }

    pub fn average_cost_usd(&self) -> f64 {
        (self.cost_low_usd + self.cost_high_usd) / 2.
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum AuditPhase {
    #[default]
    #[serde(rename = "Pre-Installation")]
    #[strum(serialize = "Pre-Installation")]
    PreInstallation,
    #[serde(rename = "Post-Installation")]
    #[strum(serialize = "Post-Installation")]
    PostInstallation,
}

/// A snapshot of an on-site audit. Edits produce a new snapshot; the store keeps the latest.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditRecord {
    pub id: AuditId,
    pub name: String,
    #[serde(default)]
    pub phase: AuditPhase,
    /// the pre-installation audit this one was derived from
    #[serde(default)]
    pub derived_from: Option<AuditId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub auditor_name: Option<String>,
    #[serde(default)]
    pub building: AuditBuildingInfo,
    #[serde(default)]
    pub equipment: EquipmentInventory,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub generated_ecms: Vec<AuditorEcm>,
}

impl AuditRecord {
    pub fn new(name: &str, building: AuditBuildingInfo, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phase: AuditPhase::PreInstallation,
            derived_from: None,
            created_at: now,
            updated_at: now,
            auditor_name: None,
            building,
            equipment: EquipmentInventory::default(),
            findings: vec![],
            notes: None,
            generated_ecms: vec![],
        }
    }

    pub fn with_equipment(&self, equipment: EquipmentInventory, now: DateTime<Utc>) -> Self {
        Self {
            equipment,
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn with_finding(&self, finding: Finding, now: DateTime<Utc>) -> Self {
        let mut findings = self.findings.clone();
        findings.push(finding);
        Self {
            findings,
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn with_generated_ecms(&self, generated_ecms: Vec<AuditorEcm>, now: DateTime<Utc>) -> Self {
        Self {
            generated_ecms,
            updated_at: now,
            ..self.clone()
        }
    }

    /// A full copy under a fresh id.
    pub fn duplicate(&self, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: format!("{} (Copy)", self.name),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Starts a post-installation audit of the same site. Only the building information and
    /// operating schedule carry over; equipment, findings, notes and recommendations are
    /// re-inspected.
    pub fn derive_post_installation(&self, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: format!("{} (Post-Installation)", self.name),
            phase: AuditPhase::PostInstallation,
            derived_from: Some(self.id),
            created_at: now,
            updated_at: now,
            auditor_name: self.auditor_name.clone(),
            building: self.building.clone(),
            equipment: EquipmentInventory::default(),
            findings: vec![],
            notes: None,
            generated_ecms: vec![],
        }
    }

    /// Clears everything gathered so far, keeping the record's identity.
    pub fn reset(&self, now: DateTime<Utc>) -> Self {
        Self {
            auditor_name: None,
            building: AuditBuildingInfo::default(),
            equipment: EquipmentInventory::default(),
            findings: vec![],
            notes: None,
            generated_ecms: vec![],
            updated_at: now,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[fixture]
    fn later() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 15, 30, 0).unwrap()
    }

    #[fixture]
    fn record(created: DateTime<Utc>) -> AuditRecord {
        let building = AuditBuildingInfo {
            business_name: "Corner Bistro".to_string(),
            business_type: Some(BusinessType::Restaurant),
            floor_area_sq_ft: Some(3_500.),
            schedule: OperatingSchedule {
                hours_per_day: 14.,
                days_per_week: 7.,
            },
            ..Default::default()
        };
        AuditRecord::new("Bistro walkthrough", building, created)
            .with_finding(Finding::new(FindingCategory::Envelope, "Gap under rear door"), created)
    }

    #[rstest]
    fn test_duplicate_is_a_full_copy(record: AuditRecord, later: DateTime<Utc>) {
        let copy = record.duplicate(later);
        assert_ne!(copy.id, record.id);
        assert_eq!(copy.name, "Bistro walkthrough (Copy)");
        assert_eq!(copy.building, record.building);
        assert_eq!(copy.findings, record.findings);
        assert_eq!(copy.created_at, later);
    }

    #[rstest]
    fn test_post_installation_carries_over_site_context(record: AuditRecord, later: DateTime<Utc>) {
        let post = record.derive_post_installation(later);
        assert_ne!(post.id, record.id);
        assert_eq!(post.phase, AuditPhase::PostInstallation);
        assert_eq!(post.derived_from, Some(record.id));
        assert_eq!(post.building, record.building);
        assert_eq!(post.building.schedule.hours_per_day, 14.);
        assert!(post.findings.is_empty());
        assert!(post.equipment.is_empty());
        assert!(post.generated_ecms.is_empty());
        // the original snapshot is untouched
        assert_eq!(record.findings.len(), 1);
    }

    #[rstest]
    fn test_reset_keeps_identity(record: AuditRecord, later: DateTime<Utc>) {
        let reset = record.reset(later);
        assert_eq!(reset.id, record.id);
        assert_eq!(reset.name, record.name);
        assert_eq!(reset.created_at, record.created_at);
        assert_eq!(reset.updated_at, later);
        assert_eq!(reset.building, AuditBuildingInfo::default());
        assert!(reset.findings.is_empty());
    }

    #[rstest]
    fn test_schedule() {
        let schedule = OperatingSchedule::default();
        assert!(schedule.is_valid());
        assert_eq!(schedule.annual_hours(), 2_600.);
        assert_eq!(schedule.unoccupied_fraction(), 1. - 50. / 168.);
        assert!(!OperatingSchedule {
            hours_per_day: 25.,
            days_per_week: 5.
        }
        .is_valid());
    }

    #[rstest]
    fn test_record_json_round_trip(record: AuditRecord) {
        let json = serde_json::to_string(&record).unwrap();
        let parsed: AuditRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
