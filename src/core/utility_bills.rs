//! Actual utility bills: monthly totals, actual EUI and the comparison against the benchmark
//! estimate.

use crate::core::units::{therms_to_kwh, MONTHS_PER_YEAR, MONTH_NAMES};
use crate::read_utility_file::ParsedUtilityData;
use crate::statistics::{mean, outliers_against_mean};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::{debug, instrument};

/// Months above this multiple of the entered-months average are flagged.
const OUTLIER_HIGH_RATIO: f64 = 3.;
/// Months below this fraction of the entered-months average are flagged.
const OUTLIER_LOW_RATIO: f64 = 0.2;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MonthlyBill {
    #[serde(default)]
    pub electricity_kwh: Option<f64>,
    #[serde(default)]
    pub electricity_cost: Option<f64>,
    #[serde(default)]
    pub gas_therms: Option<f64>,
    #[serde(default)]
    pub gas_cost: Option<f64>,
}

impl MonthlyBill {
    pub fn has_electricity(&self) -> bool {
        self.electricity_kwh.is_some()
    }

    pub fn has_gas(&self) -> bool {
        self.gas_therms.is_some()
    }
}

/// Twelve calendar months of bills, January first.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UtilityBillRecord {
    pub months: [MonthlyBill; MONTHS_PER_YEAR],
}

impl UtilityBillRecord {
    /// Returns a copy with the bill for `month` (1 to 12) replaced. Other months are ignored.
    pub fn with_month(&self, month: u32, bill: MonthlyBill) -> Self {
        let mut months = self.months;
        if let Some(slot) = months.get_mut((month as usize).wrapping_sub(1)) {
            *slot = bill;
        }
        Self { months }
    }

    /// Folds imported rows into calendar months. When rows span several years only the most
    /// recent year is used; rows without a year are taken as belonging to it.
    pub fn from_parsed(parsed: &ParsedUtilityData) -> (Self, Vec<String>) {
        let mut warnings = vec![];
        let years = parsed
            .entries
            .iter()
            .filter_map(|entry| entry.year)
            .sorted()
            .dedup()
            .collect::<Vec<_>>();
        let latest_year = years.last().copied();
        if years.len() > 1 {
            warnings.push(format!(
                "Data found for {} years ({}); using {} only",
                years.len(),
                years.iter().join(", "),
                latest_year.unwrap_or_default(),
            ));
        }

        let record = parsed
            .entries
            .iter()
            .filter(|entry| entry.year.is_none() || entry.year == latest_year)
            .fold(Self::default(), |record, entry| {
                record.with_month(
                    entry.month,
                    MonthlyBill {
                        electricity_kwh: entry.electricity_kwh,
                        electricity_cost: entry.electricity_cost,
                        gas_therms: entry.gas_therms,
                        gas_cost: entry.gas_cost,
                    },
                )
            });

        (record, warnings)
    }

    pub fn months_with_electricity(&self) -> usize {
        self.months.iter().filter(|bill| bill.has_electricity()).count()
    }

    pub fn months_with_gas(&self) -> usize {
        self.months.iter().filter(|bill| bill.has_gas()).count()
    }

    pub fn totals(&self) -> UtilityTotals {
        let sum = |value: fn(&MonthlyBill) -> Option<f64>| self.months.iter().filter_map(value).sum::<f64>();
        let electricity_kwh = sum(|bill| bill.electricity_kwh);
        let electricity_cost = sum(|bill| bill.electricity_cost);
        let months_with_electricity = self.months_with_electricity();

        UtilityTotals {
            electricity_kwh,
            electricity_cost,
            gas_therms: sum(|bill| bill.gas_therms),
            gas_cost: sum(|bill| bill.gas_cost),
            months_with_electricity,
            months_with_gas: self.months_with_gas(),
            average_monthly_kwh: (months_with_electricity > 0)
                .then(|| electricity_kwh / months_with_electricity as f64),
        }
    }

    /// Data-quality warnings: incomplete years and months far from the average of the months
    /// entered. The gas month count is only checked when some gas data was entered, so a
    /// building without gas service gets no gas warning.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = vec![];

        let months_with_electricity = self.months_with_electricity();
        if months_with_electricity < MONTHS_PER_YEAR {
            warnings.push(format!(
                "Only {months_with_electricity} of {MONTHS_PER_YEAR} months of electricity data entered; annual totals will be understated"
            ));
        }
        let months_with_gas = self.months_with_gas();
        if months_with_gas > 0 && months_with_gas < MONTHS_PER_YEAR {
            warnings.push(format!(
                "Only {months_with_gas} of {MONTHS_PER_YEAR} months of gas data entered"
            ));
        }

        warnings.extend(self.outlier_warnings("electricity", "kWh", |bill| bill.electricity_kwh));
        warnings.extend(self.outlier_warnings("gas", "therms", |bill| bill.gas_therms));
        warnings
    }

    fn outlier_warnings(
        &self,
        label: &str,
        unit: &str,
        value: fn(&MonthlyBill) -> Option<f64>,
    ) -> Vec<String> {
        let (months, values): (Vec<_>, Vec<_>) = self
            .months
            .iter()
            .enumerate()
            .filter_map(|(idx, bill)| value(bill).map(|value| (idx, value)))
            .unzip();
        let Some(average) = mean(&values) else {
            return vec![];
        };

        outliers_against_mean(&values, OUTLIER_LOW_RATIO, OUTLIER_HIGH_RATIO)
            .into_iter()
            .map(|(idx, value)| {
                let direction = if value > average { "high" } else { "low" };
                format!(
                    "{} {label} use of {value:.0} {unit} is unusually {direction} compared with the monthly average of {average:.0} {unit}",
                    MONTH_NAMES[months[idx]]
                )
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct UtilityTotals {
    pub electricity_kwh: f64,
    pub electricity_cost: f64,
    pub gas_therms: f64,
    pub gas_cost: f64,
    pub months_with_electricity: usize,
    pub months_with_gas: usize,
    pub average_monthly_kwh: Option<f64>,
}

impl UtilityTotals {
    pub fn total_cost(&self) -> f64 {
        self.electricity_cost + self.gas_cost
    }

    /// Electricity plus gas, with gas converted to kWh.
    pub fn combined_kwh(&self) -> f64 {
        self.electricity_kwh + therms_to_kwh(self.gas_therms)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum VarianceAssessment {
    SignificantlyLower,
    ModeratelyLower,
    WithinExpectedRange,
    ModeratelyHigher,
    SignificantlyHigher,
}

impl VarianceAssessment {
    pub fn from_variance_percent(variance_percent: f64) -> Self {
        match variance_percent {
            v if v < -20. => Self::SignificantlyLower,
            v if v < -10. => Self::ModeratelyLower,
            v if v <= 10. => Self::WithinExpectedRange,
            v if v <= 20. => Self::ModeratelyHigher,
            _ => Self::SignificantlyHigher,
        }
    }

    pub fn note(&self) -> &'static str {
        match self {
            Self::SignificantlyLower => {
                "Actual usage is significantly lower than the benchmark estimate. The building may already be efficient, or the bills may be incomplete."
            }
            Self::ModeratelyLower => {
                "Actual usage is moderately lower than the benchmark estimate."
            }
            Self::WithinExpectedRange => {
                "Actual usage is within the expected range of the benchmark estimate."
            }
            Self::ModeratelyHigher => {
                "Actual usage is moderately higher than the benchmark estimate; there may be savings opportunities beyond the typical measures."
            }
            Self::SignificantlyHigher => {
                "Actual usage is significantly higher than the benchmark estimate. Check operating hours and equipment for waste."
            }
        }
    }
}

impl Display for VarianceAssessment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::SignificantlyLower => "significantly lower",
                Self::ModeratelyLower => "moderately lower",
                Self::WithinExpectedRange => "within expected range",
                Self::ModeratelyHigher => "moderately higher",
                Self::SignificantlyHigher => "significantly higher",
            }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UtilityComparison {
    pub estimated_kwh: f64,
    pub actual_kwh: f64,
    pub variance_kwh: f64,
    pub variance_percent: f64,
    pub estimated_eui: f64,
    pub actual_eui: f64,
    pub assessment: VarianceAssessment,
    pub note: &'static str,
}

impl UtilityComparison {
    pub fn new(estimated_kwh: f64, actual_kwh: f64, floor_area_sq_ft: f64) -> Self {
        let variance_kwh = actual_kwh - estimated_kwh;
        let variance_percent = if estimated_kwh == 0. {
            0.
        } else {
            variance_kwh / estimated_kwh * 100.
        };
        let assessment = VarianceAssessment::from_variance_percent(variance_percent);

        Self {
            estimated_kwh,
            actual_kwh,
            variance_kwh,
            variance_percent,
            estimated_eui: per_sq_ft(estimated_kwh, floor_area_sq_ft),
            actual_eui: per_sq_ft(actual_kwh, floor_area_sq_ft),
            assessment,
            note: assessment.note(),
        }
    }
}

fn per_sq_ft(kwh: f64, floor_area_sq_ft: f64) -> f64 {
    if floor_area_sq_ft > 0. {
        kwh / floor_area_sq_ft
    } else {
        0.
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UtilityReconciliation {
    pub totals: UtilityTotals,
    /// electricity only, kWh per sq ft per year
    pub actual_eui: f64,
    /// electricity plus gas converted to kWh, per sq ft per year
    pub combined_eui: f64,
    pub comparison: UtilityComparison,
    pub warnings: Vec<String>,
}

/// Compares a year of actual bills against the estimated annual electricity use.
#[instrument(skip(record))]
pub fn reconcile(
    record: &UtilityBillRecord,
    floor_area_sq_ft: f64,
    estimated_annual_kwh: f64,
) -> UtilityReconciliation {
    let totals = record.totals();
    let comparison = UtilityComparison::new(estimated_annual_kwh, totals.electricity_kwh, floor_area_sq_ft);
    debug!(
        "Actual {:.0} kWh against estimated {:.0} kWh: {}",
        comparison.actual_kwh, comparison.estimated_kwh, comparison.assessment
    );

    UtilityReconciliation {
        actual_eui: per_sq_ft(totals.electricity_kwh, floor_area_sq_ft),
        combined_eui: per_sq_ft(totals.combined_kwh(), floor_area_sq_ft),
        comparison,
        warnings: record.validate(),
        totals,
    }
}
