//! Energy conservation measure (ECM) calculations.
//!
//! Two calculators share the payback and priority rules defined here: a single-point
//! [simple] calculator and a range-based [enhanced] calculator with rebates and
//! interactive effects between measures.

pub mod enhanced;
pub mod simple;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use strum_macros::EnumIter;

/// Payback periods strictly below this many years are high priority.
pub const HIGH_PRIORITY_MAX_PAYBACK_YEARS: f64 = 2.;
/// Payback periods up to and including this many years are medium priority.
pub const MEDIUM_PRIORITY_MAX_PAYBACK_YEARS: f64 = 4.;

#[derive(Clone, Copy, Debug, Deserialize, EnumIter, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_payback(payback: Payback) -> Self {
        match payback {
            Payback::Years(years) if years < HIGH_PRIORITY_MAX_PAYBACK_YEARS => Priority::High,
            Payback::Years(years) if years <= MEDIUM_PRIORITY_MAX_PAYBACK_YEARS => {
                Priority::Medium
            }
            Payback::Years(_) | Payback::NoPayback => Priority::Low,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Priority::High => "High",
                Priority::Medium => "Medium",
                Priority::Low => "Low",
            }
        )
    }
}

/// Simple payback of a measure: either a finite number of years, or no payback at all
/// because the measure saves nothing to divide by.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payback {
    Years(f64),
    NoPayback,
}

impl Payback {
    pub fn from_cost_and_savings(cost: f64, annual_savings: f64) -> Self {
        if annual_savings > 0. && cost.is_finite() {
            Payback::Years(cost / annual_savings)
        } else {
            Payback::NoPayback
        }
    }

    pub fn years(&self) -> Option<f64> {
        match self {
            Payback::Years(years) => Some(*years),
            Payback::NoPayback => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Payback::Years(_))
    }

    /// Caps a finite payback at `max_years`; no-payback stays as it is.
    pub fn capped_at(self, max_years: f64) -> Self {
        match self {
            Payback::Years(years) => Payback::Years(years.min(max_years)),
            Payback::NoPayback => Payback::NoPayback,
        }
    }

    /// Ascending order with no-payback after every finite value.
    pub fn cmp_ascending(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }

    fn sort_key(&self) -> (bool, OrderedFloat<f64>) {
        match self {
            Payback::Years(years) => (false, OrderedFloat(*years)),
            Payback::NoPayback => (true, OrderedFloat(0.)),
        }
    }
}

impl Display for Payback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Payback::Years(years) => write!(f, "{years:.1} years"),
            Payback::NoPayback => write!(f, "N/A"),
        }
    }
}

impl Serialize for Payback {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Payback::Years(years) => serializer.serialize_f64(*years),
            Payback::NoPayback => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for Payback {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum PaybackRepr {
            Years(f64),
            Label(String),
        }

        match PaybackRepr::deserialize(deserializer)? {
            PaybackRepr::Years(years) => Ok(Payback::Years(years)),
            PaybackRepr::Label(label) if label == "N/A" => Ok(Payback::NoPayback),
            PaybackRepr::Label(label) => Err(serde::de::Error::custom(format!(
                "expected a number of years or \"N/A\", got \"{label}\""
            ))),
        }
    }
}

/// Sorts by priority (high first), then ascending payback with no-payback last in each tier.
/// The sort is stable, so equal entries keep their input order.
pub fn sort_by_priority_then_payback<T>(items: &mut [T], key: impl Fn(&T) -> (Priority, Payback)) {
    items.sort_by(|a, b| {
        let (a_priority, a_payback) = key(a);
        let (b_priority, b_payback) = key(b);
        a_priority
            .cmp(&b_priority)
            .then_with(|| a_payback.cmp_ascending(&b_payback))
    });
}

/// A low/typical/high estimate.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ValueRange {
    pub low: f64,
    pub typical: f64,
    pub high: f64,
}

impl ValueRange {
    pub const fn new(low: f64, typical: f64, high: f64) -> Self {
        Self { low, typical, high }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value)
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.low), f(self.typical), f(self.high))
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map(|value| value * factor)
    }

    pub fn is_ordered(&self) -> bool {
        self.low <= self.typical && self.typical <= self.high
    }
}

impl std::ops::Add for ValueRange {
    type Output = ValueRange;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.low + rhs.low,
            self.typical + rhs.typical,
            self.high + rhs.high,
        )
    }
}

impl std::iter::Sum for ValueRange {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ValueRange::default(), |acc, range| acc + range)
    }
}

/// Best-case, typical and worst-case payback.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PaybackRange {
    pub best: Payback,
    pub typical: Payback,
    pub worst: Payback,
}

impl PaybackRange {
    /// Best case pairs the lowest cost with the highest savings, worst case the reverse.
    pub fn from_cost_and_savings(cost: &ValueRange, annual_savings: &ValueRange) -> Self {
        Self {
            best: Payback::from_cost_and_savings(cost.low, annual_savings.high),
            typical: Payback::from_cost_and_savings(cost.typical, annual_savings.typical),
            worst: Payback::from_cost_and_savings(cost.high, annual_savings.low),
        }
    }
}
