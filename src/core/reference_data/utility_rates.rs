use indexmap::IndexMap;
use std::sync::LazyLock;

/// US average commercial electricity price, used when no state can be determined, in $/kWh
pub const DEFAULT_ELECTRICITY_RATE: f64 = 0.15;

/// Average commercial electricity price by state, in $/kWh
pub static STATE_ELECTRICITY_RATES: LazyLock<IndexMap<&'static str, f64>> = LazyLock::new(|| {
    IndexMap::from([
        ("AK", 0.21),
        ("AL", 0.13),
        ("AR", 0.11),
        ("AZ", 0.12),
        ("CA", 0.22),
        ("CO", 0.12),
        ("CT", 0.20),
        ("DC", 0.14),
        ("DE", 0.12),
        ("FL", 0.12),
        ("GA", 0.12),
        ("HI", 0.38),
        ("IA", 0.11),
        ("ID", 0.09),
        ("IL", 0.12),
        ("IN", 0.13),
        ("KS", 0.12),
        ("KY", 0.12),
        ("LA", 0.11),
        ("MA", 0.21),
        ("MD", 0.13),
        ("ME", 0.18),
        ("MI", 0.14),
        ("MN", 0.13),
        ("MO", 0.11),
        ("MS", 0.12),
        ("MT", 0.12),
        ("NC", 0.10),
        ("ND", 0.10),
        ("NE", 0.10),
        ("NH", 0.19),
        ("NJ", 0.15),
        ("NM", 0.12),
        ("NV", 0.11),
        ("NY", 0.19),
        ("OH", 0.12),
        ("OK", 0.10),
        ("OR", 0.11),
        ("PA", 0.12),
        ("PR", 0.24),
        ("RI", 0.20),
        ("SC", 0.11),
        ("SD", 0.11),
        ("TN", 0.12),
        ("TX", 0.10),
        ("UT", 0.10),
        ("VA", 0.10),
        ("VT", 0.18),
        ("WA", 0.10),
        ("WI", 0.13),
        ("WV", 0.11),
        ("WY", 0.10),
    ])
});

/// Electricity price for a state, falling back to the US average.
pub fn electricity_rate(state_code: Option<&str>) -> f64 {
    state_code
        .and_then(|state_code| STATE_ELECTRICITY_RATES.get(state_code).copied())
        .unwrap_or(DEFAULT_ELECTRICITY_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference_data::climate::STATE_CLIMATE_ZONES;
    use rstest::*;

    #[rstest]
    #[case(Some("CA"), 0.22)]
    #[case(Some("TX"), 0.10)]
    #[case(Some("ZZ"), DEFAULT_ELECTRICITY_RATE)]
    #[case(None, DEFAULT_ELECTRICITY_RATE)]
    fn test_electricity_rate(#[case] state_code: Option<&str>, #[case] expected: f64) {
        assert_eq!(electricity_rate(state_code), expected);
    }

    #[rstest]
    fn test_every_climate_state_has_a_rate() {
        for state in STATE_CLIMATE_ZONES.keys() {
            assert!(STATE_ELECTRICITY_RATES.contains_key(state), "{state} has no rate");
        }
    }
}
