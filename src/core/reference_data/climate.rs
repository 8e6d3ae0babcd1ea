use crate::input::ConstructionYearBand;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum_macros::Display;

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum ClimateZone {
    Hot,
    Warm,
    #[default]
    Mixed,
    Cool,
    Cold,
}

impl ClimateZone {
    /// Multiplier applied to the benchmark EUI for heating/cooling load in this zone.
    pub fn adjustment_factor(&self) -> f64 {
        match self {
            ClimateZone::Hot => 1.15,
            ClimateZone::Warm => 1.05,
            ClimateZone::Mixed => 1.0,
            ClimateZone::Cool => 1.10,
            ClimateZone::Cold => 1.20,
        }
    }
}

pub fn construction_adjustment_factor(construction_year: Option<ConstructionYearBand>) -> f64 {
    match construction_year {
        Some(ConstructionYearBand::Before2000) => 1.15,
        Some(ConstructionYearBand::From2000To2010) | None => 1.0,
        Some(ConstructionYearBand::After2010) => 0.90,
    }
}

/// Inclusive ranges of three-digit ZIP prefixes and the state they belong to.
const ZIP_PREFIX_RANGES: &[(u16, u16, &str)] = &[
    (6, 9, "PR"),
    (10, 27, "MA"),
    (28, 29, "RI"),
    (30, 38, "NH"),
    (39, 49, "ME"),
    (50, 54, "VT"),
    (55, 55, "MA"),
    (56, 59, "VT"),
    (60, 69, "CT"),
    (70, 89, "NJ"),
    (100, 149, "NY"),
    (150, 196, "PA"),
    (197, 199, "DE"),
    (200, 205, "DC"),
    (206, 219, "MD"),
    (220, 246, "VA"),
    (247, 268, "WV"),
    (270, 289, "NC"),
    (290, 299, "SC"),
    (300, 319, "GA"),
    (320, 349, "FL"),
    (350, 369, "AL"),
    (370, 385, "TN"),
    (386, 397, "MS"),
    (398, 399, "GA"),
    (400, 427, "KY"),
    (430, 458, "OH"),
    (460, 479, "IN"),
    (480, 499, "MI"),
    (500, 528, "IA"),
    (530, 549, "WI"),
    (550, 567, "MN"),
    (570, 577, "SD"),
    (580, 588, "ND"),
    (590, 599, "MT"),
    (600, 629, "IL"),
    (630, 658, "MO"),
    (660, 679, "KS"),
    (680, 693, "NE"),
    (700, 714, "LA"),
    (716, 729, "AR"),
    (730, 749, "OK"),
    (750, 799, "TX"),
    (800, 816, "CO"),
    (820, 831, "WY"),
    (832, 838, "ID"),
    (840, 847, "UT"),
    (850, 865, "AZ"),
    (870, 884, "NM"),
    (885, 885, "TX"),
    (889, 898, "NV"),
    (900, 961, "CA"),
    (967, 968, "HI"),
    (970, 979, "OR"),
    (980, 994, "WA"),
    (995, 999, "AK"),
];

pub static STATE_CLIMATE_ZONES: LazyLock<IndexMap<&'static str, ClimateZone>> =
    LazyLock::new(|| {
        use ClimateZone::*;

        IndexMap::from([
            ("AL", Hot),
            ("AZ", Hot),
            ("FL", Hot),
            ("HI", Hot),
            ("LA", Hot),
            ("MS", Hot),
            ("NV", Hot),
            ("PR", Hot),
            ("TX", Hot),
            ("AR", Warm),
            ("CA", Warm),
            ("GA", Warm),
            ("NM", Warm),
            ("OK", Warm),
            ("SC", Warm),
            ("DC", Mixed),
            ("DE", Mixed),
            ("KS", Mixed),
            ("KY", Mixed),
            ("MD", Mixed),
            ("MO", Mixed),
            ("NC", Mixed),
            ("NJ", Mixed),
            ("TN", Mixed),
            ("VA", Mixed),
            ("WV", Mixed),
            ("CO", Cool),
            ("CT", Cool),
            ("IA", Cool),
            ("ID", Cool),
            ("IL", Cool),
            ("IN", Cool),
            ("MA", Cool),
            ("NE", Cool),
            ("NY", Cool),
            ("OH", Cool),
            ("OR", Cool),
            ("PA", Cool),
            ("RI", Cool),
            ("UT", Cool),
            ("WA", Cool),
            ("AK", Cold),
            ("ME", Cold),
            ("MI", Cold),
            ("MN", Cold),
            ("MT", Cold),
            ("ND", Cold),
            ("NH", Cold),
            ("SD", Cold),
            ("VT", Cold),
            ("WI", Cold),
            ("WY", Cold),
        ])
    });

/// Derives a two-letter state code from the first three digits of a ZIP code.
pub fn state_from_zip(zip_code: &str) -> Option<&'static str> {
    let zip_code = zip_code.trim();
    let prefix = zip_code.get(..3)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let prefix: u16 = prefix.parse().ok()?;

    ZIP_PREFIX_RANGES
        .iter()
        .find(|(start, end, _)| (*start..=*end).contains(&prefix))
        .map(|(_, _, state)| *state)
}

pub fn climate_zone_for_state(state_code: &str) -> Option<ClimateZone> {
    STATE_CLIMATE_ZONES.get(state_code).copied()
}
