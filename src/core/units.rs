pub const KW_PER_TON_OF_COOLING: f64 = 3.517;
pub const BTU_PER_HOUR_PER_KW: f64 = 3412.;
pub const KWH_PER_THERM: f64 = 29.3;
pub const WATTS_PER_KILOWATT: u32 = 1_000;
pub const WEEKS_PER_YEAR: u32 = 52;
pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_WEEK: u32 = 7;
pub const MONTHS_PER_YEAR: usize = 12;

pub const MONTH_NAMES: [&str; MONTHS_PER_YEAR] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn tons_to_kw(tons: f64) -> f64 {
    tons * KW_PER_TON_OF_COOLING
}

pub fn btu_per_hour_to_kw(btu_per_hour: f64) -> f64 {
    btu_per_hour / BTU_PER_HOUR_PER_KW
}

pub fn kw_to_tons(kw: f64) -> f64 {
    kw / KW_PER_TON_OF_COOLING
}

pub fn therms_to_kwh(therms: f64) -> f64 {
    therms * KWH_PER_THERM
}

/// Annual operating hours for a weekly schedule, using 52 operating weeks.
pub fn annual_operating_hours(hours_per_day: f64, days_per_week: f64) -> f64 {
    hours_per_day * days_per_week * WEEKS_PER_YEAR as f64
}

pub fn watts_to_kw(watts: f64) -> f64 {
    watts / WATTS_PER_KILOWATT as f64
}
