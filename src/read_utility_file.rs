use crate::core::units::MONTH_NAMES;
use chrono::Month;
use csv::{ReaderBuilder as CsvReaderBuilder, StringRecord, WriterBuilder};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Read;
use tracing::{debug, info, instrument};

pub const TEMPLATE_HEADERS: [&str; 5] = [
    "Month",
    "Electricity kWh",
    "Electricity Cost",
    "Gas Therms",
    "Gas Cost",
];

pub const AUDITOR_TEMPLATE_HEADERS: [&str; 6] = [
    "Month",
    "Year",
    "Electricity kWh",
    "Electricity Cost",
    "Gas Therms",
    "Gas Cost",
];

/// One month of billing data read from a utility CSV.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct UtilityEntry {
    pub year: Option<i32>,
    /// calendar month, 1 to 12
    pub month: u32,
    pub electricity_kwh: Option<f64>,
    pub electricity_cost: Option<f64>,
    pub gas_therms: Option<f64>,
    pub gas_cost: Option<f64>,
}

impl UtilityEntry {
    fn has_values(&self) -> bool {
        self.electricity_kwh.is_some()
            || self.electricity_cost.is_some()
            || self.gas_therms.is_some()
            || self.gas_cost.is_some()
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES
            .get((self.month as usize).wrapping_sub(1))
            .copied()
            .unwrap_or("Unknown month")
    }

    fn period_label(&self) -> String {
        match self.year {
            Some(year) => format!("{} {year}", self.month_name()),
            None => self.month_name().to_string(),
        }
    }
}

/// Result of reading a utility CSV. A non-empty `errors` list means the file could not be used
/// at all, in which case `entries` is empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ParsedUtilityData {
    pub entries: Vec<UtilityEntry>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ParsedUtilityData {
    fn failure(error: String, warnings: Vec<String>) -> Self {
        Self {
            entries: vec![],
            warnings,
            errors: vec![error],
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum ColumnRole {
    Date,
    Month,
    Year,
    ElectricityKwh,
    ElectricityCost,
    GasTherms,
    GasCost,
}

impl ColumnRole {
    fn is_value(&self) -> bool {
        matches!(
            self,
            ColumnRole::ElectricityKwh
                | ColumnRole::ElectricityCost
                | ColumnRole::GasTherms
                | ColumnRole::GasCost
        )
    }
}

/// Lower case with everything but letters and digits removed.
fn normalise_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn column_role(header: &str) -> Option<ColumnRole> {
    let header = normalise_header(header);
    let contains_any = |words: &[&str]| words.iter().any(|word| header.contains(word));

    let is_cost = contains_any(&["cost", "amount", "charge", "bill", "dollar", "usd"]);
    let is_gas = contains_any(&["gas", "therm"]);
    let is_electric = contains_any(&["elec", "kwh", "power", "usage", "consumption"]);

    if header.contains("days") {
        // a day count such as "Days in Billing Period" is not read
        None
    } else if contains_any(&["date", "period"]) {
        Some(ColumnRole::Date)
    } else if header.contains("month") {
        Some(ColumnRole::Month)
    } else if header.contains("year") {
        Some(ColumnRole::Year)
    } else if is_gas && is_cost {
        Some(ColumnRole::GasCost)
    } else if is_gas {
        Some(ColumnRole::GasTherms)
    } else if is_cost {
        // an unqualified cost column is the electricity bill
        Some(ColumnRole::ElectricityCost)
    } else if is_electric {
        Some(ColumnRole::ElectricityKwh)
    } else {
        None
    }
}

fn parse_month(token: &str) -> Option<u32> {
    let token = token.trim().trim_end_matches('.');
    if let Ok(number) = token.parse::<u32>() {
        return (1..=12).contains(&number).then_some(number);
    }
    token.parse::<Month>().ok().map(|month| month.number_from_month())
}

fn parse_year(token: &str) -> Option<i32> {
    let token = token.trim();
    if token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

/// Reads a billing period in any of the accepted layouts: `YYYY-MM[-DD]`, `MM/YYYY`,
/// `Month YYYY`, `YYYY/MM`, `MM-YYYY`, or a bare month number or name.
fn parse_period(value: &str) -> Option<(Option<i32>, u32)> {
    let parts = value
        .split(|c: char| c == '-' || c == '/' || c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();

    match parts.as_slice() {
        [month] => parse_month(month).map(|month| (None, month)),
        [first, second] => match parse_year(first) {
            Some(year) => Some((Some(year), parse_month(second)?)),
            None => Some((Some(parse_year(second)?), parse_month(first)?)),
        },
        // a day in the middle (MM/DD/YYYY, "Month DD, YYYY") or at the end (YYYY-MM-DD)
        [first, second, third] => match parse_year(first) {
            Some(year) => Some((Some(year), parse_month(second)?)),
            None => Some((Some(parse_year(third)?), parse_month(first)?)),
        },
        _ => None,
    }
}

/// Parses a usage or cost figure, ignoring currency symbols and thousands separators. Blank
/// cells are `Ok(None)`.
fn parse_amount(value: &str) -> Result<Option<f64>, String> {
    let cleaned = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect::<String>();
    if cleaned.is_empty() {
        return Ok(None);
    }

    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0. => Ok(Some(amount)),
        Ok(_) => Err(format!("'{}' is not a non-negative amount", value.trim())),
        Err(_) => Err(format!("'{}' is not a number", value.trim())),
    }
}

struct ColumnLayout {
    columns: IndexMap<ColumnRole, usize>,
}

impl ColumnLayout {
    fn from_header(header: &StringRecord, warnings: &mut Vec<String>) -> Self {
        let mut columns = IndexMap::new();
        for (idx, name) in header.iter().enumerate() {
            let Some(role) = column_role(name) else {
                debug!("Ignoring unrecognised utility column '{name}'");
                continue;
            };
            if columns.contains_key(&role) {
                warnings.push(format!("Ignoring additional column '{}'", name.trim()));
            } else {
                columns.insert(role, idx);
            }
        }
        Self { columns }
    }

    fn missing_columns_error(&self) -> Option<String> {
        let has_period = self.columns.contains_key(&ColumnRole::Date)
            || self.columns.contains_key(&ColumnRole::Month);
        let has_value = self.columns.keys().any(ColumnRole::is_value);

        match (has_period, has_value) {
            (true, true) => None,
            (false, _) => Some("No month or date column found in the header row".to_string()),
            (true, false) => Some(
                "No electricity or gas usage/cost columns found in the header row".to_string(),
            ),
        }
    }

    fn cell<'a>(&self, record: &'a StringRecord, role: ColumnRole) -> Option<&'a str> {
        self.columns
            .get(&role)
            .and_then(|idx| record.get(*idx))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn period(&self, record: &StringRecord) -> Result<(Option<i32>, u32), String> {
        let period_role = if self.columns.contains_key(&ColumnRole::Date) {
            ColumnRole::Date
        } else {
            ColumnRole::Month
        };
        let value = self
            .cell(record, period_role)
            .ok_or_else(|| "missing month".to_string())?;
        let (year, month) =
            parse_period(value).ok_or_else(|| format!("could not read a month from '{value}'"))?;

        match self.cell(record, ColumnRole::Year) {
            Some(year_value) if period_role == ColumnRole::Month => {
                let year = parse_year(year_value)
                    .ok_or_else(|| format!("could not read a year from '{year_value}'"))?;
                Ok((Some(year), month))
            }
            _ => Ok((year, month)),
        }
    }

    fn entry(&self, record: &StringRecord) -> Result<(UtilityEntry, Vec<String>), String> {
        let (year, month) = self.period(record)?;
        let mut problems = vec![];
        let mut amount = |role: ColumnRole| {
            self.cell(record, role)
                .map(parse_amount)
                .transpose()
                .unwrap_or_else(|problem| {
                    problems.push(problem);
                    None
                })
                .flatten()
        };

        let entry = UtilityEntry {
            year,
            month,
            electricity_kwh: amount(ColumnRole::ElectricityKwh),
            electricity_cost: amount(ColumnRole::ElectricityCost),
            gas_therms: amount(ColumnRole::GasTherms),
            gas_cost: amount(ColumnRole::GasCost),
        };
        Ok((entry, problems))
    }
}

/// Reads monthly utility data from a CSV with a header row. Column names are matched loosely,
/// so exports from most utility portals can be read as they are.
#[instrument(skip_all)]
pub fn parse_utility_csv(file: impl Read) -> ParsedUtilityData {
    let mut reader = CsvReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(file);

    let mut warnings = vec![];
    let mut records = vec![];
    for (i, result) in reader.records().enumerate() {
        match result {
            Ok(record) => records.push((i + 1, record)),
            Err(err) => warnings.push(format!("Line {}: {err}", i + 1)),
        }
    }

    if records.len() < 2 {
        return ParsedUtilityData::failure(
            "The file needs a header row and at least one row of data".to_string(),
            warnings,
        );
    }

    let (_, header) = &records[0];
    let layout = ColumnLayout::from_header(header, &mut warnings);
    if let Some(error) = layout.missing_columns_error() {
        return ParsedUtilityData::failure(error, warnings);
    }

    let mut entries: IndexMap<(Option<i32>, u32), UtilityEntry> = IndexMap::new();
    for (line, record) in &records[1..] {
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let (entry, problems) = match layout.entry(record) {
            Ok(parsed) => parsed,
            Err(problem) => {
                warnings.push(format!("Line {line}: skipped, {problem}"));
                continue;
            }
        };
        warnings.extend(
            problems
                .into_iter()
                .map(|problem| format!("Line {line}: {problem}, value ignored")),
        );
        if !entry.has_values() {
            continue;
        }
        if entries.insert((entry.year, entry.month), entry).is_some() {
            warnings.push(format!(
                "Line {line}: duplicate entry for {}, keeping the last one",
                entry.period_label()
            ));
        }
    }

    if entries.is_empty() {
        return ParsedUtilityData::failure("No usable utility data found".to_string(), warnings);
    }

    for warning in &warnings {
        debug!("{warning}");
    }
    let mut entries = entries.into_values().collect::<Vec<_>>();
    entries.sort_by_key(|entry| (entry.year, entry.month));
    info!("Read {} months of utility data", entries.len());

    ParsedUtilityData {
        entries,
        warnings,
        errors: vec![],
    }
}

fn write_template<const N: usize>(
    headers: [&str; N],
    row_for_month: impl Fn(&str) -> [String; N],
) -> anyhow::Result<String> {
    let mut buffer = vec![];
    {
        let mut writer = WriterBuilder::new().from_writer(&mut buffer);
        writer.write_record(headers)?;
        for month in MONTH_NAMES {
            writer.write_record(row_for_month(month))?;
        }
        writer.flush()?;
    }

    Ok(String::from_utf8(buffer)?)
}

/// A blank bill-entry template: one row per calendar month.
pub fn generate_template_csv() -> anyhow::Result<String> {
    write_template(TEMPLATE_HEADERS, |month| {
        [
            month.to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ]
    })
}

/// The auditor variant of the template, with an explicit year column.
pub fn generate_auditor_template_csv(year: i32) -> anyhow::Result<String> {
    write_template(AUDITOR_TEMPLATE_HEADERS, |month| {
        [
            month.to_string(),
            year.to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn parse(csv: &str) -> ParsedUtilityData {
        parse_utility_csv(csv.as_bytes())
    }

    #[rstest]
    #[case("Month", Some(ColumnRole::Month))]
    #[case("Billing Period", Some(ColumnRole::Date))]
    #[case("Electricity (kWh)", Some(ColumnRole::ElectricityKwh))]
    #[case("ELECTRIC_COST_$", Some(ColumnRole::ElectricityCost))]
    #[case("Natural Gas Therms", Some(ColumnRole::GasTherms))]
    #[case("Gas Bill Amount", Some(ColumnRole::GasCost))]
    #[case("Year", Some(ColumnRole::Year))]
    #[case("Total Cost", Some(ColumnRole::ElectricityCost))]
    #[case("Gas Usage", Some(ColumnRole::GasTherms))]
    #[case("Meter number", None)]
    #[case("Days in Billing Period", None)]
    #[case("Billing Days", None)]
    fn test_column_roles(#[case] header: &str, #[case] expected: Option<ColumnRole>) {
        assert_eq!(column_role(header), expected);
    }

    #[rstest]
    #[case("2024-03", Some((Some(2024), 3)))]
    #[case("2024-03-15", Some((Some(2024), 3)))]
    #[case("03/2024", Some((Some(2024), 3)))]
    #[case("March 2024", Some((Some(2024), 3)))]
    #[case("Mar 2024", Some((Some(2024), 3)))]
    #[case("2024/03", Some((Some(2024), 3)))]
    #[case("03-2024", Some((Some(2024), 3)))]
    #[case("March", Some((None, 3)))]
    #[case("12", Some((None, 12)))]
    #[case("13/2024", None)]
    #[case("Smarch 2024", None)]
    #[case("", None)]
    fn test_period_formats(#[case] value: &str, #[case] expected: Option<(Option<i32>, u32)>) {
        assert_eq!(parse_period(value), expected);
    }

    #[rstest]
    fn test_amounts_strip_currency_and_separators() {
        assert_eq!(parse_amount("$1,234.50"), Ok(Some(1234.5)));
        assert_eq!(parse_amount("  "), Ok(None));
        assert!(parse_amount("n/a").is_err());
        assert!(parse_amount("-5").is_err());
    }

    #[rstest]
    fn test_template_round_trip() {
        let template = generate_template_csv().unwrap();
        let filled = template
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line.to_string()
                } else {
                    line.replacen(
                        ",,,,",
                        &format!(",{},{}.25,{},{}.5", 10_000 + i, 1_500 + i, 100 + i, 90 + i),
                        1,
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let parsed = parse(&filled);
        assert!(parsed.is_success(), "{:?}", parsed.errors);
        assert_eq!(parsed.warnings, Vec::<String>::new());
        assert_eq!(parsed.entries.len(), 12);
        for (i, entry) in parsed.entries.iter().enumerate() {
            let n = (i + 1) as f64;
            assert_eq!(entry.month, (i + 1) as u32);
            assert_eq!(entry.year, None);
            assert_eq!(entry.electricity_kwh, Some(10_000. + n));
            assert_eq!(entry.electricity_cost, Some(1_500.25 + n));
            assert_eq!(entry.gas_therms, Some(100. + n));
            assert_eq!(entry.gas_cost, Some(90.5 + n));
        }
    }

    #[rstest]
    fn test_blank_template_has_no_usable_data() {
        let parsed = parse(&generate_template_csv().unwrap());
        assert!(parsed.entries.is_empty());
        assert_eq!(parsed.errors, vec!["No usable utility data found".to_string()]);
    }

    #[rstest]
    fn test_auditor_template() {
        let template = generate_auditor_template_csv(2024).unwrap();
        let lines = template.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 13);
        assert_eq!(
            lines[0],
            "Month,Year,Electricity kWh,Electricity Cost,Gas Therms,Gas Cost"
        );
        assert_eq!(lines[1], "January,2024,,,,");

        let filled = template.replacen("February,2024,,,,", "February,2024,900,,,", 1);
        let parsed = parse(&filled);
        assert_eq!(
            parsed.entries,
            vec![UtilityEntry {
                year: Some(2024),
                month: 2,
                electricity_kwh: Some(900.),
                ..Default::default()
            }]
        );
    }

    #[rstest]
    fn test_day_count_column_before_date_is_ignored() {
        let parsed = parse(
            "Days in Billing Period,Service Date,kWh\n\
             31,2024-01,1000\n\
             29,2024-02,1100\n",
        );
        assert!(parsed.is_success());
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1].month, 2);
        assert_eq!(parsed.entries[1].electricity_kwh, Some(1100.));
        assert!(parsed.warnings.is_empty());
    }

    #[rstest]
    fn test_duplicate_rows_keep_the_last() {
        let parsed = parse(
            "Date,kWh,Cost\n\
             2024-01,1000,\"$150.00\"\n\
             2024-02,1100,165\n\
             01/2024,1200,180\n",
        );
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].electricity_kwh, Some(1200.));
        assert_eq!(parsed.entries[0].electricity_cost, Some(180.));
        assert_eq!(
            parsed.warnings,
            vec!["Line 4: duplicate entry for January 2024, keeping the last one".to_string()]
        );
    }

    #[rstest]
    fn test_malformed_rows_are_warnings() {
        let parsed = parse(
            "Month,Year,Electric kWh,Gas therms\n\
             Jan,2023,\"12,500\",300\n\
             Febtember,2023,11000,280\n\
             Mar,2023,lots,250\n",
        );
        assert!(parsed.is_success());
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].electricity_kwh, Some(12_500.));
        assert_eq!(parsed.entries[1].electricity_kwh, None);
        assert_eq!(parsed.entries[1].gas_therms, Some(250.));
        assert_eq!(
            parsed.warnings,
            vec![
                "Line 3: skipped, could not read a month from 'Febtember'".to_string(),
                "Line 4: 'lots' is not a number, value ignored".to_string(),
            ]
        );
    }

    #[rstest]
    #[case("Month,kWh\n", "The file needs a header row and at least one row of data")]
    #[case("", "The file needs a header row and at least one row of data")]
    #[case("Account,kWh\n123,456\n", "No month or date column found in the header row")]
    #[case(
        "Month,Notes\nJanuary,cold\n",
        "No electricity or gas usage/cost columns found in the header row"
    )]
    fn test_structural_failures(#[case] csv: &str, #[case] error: &str) {
        let parsed = parse(csv);
        assert!(!parsed.is_success());
        assert!(parsed.entries.is_empty());
        assert_eq!(parsed.errors, vec![error.to_string()]);
    }
}
