pub mod core;
pub mod errors;
pub mod input;
pub mod output;
pub mod read_utility_file;
pub mod report;
mod statistics;

use crate::core::auditor::record::AuditRecord;
use crate::core::auditor::store::AuditStore;
use crate::core::ecm::enhanced::{calculate_enhanced_ecms, EnhancedEcmAnalysis};
use crate::core::ecm::simple::{calculate_simple_ecms, SimpleEcm};
use crate::core::ecm::Payback;
use crate::core::end_use::{decompose, decompose_hybrid, EndUseBreakdown, EstimateSource};
use crate::core::utility_bills::{reconcile, UtilityBillRecord};
use crate::errors::{AuditError, OutputError};
use crate::input::{ingest_for_processing, AuditInput};
use crate::output::Output;
use crate::read_utility_file::parse_utility_csv;
use crate::report::{AuditReport, ReportParts};
use bitflags::bitflags;
use csv::WriterBuilder;
use std::io::{Read, Write};
use tracing::{debug, info, instrument, warn};

bitflags! {
    /// Optional parts of a run.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ReportFlags: u8 {
        const ENHANCED_ECMS = 0b001;
        const HYBRID_BREAKDOWN = 0b010;
        const UTILITY_COMPARISON = 0b100;
    }
}

/// Runs a full benchmark audit for one building and writes the report to `output`.
///
/// Bills from `utility_csv` take the place of any bills given in the input document.
#[instrument(skip_all, fields(flags = ?flags))]
pub fn run_audit(
    input: impl Read,
    utility_csv: Option<impl Read>,
    output: impl Output,
    flags: &ReportFlags,
) -> Result<AuditReport, AuditError> {
    let AuditInput {
        building,
        equipment,
        utility_bills,
    } = ingest_for_processing(input)?;

    let business_type = building.business_type.ok_or_else(|| {
        AuditError::InsufficientData("no business type was given".to_string())
    })?;
    let baseline = building.baseline().ok_or_else(|| {
        AuditError::InsufficientData(format!(
            "floor area must be a positive number of square feet, got {}",
            building.floor_area_sq_ft
        ))
    })?;
    info!(
        "{business_type} of {} sq ft: {:.0} kWh/yr, ${:.0}/yr",
        baseline.floor_area_sq_ft, baseline.annual_energy_use_kwh, baseline.annual_energy_cost_usd
    );

    let equipment_totals = equipment
        .filter(|inventory| !inventory.is_empty())
        .map(|inventory| inventory.totals());
    let breakdown = if flags.contains(ReportFlags::HYBRID_BREAKDOWN) {
        decompose_hybrid(
            business_type,
            baseline.annual_energy_use_kwh,
            equipment_totals.as_ref(),
        )
    } else {
        decompose(business_type, baseline.annual_energy_use_kwh)
    }
    .ok_or_else(|| AuditError::InsufficientData("annual energy use is not positive".to_string()))?;

    let simple_ecms = calculate_simple_ecms(&baseline, &breakdown);
    let enhanced = flags
        .contains(ReportFlags::ENHANCED_ECMS)
        .then(|| calculate_enhanced_ecms(&baseline, &breakdown));

    let mut warnings = vec![];
    let bills = match utility_csv {
        Some(csv) => {
            let parsed = parse_utility_csv(csv);
            if !parsed.is_success() {
                return Err(AuditError::UtilityImport(parsed.errors));
            }
            let (record, fold_warnings) = UtilityBillRecord::from_parsed(&parsed);
            warnings.extend(parsed.warnings);
            warnings.extend(fold_warnings);
            Some(record)
        }
        None => utility_bills,
    };

    let utility = match bills {
        Some(record) if flags.contains(ReportFlags::UTILITY_COMPARISON) => {
            if record.months_with_electricity() == 0 {
                warn!("No electricity usage in the utility bills; skipping comparison");
                warnings.push("No electricity usage entered; utility comparison skipped".to_string());
                None
            } else {
                let reconciliation = reconcile(
                    &record,
                    baseline.floor_area_sq_ft,
                    baseline.annual_energy_use_kwh,
                );
                warnings.extend(reconciliation.warnings.iter().cloned());
                Some(reconciliation)
            }
        }
        Some(_) => {
            warn!("Utility bills given but comparison not requested; skipping comparison");
            warnings.push(
                "Utility bills were given but not compared; request a utility comparison to use them"
                    .to_string(),
            );
            None
        }
        None => None,
    };

    for warning in &warnings {
        debug!("{warning}");
    }

    let report = AuditReport::new(ReportParts {
        building,
        baseline,
        breakdown,
        equipment_totals,
        simple_ecms,
        enhanced,
        utility,
        warnings,
    });

    if !output.is_noop() {
        write_report_files(&output, &report).map_err(OutputError::new)?;
    }

    info!(
        "{} measures, ${:.0}/yr potential savings",
        report.summary.ecm_count, report.summary.total_cost_saved_usd
    );

    Ok(report)
}

/// Loads an exported audit record, generates its recommendations and writes the updated
/// record and a table of the recommendations to `output`.
///
/// The returned record carries a fresh id, as with any import.
#[instrument(skip_all)]
pub fn run_auditor(mut input: impl Read, output: impl Output) -> Result<AuditRecord, AuditError> {
    let mut json = String::new();
    input
        .read_to_string(&mut json)
        .map_err(|err| AuditError::InvalidInput(err.into()))?;

    let mut store = AuditStore::new();
    let id = store.import_json(&json)?.id;
    let record = store.generate_ecms(id)?.clone();
    info!(
        "Generated {} recommendations for {}",
        record.generated_ecms.len(),
        record.name
    );

    if !output.is_noop() {
        let exported = store.export_json(id)?;
        write_auditor_files(&output, &record, &exported).map_err(OutputError::new)?;
    }

    Ok(record)
}

fn write_report_files(output: &impl Output, report: &AuditReport) -> anyhow::Result<()> {
    debug!("writing out report");
    let mut writer = output.writer_for_location_key("report", "json")?;
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;

    write_breakdown_file(output, &report.breakdown)?;
    write_simple_ecms_file(output, &report.simple_ecms)?;
    if let Some(analysis) = &report.enhanced {
        write_enhanced_ecms_file(output, analysis)?;
    }

    Ok(())
}

fn payback_cell(payback: Payback) -> String {
    match payback {
        Payback::Years(years) => format!("{years:.2}"),
        Payback::NoPayback => payback.to_string(),
    }
}

fn write_breakdown_file(output: &impl Output, breakdown: &EndUseBreakdown) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key("breakdown", "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let total_kwh = breakdown.total_kwh();
    writer.write_record(["End use", "Energy", "Share", "Source"])?;
    writer.write_record(["", "[kWh]", "[%]", ""])?;
    for (category, share) in breakdown.iter() {
        let percent = if total_kwh > 0. {
            share.kwh / total_kwh * 100.
        } else {
            0.
        };
        writer.write_record([
            category.to_string(),
            format!("{:.0}", share.kwh),
            format!("{percent:.1}"),
            match share.source {
                EstimateSource::Estimated => "estimated",
                EstimateSource::EquipmentDerived => "equipment-derived",
            }
            .to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_simple_ecms_file(output: &impl Output, ecms: &[SimpleEcm]) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key("ecms", "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record([
        "Measure",
        "End use",
        "Energy saved",
        "Cost saved",
        "Implementation cost",
        "Payback",
        "Priority",
    ])?;
    writer.write_record(["", "", "[kWh/yr]", "[$/yr]", "[$]", "[years]", ""])?;
    for ecm in ecms {
        writer.write_record([
            ecm.name.to_string(),
            ecm.category.to_string(),
            format!("{:.0}", ecm.energy_saved_kwh),
            format!("{:.2}", ecm.cost_saved_usd),
            format!("{:.2}", ecm.implementation_cost_usd),
            payback_cell(ecm.payback),
            ecm.priority.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_enhanced_ecms_file(
    output: &impl Output,
    analysis: &EnhancedEcmAnalysis,
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key("enhanced_ecms", "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record([
        "Measure",
        "End use",
        "Energy saved (low)",
        "Energy saved (typical)",
        "Energy saved (high)",
        "Cost saved (typical)",
        "Net cost (typical)",
        "Rebate (typical)",
        "Payback (best)",
        "Payback (typical)",
        "Payback (worst)",
        "Priority",
        "Complexity",
        "Lifespan",
    ])?;
    for ecm in &analysis.ecms {
        writer.write_record([
            ecm.name.to_string(),
            ecm.category.to_string(),
            format!("{:.0}", ecm.energy_saved_kwh.low),
            format!("{:.0}", ecm.energy_saved_kwh.typical),
            format!("{:.0}", ecm.energy_saved_kwh.high),
            format!("{:.2}", ecm.cost_saved_usd.typical),
            format!("{:.2}", ecm.net_cost_usd.typical),
            format!("{:.2}", ecm.rebate_usd.typical),
            payback_cell(ecm.payback.best),
            payback_cell(ecm.payback.typical),
            payback_cell(ecm.payback.worst),
            ecm.priority.to_string(),
            ecm.complexity.to_string(),
            ecm.lifespan_years.to_string(),
        ])?;
    }

    // the cross-measure bonus is not attributed to any single measure
    let bonus = &analysis.interactive_savings;
    writer.write_record([
        "Interactive effects".to_string(),
        String::new(),
        String::new(),
        format!("{:.0}", bonus.energy_saved_kwh),
        String::new(),
        format!("{:.2}", bonus.cost_saved_usd),
    ])?;

    writer.flush()?;
    Ok(())
}

fn write_auditor_files(
    output: &impl Output,
    record: &AuditRecord,
    exported: &str,
) -> anyhow::Result<()> {
    let mut writer = output.writer_for_location_key("audit", "json")?;
    writer.write_all(exported.as_bytes())?;
    writer.flush()?;

    let writer = output.writer_for_location_key("auditor_ecms", "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);
    writer.write_record([
        "Measure",
        "Category",
        "Annual savings (low)",
        "Annual savings (high)",
        "Cost (low)",
        "Cost (high)",
        "Payback",
        "Priority",
    ])?;
    for ecm in &record.generated_ecms {
        writer.write_record([
            ecm.title.clone(),
            ecm.category.to_string(),
            format!("{:.2}", ecm.annual_savings_low_usd),
            format!("{:.2}", ecm.annual_savings_high_usd),
            format!("{:.2}", ecm.cost_low_usd),
            format!("{:.2}", ecm.cost_high_usd),
            payback_cell(ecm.payback),
            ecm.priority.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
