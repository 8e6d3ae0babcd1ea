use bizaudit::output::FileOutput;
use bizaudit::read_utility_file::{generate_auditor_template_csv, generate_template_csv};
use bizaudit::{run_audit, run_auditor, ReportFlags};
use chrono::{Datelike, Utc};
use clap::Parser;
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct AuditArgs {
    #[arg(
        required_unless_present = "template",
        help = "Path to the building input file in .json format (an exported audit record with --auditor)"
    )]
    input_file: Option<String>,
    #[arg(
        long,
        short,
        help = "Path to a utility bill file in .csv format (implies --compare-bills)"
    )]
    utility_file: Option<String>,
    #[arg(
        long,
        default_value_t = false,
        help = "Compare the utility bills given in the input file against the estimate"
    )]
    compare_bills: bool,
    #[arg(long, default_value_t = false, help = "Include range-based ECMs with rebates")]
    enhanced: bool,
    #[arg(
        long,
        default_value_t = false,
        help = "Use equipment inventory figures in the end-use breakdown"
    )]
    hybrid: bool,
    #[arg(
        long,
        default_value_t = false,
        help = "Treat the input as an exported audit record and generate its recommendations"
    )]
    auditor: bool,
    #[arg(long, help = "Write a blank utility bill template in .csv format to this path")]
    template: Option<String>,
    #[clap(long, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
    #[clap(long, short, default_value_t = false, help = "Log at trace level")]
    verbose: bool,
}

impl From<&AuditArgs> for ReportFlags {
    fn from(args: &AuditArgs) -> Self {
        let mut flags = ReportFlags::empty();
        if args.enhanced {
            flags.insert(ReportFlags::ENHANCED_ECMS);
        }
        if args.hybrid {
            flags.insert(ReportFlags::HYBRID_BREAKDOWN);
        }
        if args.compare_bills || args.utility_file.is_some() {
            flags.insert(ReportFlags::UTILITY_COMPARISON);
        }
        flags
    }
}

fn main() -> anyhow::Result<()> {
    let args = AuditArgs::parse();

    // set up basic tracing
    let tracing_subscriber = {
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(if args.verbose {
            tracing::Level::TRACE
        } else {
            tracing::Level::INFO
        });

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)?;

    if let Some(template_path) = &args.template {
        let template = if args.auditor {
            generate_auditor_template_csv(Utc::now().year())?
        } else {
            generate_template_csv()?
        };
        fs::write(template_path, template)?;
        info!("Wrote utility bill template to {template_path}");
    }

    let Some(input_file) = args.input_file.as_deref() else {
        return Ok(());
    };
    let input_file_ext = Path::new(input_file).extension().and_then(OsStr::to_str);
    let input_file_stem = match input_file_ext {
        Some(ext) => &input_file[..(input_file.len() - ext.len() - 1)],
        None => input_file,
    };
    let input_file_stem = PathBuf::from(input_file_stem);

    let mut output_path = PathBuf::new();
    output_path.push(format!("{}__results", input_file_stem.display()));
    fs::create_dir_all(&output_path)?;
    let input_file_name = input_file_stem
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("audit");
    let file_output = FileOutput::new(output_path, format!("{input_file_name}__{{}}.{{}}"));

    let input = BufReader::new(File::open(Path::new(input_file))?);

    if args.auditor {
        let record = run_auditor(input, &file_output)?;
        debug!(
            "Audit record: {}",
            serde_json::to_string_pretty(&record)?
        );
        return Ok(());
    }

    let utility_file = args
        .utility_file
        .as_ref()
        .map(|path| File::open(path).map(BufReader::new))
        .transpose()?;
    let flags = (&args).into();

    let report = run_audit(input, utility_file, &file_output, &flags)?;

    for insight in &report.insights {
        info!("{insight}");
    }
    for warning in &report.warnings {
        info!("Warning: {warning}");
    }

    Ok(())
}
