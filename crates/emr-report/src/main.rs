use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use emr_model::{import_csv_path, CsvOptions};
use emr_pivot::DegeneratePolicy;
use emr_report::{default_registry, run_to_dir, OutputDir, ReportSettings};
use env_logger::Env;

#[derive(Parser, Debug)]
#[command(about = "Exploratory charts and cross-tabulations for an EMR extract")]
struct Args {
    /// Input CSV file.
    #[arg(long, required_unless_present = "list_reports")]
    input: Option<PathBuf>,

    /// Directory receiving the charts, tables and manifest.json.
    #[arg(long, default_value = "emr-report-out")]
    output_dir: PathBuf,

    /// JSON settings file (bucket schemes, degenerate policy, enabled reports, ...).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only run the given report (repeatable).
    #[arg(long = "report")]
    reports: Vec<String>,

    /// Field delimiter of the input file.
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Abort the run when a report's required column is missing.
    #[arg(long)]
    strict_columns: bool,

    /// How to normalize a group whose total is zero: `fail` or `zero`.
    #[arg(long)]
    degenerate_policy: Option<DegeneratePolicy>,

    /// Exit non-zero if any report failed.
    #[arg(long)]
    fail_on_error: bool,

    /// Print the registered reports and exit.
    #[arg(long)]
    list_reports: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let registry = default_registry();
    if args.list_reports {
        for spec in &registry {
            println!("{:<30} {}", spec.id, spec.title);
        }
        return Ok(());
    }

    let mut settings = match &args.config {
        Some(path) => ReportSettings::from_json_path(path)?,
        None => ReportSettings::default(),
    };
    if !args.reports.is_empty() {
        settings.reports = args.reports.clone();
    }
    if args.strict_columns {
        settings.strict_columns = true;
    }
    if let Some(policy) = args.degenerate_policy {
        settings.degenerate_policy = policy;
    }

    let Some(input) = args.input.as_deref() else {
        bail!("--input is required");
    };
    let delimiter = u8::try_from(args.delimiter)
        .with_context(|| format!("delimiter {:?} must be a single-byte character", args.delimiter))?;
    let options = CsvOptions {
        delimiter,
        ..CsvOptions::default()
    };
    let table = import_csv_path(input, options)
        .with_context(|| format!("failed to load {}", input.display()))?;
    log::info!(
        "loaded {}: {} rows x {} columns",
        input.display(),
        table.row_count(),
        table.column_count()
    );

    let output = OutputDir::create(&args.output_dir)?;
    let manifest = run_to_dir(
        &table,
        &input.display().to_string(),
        &registry,
        &settings,
        &output,
    )?;
    print!("{}", manifest.render_text());

    if args.fail_on_error && manifest.has_failures() {
        bail!("{} report(s) failed", manifest.count(emr_report::ReportStatus::Failed));
    }
    Ok(())
}
