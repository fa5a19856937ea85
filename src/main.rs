use anyhow::Context;
use clap::{Parser, Subcommand};
use royalbit_paramsync::cli::{self, ReportOptions};
use royalbit_paramsync::config::SyncConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paramsync")]
#[command(about = "Round-trip element parameters between a project file and Excel.")]
#[command(long_about = "ParamSync - element parameters ⇄ Excel workbooks

Exports element attributes to color-coded sheets, lets you edit them in
Excel, and writes the changes back. The fill color of every exported cell
says whether it will be written back on import:

  Grey    - the element has no such parameter
  Red     - read-only or identity parameter
  Yellow  - type parameter (changes every element of that type)
  Green   - editable instance parameter

COMMANDS:
  export            - Categories → Excel, one sheet per category
  import            - Excel → project, color-filtered
  export-schedules  - Schedules → Excel, one sheet per schedule
  import-schedules  - Edited schedule sheets → project
  resolve           - Show how a parameter name resolves on one element
  categories        - List exportable categories
  schedules         - List schedules

EXAMPLES:
  paramsync export project.yaml walls.xlsx -c Walls -a Mark -a Height
  paramsync import project.yaml walls.xlsx --error-report errors.xlsx
  paramsync export-schedules project.yaml schedules.xlsx -s \"Wall Schedule\"")]
#[command(version)]
struct Cli {
    /// Sync settings file (YAML)
    #[arg(long, global = true, env = "PARAMSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export categories of elements to Excel
    Export {
        /// Project file (YAML)
        document: PathBuf,

        /// Output Excel file path (.xlsx)
        output: PathBuf,

        /// Category to export (repeatable; all categories when omitted)
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Parameter name to export (repeatable)
        #[arg(short, long = "attr", required = true)]
        attributes: Vec<String>,

        /// Only elements visible in this view
        #[arg(long)]
        view: Option<String>,
    },

    #[command(long_about = "Import an edited workbook back into the project.

Only cells colored green (editable) or yellow (type parameter) are written,
and only when their value changed. Rows whose key matches no element and
values that cannot be converted are reported and skipped; everything else
is applied.

Row keys are matched by element id, then element name, then the fallback
key parameter (Mark by default).")]
    /// Import an edited workbook into the project
    Import {
        /// Project file (YAML)
        document: PathBuf,

        /// Input Excel file path (.xlsx)
        input: PathBuf,

        /// Only import these categories
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Only import these parameters
        #[arg(short, long = "attr")]
        attributes: Vec<String>,

        /// Apply changes in memory only; leave the project file untouched
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Save every error to this workbook
        #[arg(long)]
        error_report: Option<PathBuf>,

        /// Print the import report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export schedules to Excel
    ExportSchedules {
        /// Project file (YAML)
        document: PathBuf,

        /// Output Excel file path (.xlsx)
        output: PathBuf,

        /// Schedule to export (repeatable; all schedules when omitted)
        #[arg(short, long = "schedule")]
        schedules: Vec<String>,

        /// Leave out the header row
        #[arg(long)]
        no_headers: bool,

        /// Leave out grand total rows
        #[arg(long)]
        no_totals: bool,
    },

    /// Import edited schedule sheets into the project
    ImportSchedules {
        /// Project file (YAML)
        document: PathBuf,

        /// Input Excel file path (.xlsx)
        input: PathBuf,

        /// Schedule to import (repeatable; all schedules when omitted)
        #[arg(short, long = "schedule")]
        schedules: Vec<String>,

        /// Apply changes in memory only; leave the project file untouched
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Save every error to this workbook
        #[arg(long)]
        error_report: Option<PathBuf>,

        /// Print the import report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a parameter name resolves on one element
    Resolve {
        /// Project file (YAML)
        document: PathBuf,

        /// Element id
        id: i64,

        /// Parameter name
        attribute: String,
    },

    /// List categories and element counts
    Categories {
        /// Project file (YAML)
        document: PathBuf,
    },

    /// List schedules and their fields
    Schedules {
        /// Project file (YAML)
        document: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "royalbit_paramsync=debug"
    } else {
        "royalbit_paramsync=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = SyncConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load sync config")?;
    let verbose = cli.verbose;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Export {
                document,
                output,
                categories,
                attributes,
                view,
            } => cli::export(document, output, categories, attributes, view, config, verbose).await,

            Commands::Import {
                document,
                input,
                categories,
                attributes,
                dry_run,
                error_report,
                json,
            } => {
                let report = ReportOptions { error_report, json };
                cli::import(document, input, categories, attributes, dry_run, report, config, verbose)
                    .await
            }

            Commands::ExportSchedules {
                document,
                output,
                schedules,
                no_headers,
                no_totals,
            } => {
                config.include_headers &= !no_headers;
                config.include_grand_totals &= !no_totals;
                cli::export_schedules(document, output, schedules, config, verbose).await
            }

            Commands::ImportSchedules {
                document,
                input,
                schedules,
                dry_run,
                error_report,
                json,
            } => {
                let report = ReportOptions { error_report, json };
                cli::import_schedules(document, input, schedules, dry_run, report, config, verbose)
                    .await
            }

            Commands::Resolve {
                document,
                id,
                attribute,
            } => cli::resolve_attribute(document, id, attribute),

            Commands::Categories { document } => cli::categories(document),

            Commands::Schedules { document } => cli::schedules(document),
        }
    })?;

    Ok(())
}
