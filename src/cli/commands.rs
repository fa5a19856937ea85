use crate::config::SyncConfig;
use crate::core::codec::decode;
use crate::core::resolve;
use crate::error::{SyncError, SyncResult};
use crate::excel::{write_error_report, ImportReport};
use crate::host::{HostDocument, MemoryDocument, Scope};
use crate::parser;
use crate::sync::Coordinator;
use crate::types::EntityId;
use crate::writer;
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// How an import result is reported
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Save every error to this workbook
    pub error_report: Option<PathBuf>,
    /// Print the report as JSON instead of the console summary
    pub json: bool,
}

/// Progress printer; the line is overwritten in place
fn progress_line(quiet: bool) -> impl FnMut(u8) {
    move |percent| {
        if quiet {
            return;
        }
        print!("\r   Progress: {:>3}%", percent);
        if percent == 100 {
            println!();
        }
        let _ = std::io::stdout().flush();
    }
}

fn load(document: &Path, verbose: bool) -> SyncResult<MemoryDocument> {
    if verbose {
        println!("{}", "📖 Reading project file...".cyan());
    }
    let doc = parser::parse_document(document)?;
    if verbose {
        println!(
            "   Found {} elements, {} schedules\n",
            doc.elements().len(),
            doc.schedule_definitions().len()
        );
    }
    Ok(doc)
}

/// Execute the export command
pub async fn export(
    document: PathBuf,
    output: PathBuf,
    categories: Vec<String>,
    attributes: Vec<String>,
    view: Option<String>,
    config: SyncConfig,
    verbose: bool,
) -> SyncResult<()> {
    println!("{}", "📐 ParamSync - Excel Export".bold().green());
    println!("   Project: {}", document.display());
    println!("   Output:  {}\n", output.display());

    let mut doc = load(&document, verbose)?;
    let scope = view.map(Scope::View).unwrap_or_default();

    let mut coordinator = Coordinator::new(&mut doc, config);
    let summary = coordinator
        .export_categories(&output, &categories, &attributes, &scope, progress_line(false))
        .await?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!(
        "   {} sheets, {} elements → {}\n",
        summary.sheets,
        summary.rows,
        output.display()
    );
    Ok(())
}

/// Execute the export-schedules command
pub async fn export_schedules(
    document: PathBuf,
    output: PathBuf,
    schedules: Vec<String>,
    config: SyncConfig,
    verbose: bool,
) -> SyncResult<()> {
    println!("{}", "📐 ParamSync - Schedule Export".bold().green());
    println!("   Project: {}", document.display());
    println!("   Output:  {}\n", output.display());

    let mut doc = load(&document, verbose)?;
    for name in &schedules {
        if !doc.schedules().iter().any(|s| &s.name == name) {
            println!("{}", format!("⚠️  Schedule not found: {}", name).yellow());
        }
    }

    let mut coordinator = Coordinator::new(&mut doc, config);
    let summary = coordinator
        .export_schedules(&output, &schedules, progress_line(false))
        .await?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!(
        "   {} schedules, {} rows → {}\n",
        summary.sheets,
        summary.rows,
        output.display()
    );
    Ok(())
}

/// Execute the import command
#[allow(clippy::too_many_arguments)]
pub async fn import(
    document: PathBuf,
    input: PathBuf,
    categories: Vec<String>,
    attributes: Vec<String>,
    dry_run: bool,
    report_options: ReportOptions,
    config: SyncConfig,
    verbose: bool,
) -> SyncResult<()> {
    if !report_options.json {
        println!("{}", "📐 ParamSync - Excel Import".bold().green());
        println!("   Input:   {}", input.display());
        println!("   Project: {}\n", document.display());
    }

    let mut doc = load(&document, verbose && !report_options.json)?;
    let preview = config.error_preview;
    let report = Coordinator::new(&mut doc, config)
        .import_categories(&input, &categories, &attributes, progress_line(report_options.json))
        .await?;

    finish_import(&document, &doc, &report, dry_run, &report_options, preview)
}

/// Execute the import-schedules command
pub async fn import_schedules(
    document: PathBuf,
    input: PathBuf,
    schedules: Vec<String>,
    dry_run: bool,
    report_options: ReportOptions,
    config: SyncConfig,
    verbose: bool,
) -> SyncResult<()> {
    if !report_options.json {
        println!("{}", "📐 ParamSync - Schedule Import".bold().green());
        println!("   Input:   {}", input.display());
        println!("   Project: {}\n", document.display());
    }

    let mut doc = load(&document, verbose && !report_options.json)?;
    let preview = config.error_preview;
    let report = Coordinator::new(&mut doc, config)
        .import_schedules(&input, &schedules, progress_line(report_options.json))
        .await?;

    finish_import(&document, &doc, &report, dry_run, &report_options, preview)
}

fn finish_import(
    document: &Path,
    doc: &MemoryDocument,
    report: &ImportReport,
    dry_run: bool,
    options: &ReportOptions,
    preview: usize,
) -> SyncResult<()> {
    if !dry_run && report.written > 0 {
        writer::write_document(document, doc)?;
    }

    if let Some(path) = &options.error_report {
        write_error_report(&report.errors, path)?;
    }

    if options.json {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| SyncError::Parse(format!("Failed to serialize report: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    print_summary(report, preview);

    if dry_run {
        println!("{}", "📋 Dry run - project file not modified".yellow());
    } else if report.written > 0 {
        println!("   Project file updated: {}", document.display());
    }
    if let Some(path) = &options.error_report {
        println!("   Error report: {}", path.display());
    }
    println!();
    Ok(())
}

/// Counts plus the first `preview` errors
fn print_summary(report: &ImportReport, preview: usize) {
    if report.has_errors() {
        println!("{}", "⚠️  Import finished with errors".bold().yellow());
    } else {
        println!("{}", "✅ Import Complete!".bold().green());
    }
    println!(
        "   Sheets: {}  Rows: {}  Written: {}  Skipped: {}  Errors: {}",
        report.sheets,
        report.rows,
        report.written.to_string().bright_green(),
        report.skipped,
        if report.errors.is_empty() {
            "0".normal()
        } else {
            report.errors.len().to_string().bright_red()
        }
    );

    if report.has_errors() {
        println!();
        for record in report.errors.iter().take(preview) {
            println!("   {} {}", record.key.bright_blue(), record.description());
        }
        if report.errors.len() > preview {
            println!(
                "   {}",
                format!("... and {} more", report.errors.len() - preview).dimmed()
            );
        }
    }
}

/// Execute the resolve command
pub fn resolve_attribute(document: PathBuf, id: i64, attribute: String) -> SyncResult<()> {
    let doc = parser::parse_document(&document)?;
    let id = EntityId(id);
    if !doc.exists(id) {
        return Err(SyncError::Parse(format!("No element with id {}", id)));
    }

    println!("{}", format!("🔍 {} on element {}", attribute, id).bold().green());
    match resolve(&doc, id, &attribute) {
        Some(slot) => {
            println!("   Tier:      {}", slot.tier.label().bright_blue());
            println!("   Kind:      {}", slot.kind.label());
            if let Some(unit) = slot.unit {
                println!("   Unit:      {}", unit.symbol());
            }
            println!("   Read-only: {}", if slot.read_only { "yes" } else { "no" });
            println!("   Value:     {}", decode(&doc, &slot).bold());
        }
        None => println!("   {}", "Not available on this element".yellow()),
    }
    Ok(())
}

/// Execute the categories command
pub fn categories(document: PathBuf) -> SyncResult<()> {
    let doc = parser::parse_document(&document)?;
    println!("{}", "📂 Categories".bold().green());
    for category in doc.categories() {
        let count = doc.entities(&category, &Scope::Document).len();
        println!("   {} ({})", category.bright_blue(), count);
    }
    Ok(())
}

/// Execute the schedules command
pub fn schedules(document: PathBuf) -> SyncResult<()> {
    let doc = parser::parse_document(&document)?;
    println!("{}", "📋 Schedules".bold().green());
    for schedule in doc.schedules() {
        println!(
            "   {} [{}] {}",
            schedule.name.bright_blue(),
            schedule.category,
            schedule.fields.join(", ").dimmed()
        );
    }
    Ok(())
}
