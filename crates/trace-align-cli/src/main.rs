//! Trace Align CLI
//!
//! The `trace-align` command repairs an event log against a process model
//! using optimal alignments from an external conformance-checking engine.
//!
//! ## Commands
//!
//! - `align`: run the engine, repair every trace and write the result
//! - `inspect`: parse the engine's output files and report what they hold

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use trace_align_core::{
    align_traces, parse_alignments, parse_case_info, read_event_log, write_output,
    AlignmentEngine, AlignmentRun, JarConformanceChecker, ParseMode, Settings,
};

#[derive(Parser)]
#[command(name = "trace-align")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Repair event logs from optimal model alignments", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair a log and write the aligned records
    Align {
        /// Settings file (TOML)
        #[arg(short, long, env = "TRACE_ALIGN_SETTINGS")]
        settings: PathBuf,

        /// Event log (JSON array of events)
        #[arg(short, long)]
        log: PathBuf,

        /// Where to write the repaired records (JSON)
        #[arg(short, long, default_value = "aligned.json")]
        output: PathBuf,

        /// Use existing alignment files instead of running the engine
        #[arg(long)]
        skip_tool: bool,

        /// Treat the log as single-timestamp regardless of settings
        #[arg(long)]
        one_timestamp: bool,

        /// Fail on the first malformed alignment row
        #[arg(long)]
        strict: bool,
    },

    /// Parse the alignment files and summarise them
    Inspect {
        /// Settings file (TOML)
        #[arg(short, long, env = "TRACE_ALIGN_SETTINGS")]
        settings: PathBuf,

        /// Fail on the first malformed alignment row
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    trace_align_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Align {
            settings,
            log,
            output,
            skip_tool,
            one_timestamp,
            strict,
        } => {
            let mut settings = load_settings(&settings, strict)?;
            settings.one_timestamp |= one_timestamp;
            cmd_align(&settings, &log, &output, skip_tool).await
        }
        Commands::Inspect { settings, strict } => {
            let settings = load_settings(&settings, strict)?;
            cmd_inspect(&settings)
        }
    }
}

fn load_settings(path: &Path, strict: bool) -> Result<Settings> {
    let mut settings = Settings::from_file(path)
        .with_context(|| format!("Failed to load settings from {:?}", path))?;
    if strict {
        settings.parse_mode = ParseMode::Strict;
    }
    Ok(settings)
}

/// Run the engine (unless skipped), repair the log and write the result
async fn cmd_align(
    settings: &Settings,
    log_path: &Path,
    output: &Path,
    skip_tool: bool,
) -> Result<()> {
    let log = read_event_log(log_path, settings.one_timestamp)
        .with_context(|| format!("Failed to read event log {:?}", log_path))?;
    info!("Read {} traces from {:?}", log.trace_count(), log_path);

    let engine = match (&settings.tool, skip_tool) {
        (Some(tool), false) => Some(JarConformanceChecker::new(tool.clone())),
        _ => None,
    };
    if engine.is_none() {
        info!("Using existing alignment files");
    }

    let run = align_traces(
        &log,
        settings,
        engine.as_ref().map(|e| e as &dyn AlignmentEngine),
    )
    .await
    .context("Alignment run failed")?;

    write_output(output, &run.report.output)
        .with_context(|| format!("Failed to write {:?}", output))?;

    print_summary(&run, output);
    Ok(())
}

fn print_summary(run: &AlignmentRun, output: &Path) {
    if let Some(tool) = &run.tool {
        println!("Conformance engine finished in {} ms", tool.duration_ms);
    }
    println!(
        "Loaded {} alignment templates and {} cases ({} rows rejected)",
        run.load.templates,
        run.load.cases,
        run.load.rejected_total()
    );

    let report = &run.report;
    println!(
        "Aligned {} traces, skipped {}",
        report.aligned_count(),
        report.skipped_count()
    );
    for (kind, count) in report.skip_summary() {
        println!("  {:<20} {}", kind, count);
    }
    let truncated = report.truncated_count();
    if truncated > 0 {
        println!("{} aligned traces had raw events past their last move", truncated);
    }
    println!("Wrote {} records to {:?}", report.output.len(), output);
}

/// Parse both alignment files and report their contents
fn cmd_inspect(settings: &Settings) -> Result<()> {
    let raw = std::fs::read_to_string(&settings.alignment_file)
        .with_context(|| format!("Failed to read {:?}", settings.alignment_file))?;
    let alignments = parse_alignments(&raw, settings.parse_mode)
        .with_context(|| format!("Failed to parse {:?}", settings.alignment_file))?;

    let raw = std::fs::read_to_string(&settings.case_info_file)
        .with_context(|| format!("Failed to read {:?}", settings.case_info_file))?;
    let cases = parse_case_info(&raw, settings.parse_mode)
        .with_context(|| format!("Failed to parse {:?}", settings.case_info_file))?;

    println!("Alignment templates: {}", alignments.records.len());
    for template in &alignments.records {
        println!("  trace type {:>4}: {} moves", template.trace_type, template.moves.len());
    }

    let perfect = cases.records.iter().filter(|c| c.is_perfect_fit()).count();
    let zero = cases.records.iter().filter(|c| c.is_zero_fit()).count();
    println!(
        "Cases: {} ({} perfect fit, {} zero fit, {} to repair)",
        cases.records.len(),
        perfect,
        zero,
        cases.records.len() - perfect - zero
    );

    for err in alignments.rejected.iter().chain(&cases.rejected) {
        println!("  rejected: {}", err);
    }

    Ok(())
}
