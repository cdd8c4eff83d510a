//! cloakdocs - command-line interface
//! Author: cloakdocs maintainers
//! Created: 2026-10-19
//!
//! Anonymizes one PDF submission and writes the audit record and key pair
//! next to it (or under `--audit-dir`).

use clap::{Arg, ArgAction, ArgMatches, Command, ValueEnum};
use cloakdocs::{AnonymizerConfig, Category, Pipeline, PipelineOutcome, RunRequest};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages (default)
    Info,
    /// Debug and all messages
    Debug,
    /// Trace and all messages (most verbose)
    Trace,
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let log_level = matches.get_one::<LogLevel>("verbose").unwrap_or(&LogLevel::Info);
    init_logging(log_level);

    info!("🚀 cloakdocs v{} - Starting...", env!("CARGO_PKG_VERSION"));

    let Some(input_path) = matches.get_one::<String>("input").map(PathBuf::from) else {
        error!("❌ Missing --input; see --help");
        process::exit(1);
    };
    let Some(output_path) = matches.get_one::<String>("output").map(PathBuf::from) else {
        error!("❌ Missing --output; see --help");
        process::exit(1);
    };
    let force_overwrite = matches.get_flag("force");
    let dry_run = matches.get_flag("dry-run");

    if !input_path.exists() {
        error!("❌ Input file does not exist: {}", input_path.display());
        process::exit(1);
    }
    if output_path.exists() && !force_overwrite && !dry_run {
        error!("❌ Output file already exists: {}", output_path.display());
        error!("   Use --force to overwrite existing files");
        process::exit(1);
    }

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            process::exit(1);
        }
    };

    let audit_dir = matches
        .get_one::<String>("audit-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| default_audit_dir(&output_path));

    display_config_summary(&config, &input_path, &output_path, &audit_dir);

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            error!("❌ Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let request = RunRequest {
        input: input_path,
        output: output_path.clone(),
        audit_dir: Some(audit_dir),
        dry_run,
    };

    let start_time = std::time::Instant::now();
    let outcome = match pipeline.execute(request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("❌ Anonymization failed: {}", e);
            process::exit(1);
        }
    };

    if let Some(report_path) = matches.get_one::<String>("report") {
        if let Err(e) = outcome.report.write(Path::new(report_path)) {
            error!("❌ Failed to write report: {}", e);
        }
    }

    display_completion_summary(&outcome, start_time.elapsed());

    let redaction_failed = outcome.redaction.as_ref().is_some_and(|r| !r.success);
    if redaction_failed {
        process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("cloakdocs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Anonymizes scholarly PDF submissions for blind peer review")
        .long_about("Detects author names, contact details and institutional affiliations in a PDF, \
                    masks them in place, and seals an encrypted audit record of everything removed. \
                    References, introduction and acknowledgement sections are never anonymized.")

        // Input/Output
        .arg(Arg::new("input")
            .short('i')
            .long("input")
            .value_name("FILE")
            .help("Input PDF file path"))

        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .value_name("FILE")
            .help("Anonymized PDF output path"))

        // Configuration
        .arg(Arg::new("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .help("Configuration file (JSON/YAML)"))

        .arg(Arg::new("categories")
            .long("categories")
            .value_name("LIST")
            .value_delimiter(',')
            .help("Categories to anonymize: author_name,contact_info,institution_info (default: all)"))

        .arg(Arg::new("audit-dir")
            .long("audit-dir")
            .value_name("DIR")
            .help("Directory for the audit record and key pair (default: <output dir>/audit)"))

        // Reporting
        .arg(Arg::new("report")
            .short('r')
            .long("report")
            .value_name("FILE")
            .help("Write a run report (.json, .md or .txt)"))

        // Advanced options
        .arg(Arg::new("force")
            .long("force")
            .action(ArgAction::SetTrue)
            .help("Force overwrite existing output files"))

        .arg(Arg::new("dry-run")
            .long("dry-run")
            .action(ArgAction::SetTrue)
            .help("Detect entities without writing the PDF or audit record"))

        // Logging
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .value_parser(clap::value_parser!(LogLevel))
            .default_value("info")
            .help("Set logging verbosity"))
}

fn init_logging(level: &LogLevel) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter_level = match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(format!("cloakdocs={}", filter_level)))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn load_config(matches: &ArgMatches) -> Result<AnonymizerConfig, String> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => AnonymizerConfig::from_file(path)
            .map_err(|e| format!("Failed to load config file: {}", e))?,
        None => AnonymizerConfig::default(),
    };

    if let Some(values) = matches.get_many::<String>("categories") {
        config.categories = values
            .map(|v| v.parse::<Category>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;
    }
    Ok(config)
}

fn default_audit_dir(output: &Path) -> PathBuf {
    output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("audit")
}

fn display_config_summary(config: &AnonymizerConfig, input: &Path, output: &Path, audit_dir: &Path) {
    let categories: Vec<&str> = config.requested_categories().iter().map(Category::as_str).collect();
    info!("📋 Configuration Summary:");
    info!("   Input:      {}", input.display());
    info!("   Output:     {}", output.display());
    info!("   Audit dir:  {}", audit_dir.display());
    info!("   Categories: {}", categories.join(", "));
    if !config.redaction.burn_in {
        warn!("   Burn-in disabled: output will be an unmodified copy");
    }
}

fn display_completion_summary(outcome: &PipelineOutcome, duration: std::time::Duration) {
    info!("📊 Processing Summary:");
    info!("   Total Time: {:.2?}", duration);
    for (category, tally) in &outcome.report.categories {
        info!(
            "   {}: {} detected, {} resolved, {} masked",
            category, tally.detected, tally.resolved, tally.masked
        );
    }
    if let Some(stored) = &outcome.stored_audit {
        info!("   Audit record: {}", stored.record_path.display());
        info!("   Private key:  {}", stored.private_key_path.display());
    }
    for entry in outcome.report.entries.iter().filter(|e| e.severity == cloakdocs::report::ReportSeverity::Warning) {
        warn!("   ⚠️ {}: {}", entry.stage, entry.message);
    }
    match &outcome.redaction {
        Some(redaction) if redaction.success => info!("🎉 Anonymized PDF written"),
        Some(redaction) => error!("❌ {}", redaction.report),
        None => info!("🔍 Dry run complete - no files were modified"),
    }
}
