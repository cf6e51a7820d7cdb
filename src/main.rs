use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use std::path::PathBuf;

use energy_report::config_loader::{self, CliOverrides};
use energy_report::summarize::{HttpSummarizer, Summarizer};
use energy_report::{analysis, pipeline, report, source::JsonRowSource};

/// Daily energy consumption report generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the report configuration YAML file
    #[arg(short, long, default_value = "energy-report.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output directory for reports; overrides the config file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the report for the day before the reference instant
    Run {
        /// Reference instant (RFC 3339); defaults to now
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,

        /// Skip the narrative summarization call
        #[arg(long)]
        no_summary: bool,
    },

    /// Show the current and baseline windows
    Windows {
        /// Reference instant (RFC 3339); defaults to now
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
    },

    /// Re-render a stored JSON report as text and HTML
    Render {
        /// Path to a report_<date>.json file
        report: PathBuf,
    },
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid RFC 3339 timestamp '{}': {}", s, e))
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let cli = Cli::parse();

    // Config is read before the logger starts so its log_level can apply
    let config = match &cli.command {
        Commands::Render { .. } => None,
        _ => Some(config_loader::load_config(&cli.config)),
    };
    let level = cli
        .log_level
        .clone()
        .or_else(|| {
            config
                .as_ref()
                .and_then(|c| c.as_ref().ok())
                .and_then(|c| c.general.log_level.clone())
        })
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
    let config = config.transpose()?;

    info!("Starting energy report v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run { now, no_summary } => {
            let mut config = config.ok_or_else(|| eyre!("Configuration required"))?;
            config.resolve_secrets();
            config_loader::apply_overrides(
                &mut config,
                &CliOverrides {
                    reports_dir: cli.output.clone(),
                    no_summary,
                },
            )?;

            let source = JsonRowSource::open(&config.source.path)?;

            let summarizer = if config.summarizer.enabled {
                match HttpSummarizer::new(&config.summarizer) {
                    Ok(s) => Some(s),
                    Err(e) => {
                        warn!("Summarizer unavailable: {}", e);
                        None
                    }
                }
            } else {
                None
            };

            let now = now.unwrap_or_else(Utc::now);
            let outcome = pipeline::run_report(
                &config,
                now,
                &source,
                summarizer.as_ref().map(|s| s as &dyn Summarizer),
            )?;

            report::print_summary(&outcome.document);
            info!("Report saved: {}", outcome.json_path.display());
        }
        Commands::Windows { now } => {
            let config = config.ok_or_else(|| eyre!("Configuration required"))?;
            let now = now.unwrap_or_else(Utc::now);
            let windows = analysis::select_windows(now, config.comparison.baseline_span)?;

            println!("Reference instant: {}", now.to_rfc3339());
            println!(
                "Current:  [{}, {}] ({})",
                windows.current.start(),
                windows.current.end(),
                analysis::window_date(&windows.current)
            );
            if config.comparison.enabled {
                println!(
                    "Baseline: [{}, {}] ({:.2} days, {:?})",
                    windows.baseline.start(),
                    windows.baseline.end(),
                    windows.baseline.span_days(),
                    config.comparison.reducer
                );
            } else {
                println!("Baseline: disabled");
            }
        }
        Commands::Render { report: path } => {
            let document = report::load_json_report(&path)?;
            let dir = match &cli.output {
                Some(dir) => dir.clone(),
                None => path
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from(".")),
            };
            std::fs::create_dir_all(&dir)
                .wrap_err_with(|| format!("Failed to create output directory '{}'", dir.display()))?;
            let (text, html) = report::write_rendered_reports(&document, &dir)?;
            info!("Rendered {} and {}", text.display(), html.display());
        }
    }

    Ok(())
}
