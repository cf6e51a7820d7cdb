//! # Energy Report - daily energy consumption reporting
//!
//! This library turns per-meter energy samples into a daily report:
//! per-type and per-group totals, a comparison of yesterday against a
//! typical day from the historical baseline, and per-device spike counts.
//!
//! ## Architecture
//!
//! - `analysis`: the pure pipeline (windows, aggregation, baseline
//!   comparison, spike rollup, report assembly). No I/O.
//! - `source`: row sources that push window and enabled-device filtering
//!   down to the data.
//! - `summarize`: optional narrative summarization over HTTP.
//! - `report`: JSON, text and HTML report documents.
//! - `config` / `config_loader`: YAML configuration.
//! - `pipeline`: end-to-end orchestration of one run.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use energy_report::{config_loader, pipeline, source::JsonRowSource};
//!
//! let config = config_loader::load_config("energy-report.yaml".as_ref())?;
//! let source = JsonRowSource::open(&config.source.path)?;
//! let outcome = pipeline::run_report(&config, chrono::Utc::now(), &source, None)?;
//! println!("Report written to {}", outcome.json_path.display());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   reports_dir: "/reports"
//!   log_level: info
//!
//! source:
//!   path: "samples.json"
//!
//! comparison:
//!   enabled: true
//!   baseline_span: "365days"
//!   reducer: daily_mean   # or sum
//!
//! summarizer:
//!   enabled: true
//!   endpoint: "https://api-inference.huggingface.co/models/gpt-4"
//!   api_key_env: "HUGGINGFACE_API_KEY"
//!   timeout: "30s"
//! ```
//!
//! ## Error Handling
//!
//! Malformed rows and invalid windows abort a run with a
//! [`analysis::PipelineError`]. Summarization and rendering failures are
//! logged and never abort a run. Application-level functions return
//! `color_eyre::Result`.

pub mod analysis;
pub mod config;
pub mod config_loader;
pub mod source;
pub mod summarize;
pub mod report;
pub mod pipeline;
