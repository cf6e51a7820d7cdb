//! End-to-end report generation.
//!
//! Fetches rows for the selected windows, runs the analysis pipeline, asks
//! the optional summarizer for a narrative and writes the report files.
//! Only the row fetch and the analysis can fail a run; the summarizer and
//! the text/HTML rendering degrade to warnings.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use color_eyre::eyre::{Context, Result};
use log::{info, warn};

use crate::analysis::{self, ReportSummary, ReportWindows};
use crate::config::Config;
use crate::report::{self, ReportDocument};
use crate::source::RowSource;
use crate::summarize::{summarize_or_sentinel, Summarizer};

/// Files produced by one run
#[derive(Debug)]
pub struct RunOutcome {
    pub document: ReportDocument,
    pub json_path: PathBuf,
    /// Text and HTML renderings, absent if rendering failed
    pub rendered: Option<(PathBuf, PathBuf)>,
}

/// Select windows, fetch rows and build the summary.
pub fn generate_summary(
    config: &Config,
    now: DateTime<Utc>,
    source: &dyn RowSource,
) -> Result<(ReportWindows, ReportSummary)> {
    let windows = analysis::select_windows(now, config.comparison.baseline_span)?;
    info!(
        "Reporting on {} (current [{}, {}])",
        analysis::window_date(&windows.current),
        windows.current.start(),
        windows.current.end()
    );

    let current_rows = source
        .fetch(&windows.current)
        .context("Failed to fetch current-window rows")?;

    let baseline_rows = if config.comparison.enabled {
        info!(
            "Baseline window [{}, {}] ({:.0} days, {:?} reducer)",
            windows.baseline.start(),
            windows.baseline.end(),
            windows.baseline.span_days(),
            config.comparison.reducer
        );
        Some(
            source
                .fetch(&windows.baseline)
                .context("Failed to fetch baseline-window rows")?,
        )
    } else {
        None
    };

    let summary = analysis::build_summary_for_windows(
        &windows,
        &current_rows,
        baseline_rows.as_deref(),
        config.comparison.reducer,
    )
    .context("Report pipeline rejected input rows")?;

    info!(
        "Report covers {} device types, {} comparisons, {} spiking devices",
        summary.system_totals.len(),
        summary.comparisons.len(),
        summary.spikes.len()
    );

    Ok((windows, summary))
}

/// Produce the full report document and write it to the reports directory.
pub fn run_report(
    config: &Config,
    now: DateTime<Utc>,
    source: &dyn RowSource,
    summarizer: Option<&dyn Summarizer>,
) -> Result<RunOutcome> {
    let (windows, summary) = generate_summary(config, now, source)?;
    let date = analysis::window_date(&windows.current).to_string();

    let narrative = summarize_or_sentinel(summarizer, &date, &summary);
    let document = ReportDocument::new(date, summary, narrative);

    let dir = &config.general.reports_dir;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create reports directory '{}'", dir.display()))?;

    let json_path = report::write_json_report(&document, dir)?;

    let rendered = match report::write_rendered_reports(&document, dir) {
        Ok(paths) => Some(paths),
        Err(e) => {
            warn!("Rendering failed; JSON report is still available: {:#}", e);
            None
        }
    };

    Ok(RunOutcome {
        document,
        json_path,
        rendered,
    })
}
