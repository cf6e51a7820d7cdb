//! Report documents: JSON for downstream consumers, text and HTML for people.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use minijinja::{AutoEscape, Environment, Value};
use serde::{Deserialize, Serialize};

use crate::analysis::ReportSummary;

/// The persisted report: the pipeline output plus its narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    /// Calendar day covered by the current window (YYYY-MM-DD)
    pub date: String,
    #[serde(flatten)]
    pub summary: ReportSummary,
    pub llm_summary: String,
}

impl ReportDocument {
    pub fn new(date: String, summary: ReportSummary, llm_summary: String) -> Self {
        Self {
            date,
            summary,
            llm_summary,
        }
    }

    /// Base file name shared by the JSON, text and HTML forms
    pub fn file_stem(&self) -> String {
        format!("report_{}", self.date)
    }
}

fn fmt_opt(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:.2}{}", v, suffix),
        None => "n/a".to_string(),
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.2}%", v),
        None => "n/a".to_string(),
    }
}

/// Write the JSON report into `dir`, returning its path
pub fn write_json_report(doc: &ReportDocument, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("{}.json", doc.file_stem()));
    let json = serde_json::to_string_pretty(doc)
        .context("Failed to serialize report to JSON")?;

    fs::write(&path, json)
        .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;

    log::info!("JSON report written to {}", path.display());
    Ok(path)
}

/// Read a previously written JSON report
pub fn load_json_report(path: &Path) -> Result<ReportDocument> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report JSON in {}", path.display()))
}

/// Render the human-readable text report
pub fn render_text(doc: &ReportDocument) -> String {
    let summary = &doc.summary;
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push("=".repeat(80));
    lines.push(format!("                        DAILY ENERGY REPORT {}", doc.date));
    lines.push("=".repeat(80));
    lines.push(String::new());

    lines.push(format!(
        "Current window:  {} .. {}",
        summary.period.current.start(), summary.period.current.end()
    ));
    match summary.period.baseline {
        Some(baseline) => lines.push(format!(
            "Baseline window: {} .. {} ({:.0} days)",
            baseline.start(),
            baseline.end(),
            baseline.span_days()
        )),
        None => lines.push("Baseline window: disabled".to_string()),
    }
    lines.push(String::new());

    lines.push("System Totals:".to_string());
    if summary.system_totals.is_empty() {
        lines.push("  (no samples)".to_string());
    }
    for total in &summary.system_totals {
        lines.push(format!(
            "  {}: Total {:.2} kWh, Peak {:.2} kW",
            total.device_type, total.total_energy, total.peak_effect
        ));
    }
    lines.push(String::new());

    if !summary.group_totals.is_empty() {
        lines.push("Group Totals:".to_string());
        for total in &summary.group_totals {
            lines.push(format!(
                "  {} / {}: Total {:.2} kWh, Peak {:.2} kW",
                total.group_name.as_deref().unwrap_or("(ungrouped)"),
                total.device_type,
                total.total_energy,
                total.peak_effect
            ));
        }
        lines.push(String::new());
    }

    if summary.period.baseline.is_some() {
        lines.push("Baseline Comparison:".to_string());
        for record in &summary.comparisons {
            lines.push(format!(
                "  {}: {:.2} kWh vs typical {} ({})",
                record.device_type,
                record.current_total_energy,
                fmt_opt(record.baseline_mean_energy, " kWh"),
                fmt_pct(record.energy_change_pct)
            ));
        }
        lines.push(String::new());
    }

    lines.push("Spikes / Anomalies:".to_string());
    if summary.spikes.is_empty() {
        lines.push("  none".to_string());
    }
    for spike in &summary.spikes {
        lines.push(format!("  {}: {} spikes", spike.serial, spike.spike_count));
    }
    lines.push(String::new());

    lines.push("Summary:".to_string());
    lines.push(format!("  {}", doc.llm_summary));
    lines.push(String::new());

    // Footer
    lines.push("=".repeat(80));

    lines.join("\n")
}

/// Layout of the HTML report body. Every interpolated value is HTML-escaped.
const HTML_TEMPLATE: &str = r#"<h2>Daily Energy Report {{ date }}</h2>
<h3>System Totals</h3>
<ul>
{%- for total in system_totals %}
<li>{{ total.type }}: Total {{ total.total_energy | fixed }} kWh, Peak {{ total.peak_effect | fixed }} kW</li>
{%- endfor %}
</ul>
{%- if period.baseline %}
<h3>Compared to Baseline</h3>
<ul>
{%- for record in comparisons %}
<li>{{ record.type }}: {{ record.current_total_energy | fixed }} kWh vs typical {{ record.baseline_mean_energy | kwh_or_na }} ({{ record.energy_change_pct | pct_or_na }})</li>
{%- endfor %}
</ul>
{%- endif %}
<h3>Spikes / Anomalies</h3>
<ul>
{%- for spike in spikes %}
<li>{{ spike.serial }}: {{ spike.spike_count }} spikes</li>
{%- endfor %}
</ul>
<h3>LLM Summary</h3>
<p>{{ llm_summary }}</p>
"#;

fn html_environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.add_filter("fixed", fixed_filter);
    env.add_filter("kwh_or_na", kwh_or_na_filter);
    env.add_filter("pct_or_na", pct_or_na_filter);
    env.add_template("report.html", HTML_TEMPLATE)?;
    Ok(env)
}

/// Filter: two decimal places.
fn fixed_filter(value: f64) -> String {
    format!("{:.2}", value)
}

/// Filter: optional energy, "n/a" when undefined. Output holds no markup.
fn kwh_or_na_filter(value: Option<f64>) -> Value {
    Value::from_safe_string(fmt_opt(value, " kWh"))
}

/// Filter: signed percentage, "n/a" when undefined. Output holds no markup.
fn pct_or_na_filter(value: Option<f64>) -> Value {
    Value::from_safe_string(fmt_pct(value))
}

/// Render the HTML report body used for delivery
pub fn render_html(doc: &ReportDocument) -> Result<String> {
    let env = html_environment().context("Failed to load HTML report template")?;
    let template = env
        .get_template("report.html")
        .context("Failed to load HTML report template")?;
    template
        .render(doc)
        .with_context(|| format!("Failed to render HTML report for {}", doc.date))
}

/// Write text and HTML renderings next to the JSON report
pub fn write_rendered_reports(doc: &ReportDocument, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let text_path = dir.join(format!("{}.txt", doc.file_stem()));
    fs::write(&text_path, render_text(doc))
        .with_context(|| format!("Failed to write text report to {}", text_path.display()))?;
    log::info!("Text report written to {}", text_path.display());

    let html_path = dir.join(format!("{}.html", doc.file_stem()));
    fs::write(&html_path, render_html(doc)?)
        .with_context(|| format!("Failed to write HTML report to {}", html_path.display()))?;
    log::info!("HTML report written to {}", html_path.display());

    Ok((text_path, html_path))
}

/// Print a summary to stdout
pub fn print_summary(doc: &ReportDocument) {
    let summary = &doc.summary;
    println!("\n=== DAILY ENERGY REPORT {} ===\n", doc.date);
    println!("Device types: {}", summary.system_totals.len());
    println!("Groups: {}", summary.group_totals.len());

    let total: f64 = summary.system_totals.iter().map(|t| t.total_energy).sum();
    println!("Total energy: {:.2} kWh", total);

    if summary.period.baseline.is_some() {
        println!("\nBaseline comparison:");
        for record in &summary.comparisons {
            println!("  {}: {}", record.device_type, fmt_pct(record.energy_change_pct));
        }
    }

    let spikes: usize = summary.spikes.iter().map(|s| s.spike_count).sum();
    println!("\nSpikes: {} across {} devices", spikes, summary.spikes.len());

    println!();
}
