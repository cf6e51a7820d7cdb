//! Comparison of the current day against the historical baseline.
//!
//! The current side is a per-type *sum* over one day; the baseline side is
//! reduced to a daily-comparable figure (by default the daily mean over the
//! baseline window). The join is a left outer join driven by the current
//! types.

use std::collections::BTreeMap;

use super::aggregate::aggregate;
use super::error::PipelineError;
use super::types::*;

/// Baseline figures for one device type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineAggregate {
    /// Reduced energy; `None` when the window has no coverage to divide by
    pub mean_energy: Option<f64>,
    pub peak_effect: f64,
}

/// Reduce baseline rows to per-type baseline figures.
pub fn baseline_aggregates(
    rows: &[SampleRow],
    window: &TimeWindow,
    reducer: BaselineReducer,
) -> Result<BTreeMap<String, BaselineAggregate>, PipelineError> {
    let sums = aggregate(rows, |row| row.device_type.clone())?;

    let coverage_days = window.span_days();
    if reducer == BaselineReducer::DailyMean && coverage_days <= 0.0 && !sums.is_empty() {
        log::warn!(
            "Baseline window [{}, {}] has zero length; baseline energy is undefined",
            window.start(),
            window.end()
        );
    }

    Ok(sums
        .into_iter()
        .map(|(device_type, agg)| {
            let mean_energy = match reducer {
                BaselineReducer::DailyMean if coverage_days > 0.0 => {
                    Some(agg.total_energy / coverage_days).filter(|mean| mean.is_finite())
                }
                BaselineReducer::DailyMean => None,
                BaselineReducer::Sum => Some(agg.total_energy),
            };
            (
                device_type,
                BaselineAggregate {
                    mean_energy,
                    peak_effect: agg.peak_effect,
                },
            )
        })
        .collect())
}

/// Relative change in percent, or `None` when the baseline cannot divide.
pub fn energy_change_pct(current: f64, baseline: Option<f64>) -> Option<f64> {
    let baseline = baseline.filter(|b| b.is_finite() && *b != 0.0)?;
    let pct = (current - baseline) / baseline * 100.0;
    pct.is_finite().then_some(pct)
}

/// Join current aggregates to baseline figures.
///
/// Every current type appears exactly once; types seen only in the
/// baseline are dropped.
pub fn compare(
    current: &BTreeMap<String, Aggregate>,
    baseline: &BTreeMap<String, BaselineAggregate>,
) -> Vec<ComparisonRecord> {
    current
        .iter()
        .map(|(device_type, agg)| {
            let base = baseline.get(device_type);
            let baseline_mean_energy = base.and_then(|b| b.mean_energy);
            ComparisonRecord {
                device_type: device_type.clone(),
                current_total_energy: agg.total_energy,
                current_peak_effect: agg.peak_effect,
                baseline_mean_energy,
                baseline_peak_effect: base.map(|b| b.peak_effect),
                energy_change_pct: energy_change_pct(agg.total_energy, baseline_mean_energy),
            }
        })
        .collect()
}

/// Reduce baseline rows and compare them against current aggregates.
pub fn compare_rows(
    current: &BTreeMap<String, Aggregate>,
    baseline_rows: &[SampleRow],
    baseline_window: &TimeWindow,
    reducer: BaselineReducer,
) -> Result<Vec<ComparisonRecord>, PipelineError> {
    let baseline = baseline_aggregates(baseline_rows, baseline_window, reducer)?;
    Ok(compare(current, &baseline))
}
