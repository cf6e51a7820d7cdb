//! Report assembly.
//!
//! Runs the aggregation, comparison and spike stages over the rows of one
//! run and composes their outputs into a single [`ReportSummary`]. The
//! current and baseline reductions share no state and run concurrently.

use std::collections::BTreeMap;

use super::aggregate::{aggregate_by_group, aggregate_by_type, group_totals, type_totals, GroupKey};
use super::baseline::{baseline_aggregates, compare};
use super::error::PipelineError;
use super::spikes::spike_counts;
use super::types::*;
use super::window::ReportWindows;

/// Rows and window for the baseline side of a run
#[derive(Debug, Clone, Copy)]
pub struct BaselineInput<'a> {
    pub rows: &'a [SampleRow],
    pub window: TimeWindow,
    pub reducer: BaselineReducer,
}

/// Compose already-computed stage outputs into a report.
pub fn assemble(
    period: ReportPeriod,
    system: &BTreeMap<String, Aggregate>,
    groups: &BTreeMap<GroupKey, Aggregate>,
    comparisons: Vec<ComparisonRecord>,
    spikes: Vec<SpikeCount>,
) -> ReportSummary {
    ReportSummary {
        period,
        system_totals: type_totals(system),
        group_totals: group_totals(groups),
        comparisons,
        spikes,
    }
}

/// Build the report for one run.
///
/// When `baseline` is `None` comparison is disabled: every record carries
/// null baseline fields and the period has no baseline window.
pub fn build_summary(
    current_window: TimeWindow,
    current_rows: &[SampleRow],
    baseline: Option<BaselineInput<'_>>,
) -> Result<ReportSummary, PipelineError> {
    if current_rows.is_empty() {
        log::warn!(
            "No samples in current window [{}, {}]; report will be empty",
            current_window.start(),
            current_window.end()
        );
    }

    let ((system, groups), base) = rayon::join(
        || (aggregate_by_type(current_rows), aggregate_by_group(current_rows)),
        || match baseline {
            Some(input) => baseline_aggregates(input.rows, &input.window, input.reducer),
            None => Ok(BTreeMap::new()),
        },
    );
    let (system, groups, base) = (system?, groups?, base?);

    log::debug!(
        "Aggregated {} current rows into {} types / {} groups; {} baseline types",
        current_rows.len(),
        system.len(),
        groups.len(),
        base.len()
    );

    let comparisons = compare(&system, &base);
    let spikes = spike_counts(current_rows);
    log::debug!("{} devices reported spikes", spikes.len());

    let period = ReportPeriod {
        current: current_window,
        baseline: baseline.map(|input| input.window),
    };

    Ok(assemble(period, &system, &groups, comparisons, spikes))
}

/// Build the report for the windows chosen by the window selector.
pub fn build_summary_for_windows(
    windows: &ReportWindows,
    current_rows: &[SampleRow],
    baseline_rows: Option<&[SampleRow]>,
    reducer: BaselineReducer,
) -> Result<ReportSummary, PipelineError> {
    let baseline = baseline_rows.map(|rows| BaselineInput {
        rows,
        window: windows.baseline,
        reducer,
    });
    build_summary(windows.current, current_rows, baseline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(serial: &str, device_type: &str, energy: f64, effect: f64, is_spike: bool) -> SampleRow {
        SampleRow {
            serial: serial.to_string(),
            timestamp: 0,
            energy,
            effect,
            is_spike,
            device_type: device_type.to_string(),
            group_name: None,
        }
    }

    fn windows() -> ReportWindows {
        ReportWindows {
            current: TimeWindow::new(2 * SECONDS_PER_DAY, 3 * SECONDS_PER_DAY - 1).unwrap(),
            baseline: TimeWindow::new(SECONDS_PER_DAY - 1, 3 * SECONDS_PER_DAY - 1).unwrap(),
        }
    }

    #[test]
    fn test_empty_current_rows() {
        let baseline_rows = vec![row("A", "heat", 5.0, 1.0, false)];
        let summary =
            build_summary_for_windows(&windows(), &[], Some(baseline_rows.as_slice()), BaselineReducer::DailyMean).unwrap();

        assert!(summary.system_totals.is_empty());
        assert!(summary.group_totals.is_empty());
        assert!(summary.comparisons.is_empty());
        assert!(summary.spikes.is_empty());
        assert_eq!(summary.period.baseline, Some(windows().baseline));
    }

    #[test]
    fn test_comparison_disabled() {
        let current = vec![row("A", "heat", 5.0, 1.0, true)];
        let summary = build_summary_for_windows(&windows(), &current, None, BaselineReducer::DailyMean).unwrap();

        assert_eq!(summary.period.baseline, None);
        assert_eq!(summary.comparisons.len(), 1);
        assert_eq!(summary.comparisons[0].baseline_mean_energy, None);
        assert_eq!(summary.comparisons[0].energy_change_pct, None);
        assert_eq!(summary.spikes.len(), 1);
    }

    #[test]
    fn test_invalid_baseline_row_propagates() {
        let current = vec![row("A", "heat", 5.0, 1.0, false)];
        let baseline_rows = vec![row("A", "heat", 5.0, -2.0, false)];

        let result =
            build_summary_for_windows(&windows(), &current, Some(baseline_rows.as_slice()), BaselineReducer::DailyMean);
        assert!(matches!(result, Err(PipelineError::InvalidRow { .. })));
    }

    #[test]
    fn test_assemble_is_pure_composition() {
        let current = vec![row("A", "heat", 5.0, 1.0, false)];
        let system = aggregate_by_type(&current).unwrap();
        let groups = aggregate_by_group(&current).unwrap();
        let period = ReportPeriod {
            current: windows().current,
            baseline: None,
        };

        let summary = assemble(period, &system, &groups, Vec::new(), Vec::new());
        assert_eq!(summary.system_totals.len(), 1);
        assert_eq!(summary.group_totals[0].group_name, None);
        assert!(summary.comparisons.is_empty());
    }
}
