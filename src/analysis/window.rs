//! Report window selection.
//!
//! The current window is the previous full UTC calendar day relative to the
//! reference instant. The baseline window ends at the same instant as the
//! current window and reaches back over the configured span.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

use super::error::PipelineError;
use super::types::*;

/// Current and baseline windows for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindows {
    pub current: TimeWindow,
    pub baseline: TimeWindow,
}

/// Floor an epoch timestamp to the preceding UTC midnight.
pub fn floor_to_midnight(timestamp: EpochSecs) -> EpochSecs {
    timestamp.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY
}

/// Compute the current and baseline windows for a reference instant.
///
/// A zero `baseline_span` yields a single-instant baseline window; the
/// comparator treats its zero coverage as "no baseline".
pub fn select_windows(
    now: DateTime<Utc>,
    baseline_span: Duration,
) -> Result<ReportWindows, PipelineError> {
    let start = floor_to_midnight(now.timestamp() - SECONDS_PER_DAY);
    let current = TimeWindow::new(start, start + SECONDS_PER_DAY - 1)?;

    let span = i64::try_from(baseline_span.as_secs()).unwrap_or(i64::MAX);
    let baseline = TimeWindow::new(current.end().saturating_sub(span), current.end())?;

    Ok(ReportWindows { current, baseline })
}

/// Calendar day (UTC) on which a window starts
pub fn window_date(window: &TimeWindow) -> NaiveDate {
    DateTime::<Utc>::from_timestamp(window.start(), 0)
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}
