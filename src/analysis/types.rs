//! Core data types for the daily energy report.

use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Timestamp in seconds since the Unix epoch (UTC)
pub type EpochSecs = i64;

/// Seconds in one calendar day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// One energy reading from a meter, as delivered by the row source.
///
/// Rows are pre-filtered to enabled devices by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub serial: String,
    pub timestamp: EpochSecs,
    /// Energy in kWh
    pub energy: f64,
    /// Instantaneous power in kW
    pub effect: f64,
    pub is_spike: bool,
    #[serde(rename = "type")]
    pub device_type: String,
    pub group_name: Option<String>,
}

impl SampleRow {
    /// Check the row against its value domain.
    ///
    /// `index` is the row's position in its sequence, used for reporting only.
    pub fn validate(&self, index: usize) -> Result<(), PipelineError> {
        let reason = if self.serial.is_empty() {
            Some("serial is empty".to_string())
        } else if self.device_type.is_empty() {
            Some("type is empty".to_string())
        } else if !self.energy.is_finite() || self.energy < 0.0 {
            Some(format!("energy must be a non-negative number, got {}", self.energy))
        } else if !self.effect.is_finite() || self.effect < 0.0 {
            Some(format!("effect must be a non-negative number, got {}", self.effect))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PipelineError::InvalidRow {
                index,
                serial: self.serial.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Closed time interval `[start, end]` in epoch seconds.
///
/// Always satisfies `start <= end`, including when read back from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct TimeWindow {
    start: EpochSecs,
    end: EpochSecs,
}

/// Unchecked wire form of a [`TimeWindow`]
#[derive(Deserialize)]
struct WindowBounds {
    start: EpochSecs,
    end: EpochSecs,
}

impl TryFrom<WindowBounds> for TimeWindow {
    type Error = PipelineError;

    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        TimeWindow::new(bounds.start, bounds.end)
    }
}

impl TimeWindow {
    pub fn new(start: EpochSecs, end: EpochSecs) -> Result<Self, PipelineError> {
        if end < start {
            return Err(PipelineError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> EpochSecs {
        self.start
    }

    pub fn end(&self) -> EpochSecs {
        self.end
    }

    /// Check if a timestamp falls within this window (both ends inclusive)
    pub fn contains(&self, timestamp: EpochSecs) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Length of the window in seconds
    pub fn span_secs(&self) -> i64 {
        self.end - self.start
    }

    /// Length of the window in days, used to normalise baseline sums
    pub fn span_days(&self) -> f64 {
        self.span_secs() as f64 / SECONDS_PER_DAY as f64
    }
}

/// Sum of energy and max of effect over the rows sharing one key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub total_energy: f64,
    pub peak_effect: f64,
    pub row_count: usize,
}

impl Aggregate {
    /// Start a new aggregate from its first row
    pub fn from_row(row: &SampleRow) -> Self {
        Self {
            total_energy: row.energy,
            peak_effect: row.effect,
            row_count: 1,
        }
    }

    pub fn absorb(&mut self, row: &SampleRow) {
        self.total_energy += row.energy;
        self.peak_effect = self.peak_effect.max(row.effect);
        self.row_count += 1;
    }
}

/// Current-day figures for one device type against its baseline.
///
/// Baseline fields and `energy_change_pct` are `None` (serialised as null)
/// when the type has no usable baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    #[serde(rename = "type")]
    pub device_type: String,
    pub current_total_energy: f64,
    pub current_peak_effect: f64,
    pub baseline_mean_energy: Option<f64>,
    pub baseline_peak_effect: Option<f64>,
    pub energy_change_pct: Option<f64>,
}

/// Number of spike-flagged rows for one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpikeCount {
    pub serial: String,
    pub spike_count: usize,
}

/// Aggregate for one device type across the whole system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeTotal {
    #[serde(rename = "type")]
    pub device_type: String,
    pub total_energy: f64,
    pub peak_effect: f64,
}

/// Aggregate for one device type within one device group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub group_name: Option<String>,
    #[serde(rename = "type")]
    pub device_type: String,
    pub total_energy: f64,
    pub peak_effect: f64,
}

/// The two windows a report covers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub current: TimeWindow,
    /// `None` when baseline comparison is disabled
    pub baseline: Option<TimeWindow>,
}

/// Fully assembled output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub period: ReportPeriod,
    pub system_totals: Vec<TypeTotal>,
    pub group_totals: Vec<GroupTotal>,
    pub comparisons: Vec<ComparisonRecord>,
    pub spikes: Vec<SpikeCount>,
}

/// How baseline energy is reduced before comparing it to the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineReducer {
    /// Baseline sum divided by the number of days in the baseline window
    #[default]
    DailyMean,
    /// Raw baseline sum
    Sum,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(energy: f64, effect: f64) -> SampleRow {
        SampleRow {
            serial: "A".to_string(),
            timestamp: 0,
            energy,
            effect,
            is_spike: false,
            device_type: "heat".to_string(),
            group_name: None,
        }
    }

    #[test]
    fn test_time_window_contains() {
        let window = TimeWindow::new(100, 200).unwrap();
        assert!(!window.contains(99));
        assert!(window.contains(100));
        assert!(window.contains(150));
        assert!(window.contains(200)); // End is inclusive
        assert!(!window.contains(201));
    }

    #[test]
    fn test_time_window_rejects_inverted_bounds() {
        assert!(matches!(
            TimeWindow::new(200, 100),
            Err(PipelineError::InvalidWindow { start: 200, end: 100 })
        ));
        assert!(TimeWindow::new(100, 100).is_ok());
    }

    #[test]
    fn test_time_window_json_is_checked() {
        let window: TimeWindow = serde_json::from_str(r#"{"start":100,"end":200}"#).unwrap();
        assert_eq!((window.start(), window.end()), (100, 200));

        let inverted = serde_json::from_str::<TimeWindow>(r#"{"start":200,"end":100}"#);
        let err = inverted.unwrap_err().to_string();
        assert!(err.contains("end 100 is before start 200"), "error was {}", err);

        assert_eq!(serde_json::to_string(&window).unwrap(), r#"{"start":100,"end":200}"#);
    }

    #[test]
    fn test_span_days() {
        let window = TimeWindow::new(0, 2 * SECONDS_PER_DAY).unwrap();
        assert_eq!(window.span_days(), 2.0);
    }

    #[test]
    fn test_row_validation() {
        assert!(row(1.0, 0.5).validate(0).is_ok());
        assert!(row(0.0, 0.0).validate(0).is_ok());
        assert!(row(-1.0, 0.5).validate(3).is_err());
        assert!(row(1.0, -0.5).validate(3).is_err());
        assert!(row(f64::NAN, 0.5).validate(3).is_err());

        let mut unnamed = row(1.0, 1.0);
        unnamed.serial.clear();
        match unnamed.validate(7) {
            Err(PipelineError::InvalidRow { index, reason, .. }) => {
                assert_eq!(index, 7);
                assert!(reason.contains("serial"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_aggregate_absorb() {
        let mut agg = Aggregate::from_row(&row(10.0, 2.0));
        agg.absorb(&row(15.0, 3.0));
        agg.absorb(&row(1.0, 0.5));
        assert_eq!(agg.total_energy, 26.0);
        assert_eq!(agg.peak_effect, 3.0);
        assert_eq!(agg.row_count, 3);
    }

    #[test]
    fn test_undefined_comparison_serialises_as_null() {
        let record = ComparisonRecord {
            device_type: "cool".to_string(),
            current_total_energy: 5.0,
            current_peak_effect: 1.0,
            baseline_mean_energy: None,
            baseline_peak_effect: None,
            energy_change_pct: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "cool");
        assert!(json["baseline_mean_energy"].is_null());
        assert!(json["energy_change_pct"].is_null());
    }
}
