//! Aggregation and comparison pipeline for daily energy reports.
//!
//! This module turns raw sample rows into per-type and per-group totals,
//! a comparison against the historical baseline, and per-device spike
//! counts. It performs no I/O.

pub mod types;
pub mod error;
pub mod window;
pub mod aggregate;
pub mod baseline;
pub mod spikes;
pub mod assemble;

pub use types::*;
pub use error::PipelineError;
pub use window::{select_windows, window_date, ReportWindows};
pub use aggregate::{aggregate, aggregate_by_group, aggregate_by_type};
pub use baseline::{compare, compare_rows};
pub use spikes::{rollup, spike_counts};
pub use assemble::{build_summary, build_summary_for_windows, BaselineInput};
