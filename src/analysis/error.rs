//! Errors raised by the report pipeline.

use super::types::EpochSecs;

/// Data-quality defects that abort a pipeline run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid sample row #{index} (serial '{serial}'): {reason}")]
    InvalidRow {
        index: usize,
        serial: String,
        reason: String,
    },

    #[error("Energy total overflows at sample row #{index} (serial '{serial}')")]
    EnergyOverflow { index: usize, serial: String },

    #[error("Invalid time window: end {end} is before start {start}")]
    InvalidWindow { start: EpochSecs, end: EpochSecs },
}
