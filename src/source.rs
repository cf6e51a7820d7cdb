//! Sample row sources.
//!
//! A source returns the rows of enabled devices that fall inside a window.
//! Filtering happens here, so the pipeline only ever sees relevant rows.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Deserializer};

use crate::analysis::{EpochSecs, SampleRow, TimeWindow};

/// Anything that can supply sample rows for a time window
pub trait RowSource {
    fn fetch(&self, window: &TimeWindow) -> Result<Vec<SampleRow>>;
}

/// Accept `true`/`false` as well as the `0`/`1` integers produced by SQL dumps
fn deserialize_flag<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(d)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(serde::de::Error::custom(format!(
            "expected boolean flag 0 or 1, got {}",
            other
        ))),
    }
}

fn default_enabled() -> bool {
    true
}

/// One record of the samples/meters/groups dump
#[derive(Debug, Clone, Deserialize)]
pub struct RawSample {
    pub serial: String,
    #[serde(alias = "timestamp")]
    pub unix_time: EpochSecs,
    pub energy: f64,
    pub effect: f64,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_spike: bool,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default = "default_enabled", deserialize_with = "deserialize_flag")]
    pub enabled: bool,
}

impl From<RawSample> for SampleRow {
    fn from(raw: RawSample) -> Self {
        SampleRow {
            serial: raw.serial,
            timestamp: raw.unix_time,
            energy: raw.energy,
            effect: raw.effect,
            is_spike: raw.is_spike,
            device_type: raw.device_type,
            group_name: raw.group_name,
        }
    }
}

/// Rows held in memory, filtered per window on fetch
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    samples: Vec<RawSample>,
}

impl MemoryRowSource {
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self { samples }
    }
}

impl RowSource for MemoryRowSource {
    fn fetch(&self, window: &TimeWindow) -> Result<Vec<SampleRow>> {
        let rows: Vec<SampleRow> = self
            .samples
            .iter()
            .filter(|s| s.enabled && window.contains(s.unix_time))
            .cloned()
            .map(SampleRow::from)
            .collect();

        log::debug!(
            "Fetched {} of {} rows for window [{}, {}]",
            rows.len(),
            self.samples.len(),
            window.start(),
            window.end()
        );
        Ok(rows)
    }
}

/// JSON array dump of sample rows on disk
#[derive(Debug, Clone)]
pub struct JsonRowSource {
    inner: MemoryRowSource,
}

impl JsonRowSource {
    /// Load the dump. Records missing a required field fail the load.
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sample rows from {}", path.display()))?;

        let samples: Vec<RawSample> = serde_json::from_str(&content)
            .with_context(|| format!("Malformed sample rows in {}", path.display()))?;

        let disabled = samples.iter().filter(|s| !s.enabled).count();
        log::info!(
            "Loaded {} sample rows from {} ({} from disabled meters)",
            samples.len(),
            path.display(),
            disabled
        );

        Ok(Self {
            inner: MemoryRowSource::new(samples),
        })
    }
}

impl RowSource for JsonRowSource {
    fn fetch(&self, window: &TimeWindow) -> Result<Vec<SampleRow>> {
        self.inner.fetch(window)
    }
}
