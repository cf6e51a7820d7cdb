//! Spike frequency rollup.
//!
//! Spikes are flagged upstream; this module only counts them per device.

use std::collections::BTreeMap;

use super::types::*;

/// Count spike-flagged rows per serial in a single pass.
///
/// Devices without spikes are absent from the result.
pub fn rollup<'a, I>(rows: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a SampleRow>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows.into_iter().filter(|r| r.is_spike) {
        *counts.entry(row.serial.clone()).or_default() += 1;
    }
    counts
}

/// Spike counts in presentation order (by serial)
pub fn spike_counts(rows: &[SampleRow]) -> Vec<SpikeCount> {
    rollup(rows)
        .into_iter()
        .map(|(serial, spike_count)| SpikeCount { serial, spike_count })
        .collect()
}
