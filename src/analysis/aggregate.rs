//! Grouping and reduction of sample rows.
//!
//! Aggregation is a single streaming pass over the rows. Results are sparse
//! and ordered by key: a key with no matching rows never appears.

use std::collections::BTreeMap;

use super::error::PipelineError;
use super::types::*;

/// Key for per-group aggregation: `(group_name, type)`
pub type GroupKey = (Option<String>, String);

/// Aggregate rows by an arbitrary key, validating each row as it is consumed.
pub fn aggregate<'a, K, I, F>(rows: I, key_fn: F) -> Result<BTreeMap<K, Aggregate>, PipelineError>
where
    K: Ord,
    I: IntoIterator<Item = &'a SampleRow>,
    F: Fn(&SampleRow) -> K,
{
    aggregate_filtered(rows, key_fn, |_| true)
}

/// Aggregate only the rows accepted by `filter`.
///
/// Rejected rows are still validated so that malformed input is never
/// silently skipped.
pub fn aggregate_filtered<'a, K, I, F, P>(
    rows: I,
    key_fn: F,
    filter: P,
) -> Result<BTreeMap<K, Aggregate>, PipelineError>
where
    K: Ord,
    I: IntoIterator<Item = &'a SampleRow>,
    F: Fn(&SampleRow) -> K,
    P: Fn(&SampleRow) -> bool,
{
    let mut groups: BTreeMap<K, Aggregate> = BTreeMap::new();

    for (index, row) in rows.into_iter().enumerate() {
        row.validate(index)?;
        if !filter(row) {
            continue;
        }

        let agg = groups
            .entry(key_fn(row))
            .and_modify(|agg| agg.absorb(row))
            .or_insert_with(|| Aggregate::from_row(row));
        if !agg.total_energy.is_finite() {
            return Err(PipelineError::EnergyOverflow {
                index,
                serial: row.serial.clone(),
            });
        }
    }

    Ok(groups)
}

/// Aggregate by device type
pub fn aggregate_by_type(rows: &[SampleRow]) -> Result<BTreeMap<String, Aggregate>, PipelineError> {
    aggregate(rows, |row| row.device_type.clone())
}

/// Aggregate by `(group_name, type)`; ungrouped devices share the `None` group
pub fn aggregate_by_group(rows: &[SampleRow]) -> Result<BTreeMap<GroupKey, Aggregate>, PipelineError> {
    aggregate(rows, |row| (row.group_name.clone(), row.device_type.clone()))
}

/// Flatten a per-type aggregate map into presentation order.
pub fn type_totals(aggregates: &BTreeMap<String, Aggregate>) -> Vec<TypeTotal> {
    aggregates
        .iter()
        .map(|(device_type, agg)| TypeTotal {
            device_type: device_type.clone(),
            total_energy: agg.total_energy,
            peak_effect: agg.peak_effect,
        })
        .collect()
}

/// Flatten a per-group aggregate map into presentation order.
pub fn group_totals(aggregates: &BTreeMap<GroupKey, Aggregate>) -> Vec<GroupTotal> {
    aggregates
        .iter()
        .map(|((group_name, device_type), agg)| GroupTotal {
            group_name: group_name.clone(),
            device_type: device_type.clone(),
            total_energy: agg.total_energy,
            peak_effect: agg.peak_effect,
        })
        .collect()
}
