use anyhow::anyhow;

use crate::records::{record_id, Record};

/// Next free integer id: 1 for an empty collection, otherwise `max(id) + 1`.
///
/// Recomputed from the current snapshot each call. Records without an integer
/// `id` are ignored. Fails when the largest id is already `i64::MAX`.
pub fn next_id(records: &[Record]) -> anyhow::Result<i64> {
    match records.iter().filter_map(record_id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| anyhow!("id space exhausted: largest id is {max}")),
    }
}
