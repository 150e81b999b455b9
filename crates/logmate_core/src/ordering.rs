use std::cmp::Ordering;

use crate::task::{TaskRecord, TaskStatus};

fn status_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Complete => 0,
        TaskStatus::Error => 1,
        TaskStatus::Processing => 2,
    }
}

/// Display comparator: complete, then error, then processing; most recently
/// updated first within a tier.
pub fn display_order(a: &TaskRecord, b: &TaskRecord) -> Ordering {
    status_rank(a.status)
        .cmp(&status_rank(b.status))
        .then_with(|| b.last_updated.cmp(&a.last_updated))
}

/// Records sorted for display. Stable, so full ties keep encounter order.
pub fn sorted_for_display<'a, I>(records: I) -> Vec<&'a TaskRecord>
where
    I: IntoIterator<Item = &'a TaskRecord>,
{
    let mut sorted: Vec<&TaskRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| display_order(a, b));
    sorted
}
