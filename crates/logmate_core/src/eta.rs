use crate::task::{TaskRecord, TaskStatus, Timestamp};

/// Remaining processing time by linear extrapolation of the elapsed time
/// over the processed fraction. `None` until there is a signal to work from.
pub fn estimate_remaining_seconds(record: &TaskRecord, now: Timestamp) -> Option<u64> {
    if record.status == TaskStatus::Complete
        || record.total_lines == 0
        || record.processed_count == 0
    {
        return None;
    }

    let elapsed_ms = (now - record.started_at).num_milliseconds().max(0) as f64;
    let fraction = record.processed_count as f64 / record.total_lines as f64;
    if fraction <= 0.0 {
        return None;
    }

    let estimated_total_ms = elapsed_ms / fraction;
    let remaining_ms = estimated_total_ms - elapsed_ms;
    let seconds = (remaining_ms / 1000.0).round();
    Some(seconds.max(1.0) as u64)
}

/// Whole seconds between start and completion, once the task has completed.
pub fn processing_seconds(record: &TaskRecord) -> Option<u64> {
    let completed_at = record.completed_at?;
    let elapsed_ms = (completed_at - record.started_at).num_milliseconds().max(0);
    Some((elapsed_ms as f64 / 1000.0).round() as u64)
}

/// `42s`, `3m 5s` or `2h 14m`.
pub fn format_remaining(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
