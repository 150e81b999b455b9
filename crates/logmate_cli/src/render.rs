use logmate_core::{
    format_remaining, AppViewModel, ResultSummary, TaskRowView, TaskStatus, UploadRowView,
    UploadStatus,
};

/// Text block for one refresh of the progress display.
pub fn render(view: &AppViewModel) -> String {
    let mut lines = Vec::new();
    let state = if view.uploading { "uploading" } else { "idle" };
    lines.push(format!(
        "Uploads: {state} | Tasks: {} ({} complete)",
        view.task_count, view.completed_count
    ));
    lines.extend(view.uploads.iter().map(format_upload_row));
    lines.extend(view.tasks.iter().map(format_task_row));
    lines.join("\n")
}

pub fn format_upload_row(row: &UploadRowView) -> String {
    let status = match row.status {
        UploadStatus::Queued => "queued",
        UploadStatus::Uploading => "uploading",
        UploadStatus::Complete => "sent",
        UploadStatus::Error => "failed",
    };
    match &row.message {
        Some(message) => format!(
            "  upload [{status}] {} ({} bytes): {message}",
            row.name,
            format_with_commas(row.size_bytes)
        ),
        None => format!(
            "  upload [{status}] {} ({} bytes)",
            row.name,
            format_with_commas(row.size_bytes)
        ),
    }
}

pub fn format_task_row(row: &TaskRowView) -> String {
    match row.status {
        TaskStatus::Complete => match row.processing_secs {
            Some(secs) => format!(
                "  task   [done] {} in {}",
                row.file_name,
                format_remaining(secs)
            ),
            None => format!("  task   [done] {}", row.file_name),
        },
        TaskStatus::Error => format!(
            "  task   [error] {}: {}",
            row.file_name,
            row.error.as_deref().unwrap_or("analysis failed")
        ),
        TaskStatus::Processing => format!(
            "  task   [{:>5.1}%] {} chunk {}/{} lines {}/{} eta {}",
            row.progress,
            row.file_name,
            row.current_chunk,
            row.total_chunks,
            format_with_commas(row.processed_count),
            format_with_commas(row.total_lines),
            row.eta_label
        ),
    }
}

/// Multi-line report for a selected task's analysis result.
pub fn format_result_summary(file_name: &str, summary: &ResultSummary) -> String {
    let mut lines = vec![
        format!("Analysis results for {file_name}"),
        format!("  lines processed: {}", format_with_commas(summary.line_count)),
        format!("  total data size: {} bytes", format_with_commas(summary.total_bytes)),
    ];
    push_counts(&mut lines, "HTTP methods", summary.methods_count.iter());
    push_counts(&mut lines, "status codes", summary.status_count.iter());
    push_counts(
        &mut lines,
        "most requested paths",
        summary.top_paths.iter().map(|(key, count)| (key, count)),
    );
    push_counts(
        &mut lines,
        "top IP addresses",
        summary.top_ips.iter().map(|(key, count)| (key, count)),
    );
    push_counts(
        &mut lines,
        "top user agents",
        summary.top_user_agents.iter().map(|(key, count)| (key, count)),
    );
    lines.join("\n")
}

fn push_counts<'a, I>(lines: &mut Vec<String>, title: &str, entries: I)
where
    I: Iterator<Item = (&'a String, &'a u64)>,
{
    let entries: Vec<_> = entries.collect();
    if entries.is_empty() {
        return;
    }
    lines.push(format!("  {title}:"));
    for (key, count) in entries {
        lines.push(format!("    {key:<24} {}", format_with_commas(*count)));
    }
}

fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use logmate_core::{TaskId, ETA_PENDING};
    use pretty_assertions::assert_eq;

    use super::*;

    fn processing_row() -> TaskRowView {
        TaskRowView {
            task_id: TaskId::new("t1"),
            file_name: "access.log".into(),
            status: TaskStatus::Processing,
            progress: 42.0,
            current_chunk: 2,
            total_chunks: 5,
            processed_count: 42_000,
            total_lines: 100_000,
            eta_seconds: Some(185),
            eta_label: "3m 5s".into(),
            processing_secs: None,
            error: None,
        }
    }

    #[test]
    fn done_row_shows_processing_time() {
        let row = TaskRowView {
            status: TaskStatus::Complete,
            progress: 100.0,
            processing_secs: Some(75),
            ..processing_row()
        };
        assert_eq!(format_task_row(&row), "  task   [done] access.log in 1m 15s");
    }

    #[test]
    fn summary_lists_only_populated_sections() {
        let mut summary = ResultSummary {
            line_count: 1200,
            total_bytes: 98_304,
            top_ips: vec![("10.0.0.1".into(), 900)],
            ..ResultSummary::default()
        };
        summary.methods_count.insert("GET".into(), 1000);

        assert_eq!(
            format_result_summary("access.log", &summary),
            [
                "Analysis results for access.log",
                "  lines processed: 1,200",
                "  total data size: 98,304 bytes",
                "  HTTP methods:",
                "    GET                      1,000",
                "  top IP addresses:",
                "    10.0.0.1                 900",
            ]
            .join("\n")
        );
    }

    #[test]
    fn processing_row_shows_progress_and_eta() {
        assert_eq!(
            format_task_row(&processing_row()),
            "  task   [ 42.0%] access.log chunk 2/5 lines 42,000/100,000 eta 3m 5s"
        );
    }

    #[test]
    fn pending_eta_is_shown_verbatim() {
        let row = TaskRowView {
            processed_count: 0,
            progress: 0.0,
            eta_seconds: None,
            eta_label: ETA_PENDING.into(),
            ..processing_row()
        };
        assert!(format_task_row(&row).ends_with("eta Calculating..."));
    }

    #[test]
    fn error_row_falls_back_to_generic_message() {
        let row = TaskRowView {
            status: TaskStatus::Error,
            error: None,
            ..processing_row()
        };
        assert_eq!(
            format_task_row(&row),
            "  task   [error] access.log: analysis failed"
        );
    }

    #[test]
    fn upload_rows_carry_failure_message() {
        let row = UploadRowView {
            name: "huge.log".into(),
            size_bytes: 700_000_000,
            status: UploadStatus::Error,
            message: Some("file too large".into()),
        };
        assert_eq!(
            format_upload_row(&row),
            "  upload [failed] huge.log (700,000,000 bytes): file too large"
        );
    }

    #[test]
    fn header_counts_tasks() {
        let view = AppViewModel {
            uploading: true,
            task_count: 3,
            completed_count: 1,
            ..AppViewModel::default()
        };
        assert_eq!(render(&view), "Uploads: uploading | Tasks: 3 (1 complete)");
    }
}
