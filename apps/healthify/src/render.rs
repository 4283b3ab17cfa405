//! Plain-text rendering of the upload screen for the terminal.

use client_core::{
    report::EMPTY_RESULTS_NOTICE, Notice, NoticeKind, ResultRow, ResultView, UploadState,
};

const HEADERS: [&str; 5] = ["Parameter", "Value", "Unit", "Range", "Insight"];

pub fn notice_line(notice: &Notice) -> String {
    let icon = match notice.kind {
        NoticeKind::Success => "✔️",
        NoticeKind::Error => "❌",
    };
    format!("{icon} {}", notice.message)
}

pub fn status_line(state: &UploadState, drag_active: bool) -> String {
    let selection = match state.selected_file() {
        Some(file) => format!("{} {}", file.kind().badge(), file.name),
        None if drag_active => "Drop your file here...".to_string(),
        None => "no file selected (pick one or drag & drop)".to_string(),
    };
    let phase = match state {
        UploadState::Idle => "idle",
        UploadState::Ready { .. } => "ready to upload",
        UploadState::Submitting { .. } => "uploading...",
        UploadState::Succeeded { .. } => "analysis complete",
        UploadState::Failed { .. } => "upload failed",
    };
    format!("[{phase}] {selection}")
}

/// Renders the result area. Nothing is rendered before the first successful upload.
pub fn result_view(view: &ResultView) -> Option<String> {
    match view {
        ResultView::NoSubmission => None,
        ResultView::Empty => Some(EMPTY_RESULTS_NOTICE.to_string()),
        ResultView::Rows(rows) => Some(table(rows)),
    }
}

fn table(rows: &[ResultRow]) -> String {
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|row| {
            let insight = if row.abnormal {
                format!("{} ⚠️", row.insight().label())
            } else {
                row.insight().label().to_string()
            };
            [
                row.parameter.clone(),
                row.value.clone(),
                row.unit.clone(),
                row.range.clone(),
                insight,
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::from("Extracted Health Parameters\n ");
    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push(' ');
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for (idx, row) in cells.iter().enumerate() {
        let marker = if rows[idx].abnormal { "!" } else { " " };
        out.push_str(marker);
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}
