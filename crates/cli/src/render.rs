use roster_model::UserRow;
use roster_store::{StoreHandle, StoreSummary};
use serde::Serialize;
use std::fmt::Write;

/// Everything a frontend draws for one store state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub query: String,
    pub is_searching: bool,
    pub count_text: String,
    pub rows: Vec<UserRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<EmptyState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmptyState {
    pub title: &'static str,
    pub hint: &'static str,
}

impl Frame {
    /// Snapshot `store` under one lock.
    pub fn capture(store: &StoreHandle) -> Self {
        store.read(|store| {
            let summary = store.summary();
            Self {
                query: store.search_query().to_string(),
                is_searching: summary.is_searching,
                count_text: summary.count_text(),
                rows: store.projection().to_vec(),
                empty: empty_state(&summary),
                error: None,
            }
        })
    }

    #[must_use]
    pub fn with_error(mut self, err: impl ToString) -> Self {
        self.error = Some(err.to_string());
        self
    }
}

pub const fn empty_state(summary: &StoreSummary) -> Option<EmptyState> {
    if !summary.is_empty() {
        return None;
    }
    if summary.is_searching {
        Some(EmptyState {
            title: "No users found",
            hint: "Try adjusting your search terms",
        })
    } else {
        Some(EmptyState {
            title: "No users to display",
            hint: "All users have been removed from the list",
        })
    }
}

const HEADERS: [&str; 5] = ["ID", "Name", "Email", "Company", "City"];

/// Plain-text table followed by the count line, or the empty state.
pub fn table(frame: &Frame) -> String {
    let mut out = String::new();
    if let Some(error) = &frame.error {
        let _ = writeln!(out, "error: {error}");
    }
    if let Some(empty) = frame.empty {
        let _ = writeln!(out, "{}\n{}", empty.title, empty.hint);
        return out;
    }

    let cells: Vec<[String; 5]> = frame
        .rows
        .iter()
        .map(|row| {
            [
                row.id.to_string(),
                row.name.clone(),
                row.email.clone(),
                row.company_name.clone(),
                row.city.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    push_line(&mut out, &widths.map(|width| "-".repeat(width)), &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    let _ = writeln!(out, "\n{}", frame.count_text);
    out
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}
