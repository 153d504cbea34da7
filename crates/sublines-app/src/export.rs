// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::FilteredView;

pub const EXPORT_FILE_NAME: &str = "subject-lines.csv";
pub const EXPORT_MIME_TYPE: &str = "text/csv;charset=utf-8;";
pub const EXPORT_HEADER: [&str; 3] = ["Language", "Event Type", "Subject Line"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub contents: String,
    /// Data rows, header excluded.
    pub row_count: usize,
}

pub fn build_export(view: &FilteredView<'_>) -> ExportArtifact {
    ExportArtifact {
        file_name: EXPORT_FILE_NAME.to_owned(),
        mime_type: EXPORT_MIME_TYPE.to_owned(),
        contents: export_csv(view),
        row_count: view.row_count(),
    }
}

/// One line per record joined with `\n`, no trailing newline. Every field is
/// quoted; embedded quotes are doubled.
pub fn export_csv(view: &FilteredView<'_>) -> String {
    let mut lines = Vec::with_capacity(view.row_count() + 1);
    lines.push(csv_record(EXPORT_HEADER));
    for (language, row) in view.rows() {
        lines.push(csv_record([language, row.event.as_str(), row.subject]));
    }
    lines.join("\n")
}

fn csv_record<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(quote_field)
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
