// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use sublines_app::{Dataset, EventType, LanguageEntry, Subject};

const EVENT_TYPES: [&str; 4] = ["push", "pull_request", "release", "ci_failure"];

const LANGUAGES: [&str; 8] = [
    "Rust",
    "Go",
    "Python",
    "TypeScript",
    "Haskell",
    "Elixir",
    "Kotlin",
    "Zig",
];

const SUBJECT_SHAPES: [&str; 4] = [
    "{lang}: {author} pushed to {branch}",
    "{lang}: review requested on \"{title}\"",
    "{lang}: {tag} is out",
    "{lang}: build broke on {branch}",
];

pub fn entry(language: &str, subjects: &[(&str, &str)]) -> LanguageEntry {
    LanguageEntry {
        language: language.to_owned(),
        subjects: subjects
            .iter()
            .map(|(event, template)| Subject {
                event: EventType::new(*event),
                template: (*template).to_owned(),
            })
            .collect(),
    }
}

/// One language with one `push` subject.
pub fn single_rust_dataset() -> Dataset {
    build_dataset(&["push"], vec![entry("Rust", &[("push", "New commit")])])
}

pub const SINGLE_RUST_JSON: &str =
    r#"{"eventTypes":["push"],"items":[{"language":"Rust","subjects":{"push":"New commit"}}]}"#;

/// Languages with overlapping and missing event coverage, plus one language
/// without subjects.
pub fn mixed_dataset() -> Dataset {
    build_dataset(
        &["push", "issue", "release"],
        vec![
            entry(
                "Rust",
                &[("push", "New commit"), ("issue", "Borrow checker ticket")],
            ),
            entry("Go", &[("push", "Pushed to main"), ("release", "Tagged v1")]),
            entry("Python", &[("issue", "Indentation report")]),
            entry("Zig", &[]),
        ],
    )
}

/// Deterministic dataset where language `i` carries the first `i % 4 + 1`
/// event types.
pub fn generated_dataset(languages: usize) -> Dataset {
    let items = (0..languages)
        .map(|index| {
            let base = LANGUAGES[index % LANGUAGES.len()];
            let language = if index < LANGUAGES.len() {
                base.to_owned()
            } else {
                format!("{base} {}", index / LANGUAGES.len() + 1)
            };
            let count = index % EVENT_TYPES.len() + 1;
            let subjects = EVENT_TYPES
                .iter()
                .zip(SUBJECT_SHAPES)
                .take(count)
                .map(|(event, shape)| Subject {
                    event: EventType::new(*event),
                    template: shape.replace("{lang}", &language),
                })
                .collect();
            LanguageEntry { language, subjects }
        })
        .collect();
    build_dataset(&EVENT_TYPES, items)
}

/// Renders a dataset as its wire document. Built by hand because subject
/// key order must survive and `serde_json::Map` sorts keys.
pub fn dataset_json(dataset: &Dataset) -> Result<String> {
    let mut items = Vec::with_capacity(dataset.len());
    for item in dataset.items() {
        let mut subjects = Vec::with_capacity(item.subject_count());
        for subject in &item.subjects {
            subjects.push(format!(
                "{}:{}",
                serde_json::to_string(subject.event.as_str())?,
                serde_json::to_string(&subject.template)?
            ));
        }
        items.push(format!(
            "{{\"language\":{},\"subjects\":{{{}}}}}",
            serde_json::to_string(&item.language)?,
            subjects.join(",")
        ));
    }
    let event_types = dataset
        .event_types()
        .iter()
        .map(EventType::as_str)
        .collect::<Vec<_>>();
    Ok(format!(
        "{{\"eventTypes\":{},\"items\":[{}]}}",
        serde_json::to_string(&event_types)?,
        items.join(",")
    ))
}

pub struct DatasetFile {
    _dir: tempfile::TempDir,
    pub path: PathBuf,
}

pub fn write_dataset_file(dataset: &Dataset) -> Result<DatasetFile> {
    write_raw_dataset_file(&dataset_json(dataset)?)
}

pub fn write_raw_dataset_file(raw: &str) -> Result<DatasetFile> {
    let dir = tempfile::tempdir().context("create dataset temp dir")?;
    let path = dir.path().join("data.json");
    std::fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    Ok(DatasetFile { _dir: dir, path })
}

fn build_dataset(event_types: &[&str], items: Vec<LanguageEntry>) -> Dataset {
    match Dataset::new(
        event_types.iter().copied().map(EventType::new).collect(),
        items,
    ) {
        Ok(dataset) => dataset,
        Err(error) => panic!("fixture dataset must be valid: {error:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{dataset_json, generated_dataset, mixed_dataset};
    use anyhow::Result;

    #[test]
    fn generated_dataset_has_unique_languages() {
        let dataset = generated_dataset(20);
        assert_eq!(dataset.len(), 20);
        assert_eq!(dataset.items()[8].language, "Rust 2");
        assert_eq!(dataset.items()[3].subject_count(), 4);
    }

    #[test]
    fn dataset_json_keeps_subject_order() -> Result<()> {
        let raw = dataset_json(&mixed_dataset())?;
        assert!(raw.starts_with(r#"{"eventTypes":["push","issue","release"],"items":[{"language":"Rust","subjects":{"push":"New commit","issue":"#));
        Ok(())
    }
}
