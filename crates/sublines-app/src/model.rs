// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::ids::*;

pub const ALL_EVENT_TYPES_LABEL: &str = "(All event types)";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub event: EventType,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    /// Document order of the JSON object is kept; keys are unique.
    #[serde(deserialize_with = "deserialize_subjects")]
    pub subjects: Vec<Subject>,
}

impl LanguageEntry {
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    pub fn has_event(&self, event: &EventType) -> bool {
        self.subjects.iter().any(|subject| &subject.event == event)
    }
}

fn deserialize_subjects<'de, D>(deserializer: D) -> std::result::Result<Vec<Subject>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SubjectsVisitor;

    impl<'de> Visitor<'de> for SubjectsVisitor {
        type Value = Vec<Subject>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("an object mapping event types to subject lines")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut subjects: Vec<Subject> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((event, template)) = map.next_entry::<String, String>()? {
                if subjects.iter().any(|subject| subject.event.as_str() == event) {
                    return Err(de::Error::custom(format!(
                        "duplicate subject key {event:?}"
                    )));
                }
                subjects.push(Subject {
                    event: EventType(event),
                    template,
                });
            }
            Ok(subjects)
        }
    }

    deserializer.deserialize_map(SubjectsVisitor)
}

/// Wire shape of the dataset document before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDocument {
    pub event_types: Vec<EventType>,
    pub items: Vec<LanguageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    event_types: Vec<EventType>,
    items: Vec<LanguageEntry>,
}

impl Dataset {
    pub fn new(event_types: Vec<EventType>, items: Vec<LanguageEntry>) -> Result<Self> {
        let mut seen_events = BTreeSet::new();
        for event in &event_types {
            if !seen_events.insert(event) {
                bail!("eventTypes lists {:?} more than once", event.as_str());
            }
        }

        let mut seen_languages = BTreeSet::new();
        for item in &items {
            if !seen_languages.insert(item.language.as_str()) {
                bail!(
                    "language {:?} appears more than once in items",
                    item.language
                );
            }
            let mut seen_subjects = BTreeSet::new();
            for subject in &item.subjects {
                if !seen_subjects.insert(&subject.event) {
                    bail!(
                        "language {:?} has duplicate subject key {:?}",
                        item.language,
                        subject.event.as_str()
                    );
                }
            }
        }

        Ok(Self { event_types, items })
    }

    pub fn event_types(&self) -> &[EventType] {
        &self.event_types
    }

    pub fn items(&self) -> &[LanguageEntry] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn entry(&self, id: EntryId) -> Option<&LanguageEntry> {
        self.items.get(id.get())
    }

    pub fn subject(&self, id: RowId) -> Option<(&LanguageEntry, &Subject)> {
        let entry = self.entry(id.entry)?;
        let subject = entry.subjects.get(id.subject.get())?;
        Some((entry, subject))
    }

    pub fn is_known_event(&self, event: &EventType) -> bool {
        self.event_types.contains(event)
    }

    /// Selectable filter values: the `All` sentinel followed by the event
    /// types in document order.
    pub fn selector_options(&self) -> Vec<EventSelector> {
        std::iter::once(EventSelector::All)
            .chain(self.event_types.iter().cloned().map(EventSelector::Only))
            .collect()
    }
}

impl TryFrom<DatasetDocument> for Dataset {
    type Error = anyhow::Error;

    fn try_from(document: DatasetDocument) -> Result<Self> {
        Self::new(document.event_types, document.items)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum EventSelector {
    #[default]
    All,
    Only(EventType),
}

impl EventSelector {
    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_EVENT_TYPES_LABEL,
            Self::Only(event) => event.as_str(),
        }
    }

    pub fn from_label(value: &str) -> Self {
        if value == ALL_EVENT_TYPES_LABEL {
            Self::All
        } else {
            Self::Only(EventType::new(value))
        }
    }

    pub fn matches(&self, event: &EventType) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected == event,
        }
    }
}

impl fmt::Display for EventSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::{ALL_EVENT_TYPES_LABEL, Dataset, DatasetDocument, EventSelector, EventType};
    use anyhow::Result;

    fn parse(raw: &str) -> Result<Dataset> {
        let document: DatasetDocument = serde_json::from_str(raw)?;
        Dataset::try_from(document)
    }

    #[test]
    fn subjects_keep_document_order() -> Result<()> {
        let dataset = parse(
            r#"{"eventTypes":["push","issue","fork"],"items":[{"language":"Go","subjects":{"push":"p","issue":"i","fork":"f"}}]}"#,
        )?;
        let events = dataset.items()[0]
            .subjects
            .iter()
            .map(|subject| subject.event.as_str())
            .collect::<Vec<_>>();
        assert_eq!(events, vec!["push", "issue", "fork"]);
        Ok(())
    }

    #[test]
    fn duplicate_subject_keys_are_rejected() {
        let error = parse(
            r#"{"eventTypes":["push"],"items":[{"language":"Go","subjects":{"push":"a","push":"b"}}]}"#,
        )
        .expect_err("duplicate keys should fail");
        assert!(error.to_string().contains("duplicate subject key"));
    }

    #[test]
    fn duplicate_languages_are_rejected() {
        let error = parse(
            r#"{"eventTypes":[],"items":[{"language":"Go","subjects":{}},{"language":"Go","subjects":{}}]}"#,
        )
        .expect_err("duplicate language should fail");
        assert!(error.to_string().contains("appears more than once"));
    }

    #[test]
    fn duplicate_event_types_are_rejected() {
        let error = parse(r#"{"eventTypes":["push","push"],"items":[]}"#)
            .expect_err("duplicate event type should fail");
        assert!(error.to_string().contains("more than once"));
    }

    #[test]
    fn missing_items_field_fails_to_decode() {
        let result = serde_json::from_str::<DatasetDocument>(r#"{"eventTypes":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn selector_options_start_with_all_sentinel() -> Result<()> {
        let dataset = parse(r#"{"eventTypes":["push","issue"],"items":[]}"#)?;
        assert_eq!(
            dataset.selector_options(),
            vec![
                EventSelector::All,
                EventSelector::Only(EventType::new("push")),
                EventSelector::Only(EventType::new("issue")),
            ]
        );
        assert!(!dataset.is_known_event(&EventType::new(ALL_EVENT_TYPES_LABEL)));
        Ok(())
    }

    #[test]
    fn selector_labels_round_trip_through_from_label() {
        assert_eq!(
            EventSelector::from_label(ALL_EVENT_TYPES_LABEL),
            EventSelector::All
        );
        assert_eq!(
            EventSelector::from_label("push"),
            EventSelector::Only(EventType::new("push"))
        );
        assert_eq!(EventSelector::All.label(), "(All event types)");
    }

    #[test]
    fn subject_lookup_by_row_id() -> Result<()> {
        let dataset = parse(
            r#"{"eventTypes":["push"],"items":[{"language":"Rust","subjects":{"push":"New commit"}}]}"#,
        )?;
        let (entry, subject) = dataset
            .subject(crate::RowId::new(0, 0))
            .expect("row should exist");
        assert_eq!(entry.language, "Rust");
        assert_eq!(subject.template, "New commit");
        assert!(dataset.subject(crate::RowId::new(0, 1)).is_none());
        assert!(entry.has_event(&EventType::new("push")));
        Ok(())
    }
}
