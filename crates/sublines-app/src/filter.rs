// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Dataset, EntryId, EventSelector, EventType, LanguageEntry, RowId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub query: String,
    pub selector: EventSelector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilteredRow<'a> {
    pub id: RowId,
    pub event: &'a EventType,
    pub subject: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredEntry<'a> {
    pub id: EntryId,
    pub language: &'a str,
    /// Subject count of the whole entry, independent of the event filter.
    pub total_subjects: usize,
    pub rows: Vec<FilteredRow<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView<'a> {
    pub entries: Vec<FilteredEntry<'a>>,
}

impl<'a> FilteredView<'a> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.rows.len()).sum()
    }

    /// Visible rows in display order, paired with their language.
    pub fn rows(&self) -> impl Iterator<Item = (&'a str, FilteredRow<'a>)> + '_ {
        self.entries
            .iter()
            .flat_map(|entry| entry.rows.iter().map(move |row| (entry.language, *row)))
    }

    pub fn contains_row(&self, id: RowId) -> bool {
        self.entries
            .iter()
            .filter(|entry| entry.id == id.entry)
            .any(|entry| entry.rows.iter().any(|row| row.id == id))
    }
}

pub fn fold_query(query: &str) -> String {
    query.to_lowercase()
}

pub fn event_matches(entry: &LanguageEntry, selector: &EventSelector) -> bool {
    match selector {
        EventSelector::All => true,
        EventSelector::Only(event) => entry.has_event(event),
    }
}

/// `folded_query` must already be lowercased. Subjects are searched in full,
/// not only the ones the event filter keeps.
pub fn search_matches(entry: &LanguageEntry, folded_query: &str) -> bool {
    if folded_query.is_empty() {
        return true;
    }
    entry.language.to_lowercase().contains(folded_query)
        || entry
            .subjects
            .iter()
            .any(|subject| subject.template.to_lowercase().contains(folded_query))
}

pub fn filter_view<'a>(dataset: &'a Dataset, view: &ViewState) -> FilteredView<'a> {
    let folded = fold_query(&view.query);
    let entries = dataset
        .items()
        .iter()
        .enumerate()
        .filter(|(_, entry)| event_matches(entry, &view.selector))
        .filter(|(_, entry)| search_matches(entry, &folded))
        .map(|(entry_index, entry)| FilteredEntry {
            id: EntryId::new(entry_index),
            language: entry.language.as_str(),
            total_subjects: entry.subject_count(),
            rows: entry
                .subjects
                .iter()
                .enumerate()
                .filter(|(_, subject)| view.selector.matches(&subject.event))
                .map(|(subject_index, subject)| FilteredRow {
                    id: RowId::new(entry_index, subject_index),
                    event: &subject.event,
                    subject: subject.template.as_str(),
                })
                .collect(),
        })
        .collect();

    FilteredView { entries }
}

#[cfg(test)]
mod tests {
    use super::{ViewState, event_matches, filter_view, search_matches};
    use crate::{Dataset, EventSelector, EventType, LanguageEntry, RowId, Subject};

    fn entry(language: &str, subjects: &[(&str, &str)]) -> LanguageEntry {
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

    fn sample_dataset() -> Dataset {
        Dataset::new(
            vec![
                EventType::new("push"),
                EventType::new("issue"),
                EventType::new("release"),
            ],
            vec![
                entry(
                    "Rust",
                    &[("push", "New commit"), ("issue", "Borrow checker ticket")],
                ),
                entry("Go", &[("push", "Pushed to main"), ("release", "Tagged v1")]),
                entry("Zig", &[]),
            ],
        )
        .expect("valid dataset")
    }

    fn view(query: &str, selector: EventSelector) -> ViewState {
        ViewState {
            query: query.to_owned(),
            selector,
        }
    }

    fn only(event: &str) -> EventSelector {
        EventSelector::Only(EventType::new(event))
    }

    #[test]
    fn empty_query_and_all_shows_everything() {
        let dataset = sample_dataset();
        let filtered = filter_view(&dataset, &ViewState::default());

        let languages = filtered
            .entries
            .iter()
            .map(|entry| entry.language)
            .collect::<Vec<_>>();
        assert_eq!(languages, vec!["Rust", "Go", "Zig"]);
        assert_eq!(filtered.row_count(), 4);
        for (entry, source) in filtered.entries.iter().zip(dataset.items()) {
            assert_eq!(entry.total_subjects, source.subject_count());
            assert_eq!(entry.rows.len(), source.subject_count());
        }
    }

    #[test]
    fn event_filter_hides_entries_without_the_key() {
        let dataset = sample_dataset();
        let filtered = filter_view(&dataset, &view("", only("release")));

        assert_eq!(filtered.entries.len(), 1);
        assert_eq!(filtered.entries[0].language, "Go");
        assert_eq!(filtered.entries[0].rows.len(), 1);
        assert_eq!(filtered.entries[0].rows[0].subject, "Tagged v1");
    }

    #[test]
    fn badge_count_ignores_event_filter() {
        let dataset = sample_dataset();
        let filtered = filter_view(&dataset, &view("", only("push")));

        let rust = &filtered.entries[0];
        assert_eq!(rust.language, "Rust");
        assert_eq!(rust.total_subjects, 2);
        assert_eq!(rust.rows.len(), 1);
    }

    #[test]
    fn search_is_case_insensitive_on_language() {
        let dataset = sample_dataset();
        let filtered = filter_view(&dataset, &view("RuS", EventSelector::All));

        assert_eq!(filtered.entries.len(), 1);
        assert_eq!(filtered.entries[0].language, "Rust");
    }

    #[test]
    fn search_matches_subjects_outside_the_event_filter() {
        let dataset = sample_dataset();
        // "borrow" only appears in Rust's issue subject, but rows stay
        // restricted to the push event.
        let filtered = filter_view(&dataset, &view("borrow", only("push")));

        assert_eq!(filtered.entries.len(), 1);
        let rows = &filtered.entries[0].rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event.as_str(), "push");
        assert_eq!(rows[0].subject, "New commit");
    }

    #[test]
    fn search_does_not_filter_rows() {
        let dataset = sample_dataset();
        let filtered = filter_view(&dataset, &view("tagged", EventSelector::All));

        assert_eq!(filtered.entries.len(), 1);
        assert_eq!(filtered.entries[0].language, "Go");
        assert_eq!(filtered.entries[0].rows.len(), 2);
    }

    #[test]
    fn language_match_with_no_rows_still_yields_entry() {
        let dataset = sample_dataset();
        let filtered = filter_view(&dataset, &view("zig", EventSelector::All));

        assert_eq!(filtered.entries.len(), 1);
        assert_eq!(filtered.entries[0].language, "Zig");
        assert!(filtered.entries[0].rows.is_empty());
        assert_eq!(filtered.entries[0].total_subjects, 0);
    }

    #[test]
    fn unmatched_query_yields_empty_view() {
        let dataset = sample_dataset();
        let filtered = filter_view(&dataset, &view("zzz", EventSelector::All));
        assert!(filtered.is_empty());
        assert_eq!(filtered.row_count(), 0);
    }

    #[test]
    fn entry_visibility_is_conjunction_of_predicates() {
        let dataset = sample_dataset();
        let queries = ["", "rust", "PUSH", "commit", "tagged", "zzz", "g"];
        let mut selectors = dataset.selector_options();
        selectors.push(only("missing"));

        for query in queries {
            for selector in &selectors {
                let state = view(query, selector.clone());
                let filtered = filter_view(&dataset, &state);
                let folded = query.to_lowercase();
                let expected = dataset
                    .items()
                    .iter()
                    .filter(|entry| {
                        event_matches(entry, selector) && search_matches(entry, &folded)
                    })
                    .map(|entry| entry.language.as_str())
                    .collect::<Vec<_>>();
                let actual = filtered
                    .entries
                    .iter()
                    .map(|entry| entry.language)
                    .collect::<Vec<_>>();
                assert_eq!(actual, expected, "query={query:?} selector={selector}");

                for visible in &filtered.entries {
                    let source = dataset.entry(visible.id).expect("entry exists");
                    let expected_rows = source
                        .subjects
                        .iter()
                        .filter(|subject| selector.matches(&subject.event))
                        .count();
                    assert_eq!(visible.rows.len(), expected_rows);
                    assert_eq!(visible.total_subjects, source.subject_count());
                }
            }
        }
    }

    #[test]
    fn rows_flatten_in_display_order() {
        let dataset = sample_dataset();
        let filtered = filter_view(&dataset, &view("", only("push")));

        let rows = filtered
            .rows()
            .map(|(language, row)| (language, row.id))
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![("Rust", RowId::new(0, 0)), ("Go", RowId::new(1, 0))]
        );
        assert!(filtered.contains_row(RowId::new(1, 0)));
        assert!(!filtered.contains_row(RowId::new(1, 1)));
    }

    #[test]
    fn filtering_twice_is_identical() {
        let dataset = sample_dataset();
        let state = view("o", only("push"));
        assert_eq!(filter_view(&dataset, &state), filter_view(&dataset, &state));
    }
}
