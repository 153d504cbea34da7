// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::{
    Dataset, EventSelector, ExportArtifact, FilteredView, RowId, ViewState, build_export,
    filter_view,
};

pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const COPY_FAILED_MESSAGE: &str = "Copy failed. Please copy manually.";
pub const NO_RESULTS_MESSAGE: &str = "No matching languages or subject lines.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    dataset: Dataset,
    pub view: ViewState,
    pub copied: BTreeSet<RowId>,
    pub notification: Option<String>,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SearchChanged(String),
    FilterChanged(EventSelector),
    NextFilter,
    PrevFilter,
    ExportRequested,
    CopyRequested(RowId),
    CopySucceeded(RowId),
    CopyFailed(RowId),
    RevertCopyLabel(RowId),
    DismissNotification,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ViewChanged,
    ExportReady(ExportArtifact),
    CopyReady { row: RowId, text: String },
    CopyLabelChanged { row: RowId, copied: bool },
    NotificationShown(String),
    NotificationDismissed,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            view: ViewState::default(),
            copied: BTreeSet::new(),
            notification: None,
            status_line: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Recomputed on every call from the live view state.
    pub fn filtered(&self) -> FilteredView<'_> {
        filter_view(&self.dataset, &self.view)
    }

    pub fn copy_label(&self, row: RowId) -> &'static str {
        if self.copied.contains(&row) {
            COPIED_LABEL
        } else {
            COPY_LABEL
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SearchChanged(query) => {
                self.view.query = query;
                vec![AppEvent::ViewChanged]
            }
            AppCommand::FilterChanged(selector) => {
                if let EventSelector::Only(event) = &selector
                    && !self.dataset.is_known_event(event)
                {
                    let message = format!("unknown event type {:?}", event.as_str());
                    return vec![self.set_status(&message)];
                }
                self.view.selector = selector;
                vec![AppEvent::ViewChanged]
            }
            AppCommand::NextFilter => self.rotate_filter(1),
            AppCommand::PrevFilter => self.rotate_filter(-1),
            AppCommand::ExportRequested => {
                let artifact = build_export(&self.filtered());
                vec![AppEvent::ExportReady(artifact)]
            }
            AppCommand::CopyRequested(row) => {
                let text = self
                    .dataset
                    .subject(row)
                    .filter(|_| self.filtered().contains_row(row))
                    .map(|(_, subject)| subject.template.clone());
                match text {
                    Some(text) => vec![AppEvent::CopyReady { row, text }],
                    None => vec![self.set_status("nothing to copy")],
                }
            }
            AppCommand::CopySucceeded(row) => {
                self.copied.insert(row);
                vec![AppEvent::CopyLabelChanged { row, copied: true }]
            }
            AppCommand::CopyFailed(_) => {
                self.notification = Some(COPY_FAILED_MESSAGE.to_owned());
                vec![AppEvent::NotificationShown(COPY_FAILED_MESSAGE.to_owned())]
            }
            AppCommand::RevertCopyLabel(row) => {
                self.copied.remove(&row);
                vec![AppEvent::CopyLabelChanged { row, copied: false }]
            }
            AppCommand::DismissNotification => {
                self.notification = None;
                vec![AppEvent::NotificationDismissed]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_filter(&mut self, delta: isize) -> Vec<AppEvent> {
        let options = self.dataset.selector_options();
        let current = options
            .iter()
            .position(|option| *option == self.view.selector)
            .unwrap_or(0) as isize;
        let len = options.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.view.selector = options[next].clone();
        vec![AppEvent::ViewChanged]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
