// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use sublines_app::{
    AppCommand, AppEvent, AppState, ExportArtifact, NO_RESULTS_MESSAGE, RowId,
};
use tracing::{debug, info, warn};

pub const COPY_ACK_DURATION: Duration = Duration::from_millis(1500);

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const PAGE_ROWS: isize = 10;
const CARD_CHROME_ROWS: u16 = 3;
const EVENT_COLUMN_MIN: usize = 10;
const EVENT_COLUMN_MAX: usize = 28;
const COPY_COLUMN_WIDTH: u16 = 9;
const SELECTOR_PREV: &str = "◀";
const SELECTOR_NEXT: &str = "▶";
const ROW_MARKER: &str = "›";

/// Platform services the viewer consumes.
pub trait AppRuntime {
    fn copy_to_clipboard(&mut self, text: &str) -> Result<()>;
    /// Hands the artifact to the user as a downloaded file and returns where
    /// it landed.
    fn save_export(&mut self, artifact: &ExportArtifact) -> Result<PathBuf>;
    fn copy_ack_duration(&self) -> Duration {
        COPY_ACK_DURATION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    RevertCopyLabel(RowId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RowProjection {
    id: RowId,
    event: String,
    subject: String,
    copy_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CardProjection {
    language: String,
    badge: String,
    rows: Vec<RowProjection>,
}

impl CardProjection {
    fn height(&self) -> u16 {
        u16::try_from(self.rows.len())
            .unwrap_or(u16::MAX)
            .saturating_add(CARD_CHROME_ROWS)
    }

    fn position_of(&self, row: RowId) -> Option<usize> {
        self.rows.iter().position(|candidate| candidate.id == row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ViewData {
    selected: Option<RowId>,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    sync_selection(state, &mut view_data);
    info!(
        languages = state.dataset().len(),
        event_types = state.dataset().event_types().len(),
        "viewer started"
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            // Per copy, not token-guarded.
            InternalEvent::RevertCopyLabel(row) => {
                state.dispatch(AppCommand::RevertCopyLabel(row));
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    schedule_internal_event(internal_tx, STATUS_CLEAR_AFTER, InternalEvent::ClearStatus { token });
}

fn schedule_internal_event(internal_tx: &Sender<InternalEvent>, delay: Duration, event: InternalEvent) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(event);
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch_command(
        state,
        view_data,
        internal_tx,
        AppCommand::SetStatus(message.into()),
    );
}

/// Dispatches a command that needs no platform service.
fn dispatch_command(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    for event in state.dispatch(command) {
        apply_view_event(state, view_data, internal_tx, &event);
    }
}

/// View bookkeeping shared by every dispatch path.
fn apply_view_event(
    state: &AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    event: &AppEvent,
) {
    match event {
        AppEvent::ViewChanged => sync_selection(state, view_data),
        AppEvent::StatusUpdated(_) => {
            view_data.status_token = view_data.status_token.saturating_add(1);
            schedule_status_clear(internal_tx, view_data.status_token);
        }
        AppEvent::ExportReady(_)
        | AppEvent::CopyReady { .. }
        | AppEvent::CopyLabelChanged { .. }
        | AppEvent::NotificationShown(_)
        | AppEvent::NotificationDismissed
        | AppEvent::StatusCleared => {}
    }
}

fn dispatch_and_apply<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    debug!(?command, "dispatch");
    let events = state.dispatch(command);
    for event in events {
        match event {
            AppEvent::ExportReady(artifact) => match runtime.save_export(&artifact) {
                Ok(path) => {
                    info!(rows = artifact.row_count, path = %path.display(), "exported view");
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!(
                            "exported {} rows to {}",
                            artifact.row_count,
                            path.display()
                        ),
                    );
                }
                Err(error) => {
                    warn!(error = %format!("{error:#}"), "export failed");
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("export failed: {error:#}"),
                    );
                }
            },
            AppEvent::CopyReady { row, text } => match runtime.copy_to_clipboard(&text) {
                Ok(()) => {
                    state.dispatch(AppCommand::CopySucceeded(row));
                    schedule_internal_event(
                        internal_tx,
                        runtime.copy_ack_duration(),
                        InternalEvent::RevertCopyLabel(row),
                    );
                }
                Err(error) => {
                    warn!(error = %format!("{error:#}"), ?row, "clipboard write failed");
                    state.dispatch(AppCommand::CopyFailed(row));
                }
            },
            other => apply_view_event(state, view_data, internal_tx, &other),
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    // Release and repeat reports would double every keystroke.
    if key.kind != KeyEventKind::Press {
        return false;
    }

    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    // The copy-failure notification blocks everything else until dismissed.
    if state.notification.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            dispatch_command(state, view_data, internal_tx, AppCommand::DismissNotification);
        }
        return false;
    }

    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    let command = match (key.code, control) {
        (KeyCode::Esc, _) => {
            if state.view.query.is_empty() {
                return true;
            }
            AppCommand::SearchChanged(String::new())
        }
        (KeyCode::Char('u'), true) => AppCommand::SearchChanged(String::new()),
        (KeyCode::Char('e'), true) => AppCommand::ExportRequested,
        (KeyCode::Char('y'), true) | (KeyCode::Enter, _) => {
            let Some(row) = view_data.selected else {
                emit_status(state, view_data, internal_tx, "nothing to copy");
                return false;
            };
            AppCommand::CopyRequested(row)
        }
        (KeyCode::Tab, _) | (KeyCode::Right, _) => AppCommand::NextFilter,
        (KeyCode::BackTab, _) | (KeyCode::Left, _) => AppCommand::PrevFilter,
        (KeyCode::Up, _) | (KeyCode::Char('p'), true) => {
            move_selection(state, view_data, -1);
            return false;
        }
        (KeyCode::Down, _) | (KeyCode::Char('n'), true) => {
            move_selection(state, view_data, 1);
            return false;
        }
        (KeyCode::PageUp, _) => {
            move_selection(state, view_data, -PAGE_ROWS);
            return false;
        }
        (KeyCode::PageDown, _) => {
            move_selection(state, view_data, PAGE_ROWS);
            return false;
        }
        (KeyCode::Backspace, _) => {
            let mut query = state.view.query.clone();
            if query.pop().is_none() {
                return false;
            }
            AppCommand::SearchChanged(query)
        }
        (KeyCode::Char(ch), false) if !key.modifiers.contains(KeyModifiers::ALT) => {
            let mut query = state.view.query.clone();
            query.push(ch);
            AppCommand::SearchChanged(query)
        }
        _ => return false,
    };

    dispatch_and_apply(state, runtime, view_data, internal_tx, command);
    false
}

fn visible_row_ids(state: &AppState) -> Vec<RowId> {
    state.filtered().rows().map(|(_, row)| row.id).collect()
}

/// Keeps the selected row when it is still visible, otherwise falls back to
/// the first visible row.
fn sync_selection(state: &AppState, view_data: &mut ViewData) {
    let rows = visible_row_ids(state);
    if let Some(selected) = view_data.selected
        && rows.contains(&selected)
    {
        return;
    }
    view_data.selected = rows.first().copied();
}

fn move_selection(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let rows = visible_row_ids(state);
    if rows.is_empty() {
        view_data.selected = None;
        return;
    }
    let current = view_data
        .selected
        .and_then(|selected| rows.iter().position(|row| *row == selected))
        .unwrap_or(0) as isize;
    let last = rows.len() as isize - 1;
    let next = (current + delta).clamp(0, last) as usize;
    view_data.selected = Some(rows[next]);
}

fn badge_text(count: usize) -> String {
    format!("{count} subjects")
}

/// Table cells are one line tall; control characters would hide the rest of
/// the text.
fn display_text(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

fn card_projections(state: &AppState) -> Vec<CardProjection> {
    state
        .filtered()
        .entries
        .iter()
        .map(|entry| CardProjection {
            language: display_text(entry.language),
            badge: badge_text(entry.total_subjects),
            rows: entry
                .rows
                .iter()
                .map(|row| RowProjection {
                    id: row.id,
                    event: display_text(row.event.as_str()),
                    subject: display_text(row.subject),
                    copy_label: state.copy_label(row.id),
                })
                .collect(),
        })
        .collect()
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, layout[0], state);

    let cards = card_projections(state);
    if cards.is_empty() {
        let placeholder = Paragraph::new(NO_RESULTS_MESSAGE)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(placeholder, layout[1]);
    } else {
        render_cards(frame, layout[1], &cards, view_data.selected);
    }

    let status_widget = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(message) = &state.notification {
        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);
        let notification = Paragraph::new(format!("{message}\n\nenter/esc to dismiss"))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title("copy")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(notification, area);
    }
}

fn render_header(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let search = Paragraph::new(format!("{}█", state.view.query))
        .block(Block::default().title("search").borders(Borders::ALL));
    frame.render_widget(search, columns[0]);

    let selector = Paragraph::new(format!(
        "{SELECTOR_PREV} {} {SELECTOR_NEXT}",
        state.view.selector.label()
    ))
    .style(Style::default().fg(Color::Cyan))
    .block(Block::default().title("event type").borders(Borders::ALL));
    frame.render_widget(selector, columns[1]);
}

/// Index of the first card to draw so the selected card ends inside `height`.
fn first_visible_card(cards: &[CardProjection], selected_card: usize, height: u16) -> usize {
    let mut first = selected_card;
    let mut used = cards[selected_card].height();
    while first > 0 {
        let above = cards[first - 1].height();
        if used.saturating_add(above) > height {
            break;
        }
        used += above;
        first -= 1;
    }
    first
}

fn render_cards(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    cards: &[CardProjection],
    selected: Option<RowId>,
) {
    let selected_card = selected
        .and_then(|row| cards.iter().position(|card| card.position_of(row).is_some()))
        .unwrap_or(0);
    let first = first_visible_card(cards, selected_card, area.height);

    let mut y = area.y;
    let bottom = area.y.saturating_add(area.height);
    for card in &cards[first..] {
        if y >= bottom {
            break;
        }
        let height = card.height().min(bottom - y);
        let card_area = Rect::new(area.x, y, area.width, height);
        render_card(frame, card_area, card, selected);
        y = y.saturating_add(height);
    }
}

fn render_card(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    card: &CardProjection,
    selected: Option<RowId>,
) {
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", card.language),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("[{}] ", card.badge),
            Style::default().fg(Color::Cyan),
        ),
    ]);

    let selected_index = selected.and_then(|row| card.position_of(row));
    let visible_rows = usize::from(area.height.saturating_sub(CARD_CHROME_ROWS)).max(1);
    let offset = selected_index
        .map(|index| index.saturating_sub(visible_rows - 1))
        .unwrap_or(0);

    let event_width = card
        .rows
        .iter()
        .map(|row| row.event.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(EVENT_COLUMN_MIN, EVENT_COLUMN_MAX) as u16;
    let widths = [
        Constraint::Length(1),
        Constraint::Length(event_width),
        Constraint::Min(10),
        Constraint::Length(COPY_COLUMN_WIDTH),
    ];

    let header = Row::new(["", "Event Type", "Subject Line", ""].map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = card
        .rows
        .iter()
        .enumerate()
        .skip(offset)
        .map(|(index, row)| {
            let is_selected = selected_index == Some(index);
            let base = if is_selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            let copy_style = if row.copy_label == sublines_app::COPIED_LABEL {
                base.fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                base.fg(Color::Cyan)
            };
            Row::new(vec![
                Cell::from(if is_selected { ROW_MARKER } else { "" }).style(base),
                Cell::from(row.event.clone()).style(base),
                Cell::from(row.subject.clone()).style(base),
                Cell::from(row.copy_label).style(copy_style),
            ])
        });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn status_text(state: &AppState) -> String {
    let filtered = state.filtered();
    let counts = format!(
        "{} languages, {} rows",
        filtered.entries.len(),
        filtered.row_count()
    );
    let keys = "type search | tab event | ↑/↓ row | enter copy | ctrl+e export | esc quit";
    match &state.status_line {
        Some(status) => format!("{counts} | {status} | {keys}"),
        None => format!("{counts} | {keys}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
