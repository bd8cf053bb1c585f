// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Terminal user interface
//!
//! An interactive picker: the scan runs in the background through
//! [`ScanService`], and the list is re-ranked on every keystroke. The UI is
//! drawn on stderr so the chosen path can be captured from stdout.

use crate::matcher::score_candidates;
use crate::scanner::ScanOptions;
use crate::service::{ScanService, ScanState};
use crate::types::RepositoryRecord;
use anyhow::Result;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
use std::io::{self, Stderr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

type Term = Terminal<CrosstermBackend<Stderr>>;

const TICK: Duration = Duration::from_millis(50);

/// Where the picker's data currently comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Nothing requested yet
    Idle,
    /// A scan is running
    Scanning,
    /// Records are from a completed scan
    Ready,
    /// The last scan failed
    Failed(String),
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Keep going
    Continue,
    /// Leave without choosing
    Quit,
    /// Leave with this repository
    Choose(RepositoryRecord),
    /// Start a fresh scan
    Rescan,
}

/// A visible row: the record plus matched positions for highlighting
#[derive(Debug)]
struct Row<'a> {
    record: &'a RepositoryRecord,
    positions: Vec<usize>,
}

/// Picker state, independent of the terminal
#[derive(Debug)]
pub struct PickerApp {
    root: PathBuf,
    options: ScanOptions,
    query: String,
    records: Arc<[RepositoryRecord]>,
    status: Status,
    list: ListState,
}

impl PickerApp {
    /// New picker for `root`, with no records yet
    #[must_use]
    pub fn new(root: PathBuf, options: ScanOptions) -> Self {
        Self {
            root,
            options,
            query: String::new(),
            records: Arc::from(Vec::new()),
            status: Status::Idle,
            list: ListState::default(),
        }
    }

    /// Current query text
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Take in a state published by the scan service
    pub fn apply_state(&mut self, state: &ScanState) {
        match state {
            ScanState::Idle => self.status = Status::Idle,
            // Keep showing the previous set until the new one lands
            ScanState::Scanning { .. } => self.status = Status::Scanning,
            ScanState::Ready { records, .. } => {
                self.records = Arc::clone(records);
                self.status = Status::Ready;
                self.reset_selection();
            }
            ScanState::Failed { error, .. } => {
                self.records = Arc::from(Vec::new());
                self.status = Status::Failed(error.to_string());
                self.reset_selection();
            }
        }
    }

    /// Names currently visible, best first
    #[must_use]
    pub fn visible_names(&self) -> Vec<&str> {
        self.rows().into_iter().map(|row| row.record.name.as_str()).collect()
    }

    /// The highlighted record, if any
    #[must_use]
    pub fn selected(&self) -> Option<&RepositoryRecord> {
        let idx = self.list.selected()?;
        self.rows().get(idx).map(|row| row.record)
    }

    /// Handle one key press
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::Continue;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if ctrl => Action::Quit,
            KeyCode::Char('r') if ctrl => Action::Rescan,
            KeyCode::Enter => self
                .selected()
                .cloned()
                .map_or(Action::Continue, Action::Choose),
            KeyCode::Up => {
                self.list.select_previous();
                Action::Continue
            }
            KeyCode::Down => {
                let last = self.rows().len().saturating_sub(1);
                let next = self.list.selected().map_or(0, |i| (i + 1).min(last));
                self.list.select(Some(next));
                Action::Continue
            }
            KeyCode::Backspace => {
                if self.query.pop().is_some() {
                    self.reset_selection();
                }
                Action::Continue
            }
            KeyCode::Char(ch) if !ctrl => {
                self.query.push(ch);
                self.reset_selection();
                Action::Continue
            }
            _ => Action::Continue,
        }
    }

    fn rows(&self) -> Vec<Row<'_>> {
        if self.query.is_empty() {
            return self
                .records
                .iter()
                .map(|record| Row {
                    record,
                    positions: Vec::new(),
                })
                .collect();
        }

        score_candidates(&self.query, &self.records)
            .into_iter()
            .map(|c| Row {
                record: c.record,
                positions: c.positions,
            })
            .collect()
    }

    fn reset_selection(&mut self) {
        let any = !self.rows().is_empty();
        self.list.select(any.then_some(0));
    }
}

/// Run the picker until the user chooses a repository or quits.
///
/// Must be called with a tokio runtime entered; scans run on it.
///
/// # Errors
///
/// Fails if the terminal cannot be set up or drawn to.
pub fn run(root: PathBuf, options: ScanOptions) -> Result<Option<RepositoryRecord>> {
    let service = ScanService::new();
    let mut app = PickerApp::new(root, options);
    service.request_scan(app.root.clone(), app.options.clone());

    let mut terminal = setup_terminal()?;
    let outcome = event_loop(&mut terminal, &mut app, &service);
    restore_terminal(&mut terminal)?;

    service.cancel();
    outcome
}

fn event_loop(
    terminal: &mut Term,
    app: &mut PickerApp,
    service: &ScanService,
) -> Result<Option<RepositoryRecord>> {
    let mut updates = service.subscribe();
    updates.mark_changed();

    loop {
        if updates.has_changed().unwrap_or(false) {
            let state = updates.borrow_and_update().clone();
            app.apply_state(&state);
        }

        terminal.draw(|frame| render(frame, app))?;

        let Some(key) = read_key()? else {
            continue;
        };
        match app.handle_key(key) {
            Action::Continue => {}
            Action::Quit => return Ok(None),
            Action::Choose(record) => return Ok(Some(record)),
            Action::Rescan => {
                service.request_scan(app.root.clone(), app.options.clone());
            }
        }
    }
}

fn read_key() -> Result<Option<KeyEvent>> {
    if event::poll(TICK)? {
        if let Event::Key(key) = event::read()? {
            return Ok(Some(key));
        }
    }
    Ok(None)
}

fn render(frame: &mut Frame<'_>, app: &mut PickerApp) {
    let [input_area, list_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let input = Paragraph::new(app.query.as_str())
        .block(Block::bordered().title(" Search repositories "));
    frame.render_widget(input, input_area);

    let typed = u16::try_from(app.query.chars().count()).unwrap_or(u16::MAX);
    frame.set_cursor_position((
        input_area.x.saturating_add(1).saturating_add(typed),
        input_area.y.saturating_add(1),
    ));

    let rows = app.rows();
    let total = app.records.len();
    let shown = rows.len();
    let items: Vec<ListItem<'static>> = rows.iter().map(list_item).collect();
    drop(rows);

    let list = List::new(items)
        .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut app.list);

    let status = match &app.status {
        Status::Idle => Line::from("Idle").dim(),
        Status::Scanning => Line::from(format!("Scanning {} ...", app.root.display())).yellow(),
        Status::Ready => Line::from(format!("{shown} of {total} repositories")).dim(),
        Status::Failed(message) => Line::from(format!("Scan failed: {message}")).red(),
    };
    frame.render_widget(Paragraph::new(status), status_area);
}

fn list_item(row: &Row<'_>) -> ListItem<'static> {
    let mut spans: Vec<Span<'static>> = row
        .record
        .name
        .chars()
        .enumerate()
        .map(|(idx, ch)| {
            if row.positions.contains(&idx) {
                Span::raw(ch.to_string()).green().bold()
            } else {
                Span::raw(ch.to_string())
            }
        })
        .collect();
    spans.push(Span::raw("  "));
    spans.push(Span::raw(row.record.path.display().to_string()).dim());
    ListItem::new(Line::from(spans))
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stderr))?)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
