use crate::activity::{ActivityTracker, Response, OTHER_ACTIVITY};
use crate::calendar::{CalendarDate, Month, WEEKDAY_HEADERS};
use crate::config::Theme;
use crate::model::{EventStore, NoteList};
use crate::storage::{save_events, save_notes, LocalStorage};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{debug, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListState;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

pub fn run(mut app: App) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

pub struct App {
    storage: LocalStorage,
    events: EventStore,
    notes: NoteList,
    tracker: ActivityTracker,
    theme: Theme,
    view: ViewMode,
    mode: Mode,
    calendar: CalendarState,
    note_idx: usize,
    activity_idx: usize,
    evaluation: Option<String>,
    last_save: Option<Instant>,
    status: String,
}

enum Mode {
    Normal,
    Input { target: InputTarget, field: FieldValue },
    ConfirmDelete(DeleteTarget),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum ViewMode {
    Calendar,
    Notepad,
    Activities,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum InputTarget {
    Event,
    Note,
    Activity,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum DeleteTarget {
    Event { date: CalendarDate, index: usize },
    Note(usize),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum CalendarFocus {
    Grid,
    Events,
}

struct CalendarState {
    month: Month,
    cursor: CalendarDate,
    selected: Option<CalendarDate>,
    focus: CalendarFocus,
    event_idx: usize,
}

impl CalendarState {
    fn new(today: CalendarDate) -> Self {
        CalendarState {
            month: Month::containing(today),
            cursor: today,
            selected: None,
            focus: CalendarFocus::Grid,
            event_idx: 0,
        }
    }

    fn shift_cursor(&mut self, days: i64) {
        if let Some(next) = self.cursor.offset_days(days) {
            self.cursor = next;
            self.month = Month::containing(next);
        }
    }

    /// Keeps the cursor on the same day number, clamped to the new month's length.
    fn show_month(&mut self, month: Month) {
        let day = self.cursor.day().min(month.days_in_month());
        self.month = month;
        self.cursor = month.day(day).unwrap_or_else(|| month.first_day());
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            CalendarFocus::Grid => CalendarFocus::Events,
            CalendarFocus::Events => CalendarFocus::Grid,
        };
    }
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Calendar => "Calendar",
            ViewMode::Notepad => "Notepad",
            ViewMode::Activities => "Activities",
        }
    }
}

impl InputTarget {
    fn title(&self) -> &'static str {
        match self {
            InputTarget::Event => "New Event",
            InputTarget::Note => "New Note",
            InputTarget::Activity => "New Activity",
        }
    }
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        self.cursor = prev_boundary(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        self.cursor = next_boundary(self.cursor, &self.value);
    }

    fn home(&mut self) {
        self.cursor = 0;
    }

    fn end(&mut self) {
        self.cursor = self.value.len();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn delete(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        let next = next_boundary(self.cursor, &self.value);
        self.value.drain(self.cursor..next);
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

#[derive(Copy, Clone)]
struct Palette {
    background: Color,
    text: Color,
    muted: Color,
    accent: Color,
    cursor_bg: Color,
    cursor_fg: Color,
    marker: Color,
    alert: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                background: Color::Rgb(16, 18, 24),
                text: Color::Gray,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                cursor_bg: Color::Cyan,
                cursor_fg: Color::Black,
                marker: Color::LightYellow,
                alert: Color::LightRed,
            },
            Theme::Light => Palette {
                background: Color::Rgb(245, 244, 238),
                text: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                cursor_bg: Color::Blue,
                cursor_fg: Color::White,
                marker: Color::Magenta,
                alert: Color::Red,
            },
        }
    }
}

impl App {
    pub fn new(
        storage: LocalStorage,
        events: EventStore,
        notes: NoteList,
        tracker: ActivityTracker,
        theme: Theme,
    ) -> Self {
        let status = format!("Loaded data from {}", storage.dir().display());
        App {
            storage,
            events,
            notes,
            tracker,
            theme,
            view: ViewMode::Calendar,
            mode: Mode::Normal,
            calendar: CalendarState::new(CalendarDate::today()),
            note_idx: 0,
            activity_idx: 0,
            evaluation: None,
            last_save: None,
            status,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Input { .. } => {
                self.handle_input_key(key);
                false
            }
            Mode::ConfirmDelete(_) => {
                self.handle_confirm_key(key);
                false
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('1') => self.set_view(ViewMode::Calendar),
            KeyCode::Char('2') => self.set_view(ViewMode::Notepad),
            KeyCode::Char('3') => self.set_view(ViewMode::Activities),
            KeyCode::Char('t') => {
                self.theme = self.theme.toggled();
                self.status = format!("Switched to {} theme", self.theme.label());
            }
            _ => match self.view {
                ViewMode::Calendar => self.handle_calendar_key(key),
                ViewMode::Notepad => self.handle_notepad_key(key),
                ViewMode::Activities => self.handle_activities_key(key),
            },
        }
        false
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => self.calendar.toggle_focus(),
            KeyCode::Char('[') => self.calendar.show_month(self.calendar.month.prev()),
            KeyCode::Char(']') => self.calendar.show_month(self.calendar.month.next()),
            KeyCode::Char('a') => {
                if self.calendar.selected.is_some() {
                    self.open_input(InputTarget::Event);
                } else {
                    self.status = "Select a day with Enter first".into();
                }
            }
            _ => match self.calendar.focus {
                CalendarFocus::Grid => self.handle_grid_key(key),
                CalendarFocus::Events => self.handle_event_list_key(key),
            },
        }
        self.ensure_bounds();
    }

    fn handle_grid_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.calendar.shift_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.calendar.shift_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.calendar.shift_cursor(-7),
            KeyCode::Down | KeyCode::Char('j') => self.calendar.shift_cursor(7),
            KeyCode::Enter => {
                let day = self.calendar.cursor;
                self.calendar.selected = Some(day);
                self.calendar.event_idx = 0;
                let count = self.events.events_on(day).len();
                self.status = format!("Selected {} ({} events)", day, count);
            }
            _ => {}
        }
    }

    fn handle_event_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.calendar.event_idx = self.calendar.event_idx.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => self.calendar.event_idx += 1,
            KeyCode::Char('d') => match self.selected_event() {
                Some((date, index, text)) => {
                    self.status = format!("Delete \"{}\"? (y to confirm, n/Esc to cancel)", text);
                    self.mode = Mode::ConfirmDelete(DeleteTarget::Event { date, index });
                }
                None => self.status = "No event selected to delete".into(),
            },
            _ => {}
        }
    }

    fn handle_notepad_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.note_idx = self.note_idx.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.note_idx += 1,
            KeyCode::Char('a') => self.open_input(InputTarget::Note),
            KeyCode::Char('d') => match self.notes.get(self.note_idx) {
                Some(text) => {
                    self.status = format!("Delete \"{}\"? (y to confirm, n/Esc to cancel)", text);
                    self.mode = Mode::ConfirmDelete(DeleteTarget::Note(self.note_idx));
                }
                None => self.status = "No note selected to delete".into(),
            },
            _ => {}
        }
        self.ensure_bounds();
    }

    fn handle_activities_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.activity_idx = self.activity_idx.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => self.activity_idx += 1,
            KeyCode::Char('y') => self.answer_selected(Some(Response::Yes)),
            KeyCode::Char('n') => self.answer_selected(Some(Response::No)),
            KeyCode::Char('u') => self.answer_selected(None),
            KeyCode::Char('a') => {
                if self.tracker.can_add() {
                    self.open_input(InputTarget::Activity);
                } else {
                    self.status = "Activity limit reached".into();
                }
            }
            KeyCode::Char('d') => {
                let label = self.selected_activity();
                if self.tracker.remove_activity(&label) {
                    self.status = format!("Removed {}", label);
                } else {
                    self.status = format!("{} cannot be removed", label);
                }
            }
            KeyCode::Char('e') => {
                let message = match self.tracker.evaluate() {
                    Ok(verdict) => verdict.to_string(),
                    Err(err) => err.to_string(),
                };
                debug!("evaluation: {}", message);
                self.status = "Day evaluated".into();
                self.evaluation = Some(message);
            }
            _ => {}
        }
        self.ensure_bounds();
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let (target, field) = match &mut self.mode {
            Mode::Input { target, field } => (*target, field),
            _ => return,
        };
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Canceled".into();
            }
            KeyCode::Enter => {
                let text = field.value.clone();
                self.mode = Mode::Normal;
                self.submit(target, &text);
            }
            KeyCode::Left => field.move_left(),
            KeyCode::Right => field.move_right(),
            KeyCode::Home => field.home(),
            KeyCode::End => field.end(),
            KeyCode::Backspace => field.backspace(),
            KeyCode::Delete => field.delete(),
            KeyCode::Char(c) => field.insert_char(c),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let target = match self.mode {
            Mode::ConfirmDelete(target) => target,
            _ => return,
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.mode = Mode::Normal;
                self.delete(target);
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Delete canceled".into();
            }
            _ => {}
        }
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.view = view;
            self.status = format!("Switched to {} view", view.label());
        }
        self.ensure_bounds();
    }

    fn open_input(&mut self, target: InputTarget) {
        self.mode = Mode::Input {
            target,
            field: FieldValue::new(""),
        };
        self.status = format!("{} (Enter to add, Esc to cancel)", target.title());
    }

    fn submit(&mut self, target: InputTarget, text: &str) {
        match target {
            InputTarget::Event => {
                if self.events.add_event(self.calendar.selected, text) {
                    let day = self.calendar.selected.map(|d| d.to_string()).unwrap_or_default();
                    self.persist_events(format!("Added event to {}", day));
                } else {
                    self.status = "Nothing to add".into();
                }
            }
            InputTarget::Note => {
                if self.notes.add_note(text) {
                    self.note_idx = self.notes.len() - 1;
                    self.persist_notes("Added note".into());
                } else {
                    self.status = "Nothing to add".into();
                }
            }
            InputTarget::Activity => {
                if self.tracker.add_activity(text) {
                    self.status = format!("Added activity {}", text.trim());
                } else {
                    self.status = "Activity not added (empty, duplicate or limit reached)".into();
                }
            }
        }
        self.ensure_bounds();
    }

    fn delete(&mut self, target: DeleteTarget) {
        match target {
            DeleteTarget::Event { date, index } => {
                if self.events.delete_event(date, index) {
                    self.persist_events(format!("Deleted event from {}", date));
                } else {
                    self.status = "Event no longer exists".into();
                }
            }
            DeleteTarget::Note(index) => {
                if self.notes.delete_note(index) {
                    self.persist_notes("Deleted note".into());
                } else {
                    self.status = "Note no longer exists".into();
                }
            }
        }
        self.ensure_bounds();
    }

    fn answer_selected(&mut self, value: Option<Response>) {
        let label = self.selected_activity();
        let changed = match value {
            Some(v) => self.tracker.set_response(&label, v),
            None => self.tracker.clear_response(&label),
        };
        if changed {
            let answer = value.map(|v| v.label()).unwrap_or("unanswered");
            self.status = format!("{}: {}", label, answer);
        } else if label == OTHER_ACTIVITY {
            self.status = format!("{} is not scored", OTHER_ACTIVITY);
        }
    }

    fn persist_events(&mut self, message: String) {
        let result = save_events(&self.storage, &self.events);
        self.after_save(result, message);
    }

    fn persist_notes(&mut self, message: String) {
        let result = save_notes(&self.storage, &self.notes);
        self.after_save(result, message);
    }

    /// A failed write leaves memory authoritative; the next mutation rewrites the whole key.
    fn after_save(&mut self, result: Result<()>, message: String) {
        match result {
            Ok(()) => {
                debug!("{}", message);
                self.last_save = Some(Instant::now());
                self.status = message;
            }
            Err(err) => {
                warn!("save failed: {:#}", err);
                self.status = format!("{} (not saved: {:#})", message, err);
            }
        }
    }

    fn selected_event(&self) -> Option<(CalendarDate, usize, &str)> {
        let date = self.calendar.selected?;
        let idx = self.calendar.event_idx;
        self.events
            .events_on(date)
            .get(idx)
            .map(|text| (date, idx, text.as_str()))
    }

    fn selected_activity(&self) -> String {
        self.tracker
            .activities()
            .get(self.activity_idx)
            .cloned()
            .unwrap_or_default()
    }

    fn ensure_bounds(&mut self) {
        let event_count = self
            .calendar
            .selected
            .map(|d| self.events.events_on(d).len())
            .unwrap_or(0);
        self.calendar.event_idx = self.calendar.event_idx.min(event_count.saturating_sub(1));
        self.note_idx = self.note_idx.min(self.notes.len().saturating_sub(1));
        self.activity_idx = self
            .activity_idx
            .min(self.tracker.activities().len().saturating_sub(1));
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let palette = Palette::for_theme(self.theme);
        f.render_widget(
            Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
            f.size(),
        );
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0], palette);
        match self.view {
            ViewMode::Calendar => self.draw_calendar(f, layout[1], palette),
            ViewMode::Notepad => self.draw_notepad(f, layout[1], palette),
            ViewMode::Activities => self.draw_activities(f, layout[1], palette),
        }
        self.draw_footer(f, layout[2], palette);

        match &self.mode {
            Mode::Input { target, field } => self.draw_input(f, *target, field, palette),
            Mode::ConfirmDelete(target) => self.draw_confirm(f, *target, palette),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect, p: Palette) {
        let saved = self
            .last_save
            .map(|at| format!("saved {}", format_elapsed(at)))
            .unwrap_or_else(|| "no changes".into());
        let title = Line::from(vec![
            Span::styled(
                "daypad ",
                Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.view.label(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.storage.dir().display()),
                Style::default().fg(p.muted),
            ),
            Span::raw("  •  "),
            Span::styled(saved, Style::default().fg(p.muted)),
            Span::raw("  •  "),
            Span::styled(
                format!("{} theme", self.theme.label()),
                Style::default().fg(p.marker),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(p.muted));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect, p: Palette) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        self.draw_month_grid(f, chunks[0], p);
        self.draw_day_events(f, chunks[1], p);
    }

    fn draw_month_grid(&self, f: &mut ratatui::Frame<'_>, area: Rect, p: Palette) {
        let focused = self.calendar.focus == CalendarFocus::Grid;
        let month = self.calendar.month;
        let today = CalendarDate::today();
        let mut lines = vec![
            Line::from(Span::styled(
                month.title(),
                Style::default().fg(p.marker).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(
                WEEKDAY_HEADERS
                    .iter()
                    .map(|h| Span::styled(format!("{:^6}", h), Style::default().fg(p.muted)))
                    .collect::<Vec<_>>(),
            ),
        ];
        for week in month.grid().chunks(7) {
            let mut spans = week
                .iter()
                .map(|cell| self.day_cell(*cell, today, focused, p))
                .collect::<Vec<_>>();
            spans.resize(7, Span::raw("      "));
            lines.push(Line::from(spans));
        }
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(panel("Calendar  [ prev  ] next", focused, p));
        f.render_widget(paragraph, area);
    }

    fn day_cell(
        &self,
        cell: Option<CalendarDate>,
        today: CalendarDate,
        focused: bool,
        p: Palette,
    ) -> Span<'static> {
        let date = match cell {
            Some(date) => date,
            None => return Span::raw("      "),
        };
        let marker = if self.events.has_events(date) { "•" } else { " " };
        let text = format!(" {:>2}{}  ", date.day(), marker);
        let mut style = Style::default().fg(if self.events.has_events(date) {
            p.marker
        } else {
            p.text
        });
        if date == today {
            style = style.fg(p.accent).add_modifier(Modifier::BOLD);
        }
        if self.calendar.selected == Some(date) {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
        }
        if date == self.calendar.cursor {
            style = style
                .bg(if focused { p.cursor_bg } else { p.muted })
                .fg(p.cursor_fg)
                .add_modifier(Modifier::BOLD);
        }
        Span::styled(text, style)
    }

    fn draw_day_events(&self, f: &mut ratatui::Frame<'_>, area: Rect, p: Palette) {
        let focused = self.calendar.focus == CalendarFocus::Events;
        let date = match self.calendar.selected {
            Some(date) => date,
            None => {
                let hint = Paragraph::new("Press Enter on a day to see its events")
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .block(panel("Events", focused, p));
                f.render_widget(hint, area);
                return;
            }
        };
        let events = self.events.events_on(date);
        let items = if events.is_empty() {
            vec![ListItem::new(Span::styled(
                "(no events, press a to add)",
                Style::default().fg(p.muted),
            ))]
        } else {
            events
                .iter()
                .enumerate()
                .map(|(idx, text)| ListItem::new(format!("{}. {}", idx + 1, text)))
                .collect()
        };
        let mut state = ListState::default();
        if focused && !events.is_empty() {
            state.select(Some(self.calendar.event_idx));
        }
        let list = List::new(items)
            .block(panel(&format!("Events {}", date), focused, p))
            .highlight_style(
                Style::default()
                    .bg(p.cursor_bg)
                    .fg(p.cursor_fg)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_notepad(&self, f: &mut ratatui::Frame<'_>, area: Rect, p: Palette) {
        let items = if self.notes.is_empty() {
            vec![ListItem::new(Span::styled(
                "(no notes, press a to add)",
                Style::default().fg(p.muted),
            ))]
        } else {
            self.notes
                .iter()
                .enumerate()
                .map(|(idx, text)| ListItem::new(format!("{}. {}", idx + 1, text)))
                .collect()
        };
        let mut state = ListState::default();
        if !self.notes.is_empty() {
            state.select(Some(self.note_idx));
        }
        let list = List::new(items)
            .block(panel(&format!("Notes ({})", self.notes.len()), true, p))
            .highlight_style(
                Style::default()
                    .bg(p.cursor_bg)
                    .fg(p.cursor_fg)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_activities(&self, f: &mut ratatui::Frame<'_>, area: Rect, p: Palette) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(4)])
            .split(area);

        let items = self
            .tracker
            .activities()
            .iter()
            .map(|label| {
                let answer = if label == OTHER_ACTIVITY {
                    Span::styled("(not scored)", Style::default().fg(p.muted))
                } else {
                    match self.tracker.response(label) {
                        Some(Response::Yes) => {
                            Span::styled("Yes", Style::default().fg(Color::LightGreen))
                        }
                        Some(Response::No) => Span::styled("No", Style::default().fg(p.alert)),
                        None => Span::styled("--", Style::default().fg(p.muted)),
                    }
                };
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{:<24}", label)),
                    answer,
                ]))
            })
            .collect::<Vec<_>>();
        let mut state = ListState::default();
        state.select(Some(self.activity_idx));
        let title = format!(
            "Today's Activities ({}/{})",
            self.tracker.activities().len(),
            crate::activity::MAX_ACTIVITIES
        );
        let list = List::new(items).block(panel(&title, true, p)).highlight_style(
            Style::default()
                .bg(p.cursor_bg)
                .fg(p.cursor_fg)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, chunks[0], &mut state);

        let verdict = self
            .evaluation
            .clone()
            .unwrap_or_else(|| "Press e to evaluate the day".into());
        let verdict = Paragraph::new(Span::styled(
            verdict,
            Style::default().fg(p.alert).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(panel("Evaluation", false, p));
        f.render_widget(verdict, chunks[1]);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect, p: Palette) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line(p))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(p.muted)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(p.muted)),
            );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self, p: Palette) -> Line<'static> {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(p.accent));
        let mut spans = vec![
            key("1"),
            Span::raw(" calendar  "),
            key("2"),
            Span::raw(" notepad  "),
            key("3"),
            Span::raw(" activities  "),
            key("t"),
            Span::raw(" theme  "),
        ];
        match self.view {
            ViewMode::Calendar => spans.extend([
                key("←↑↓→ / h j k l"),
                Span::raw(" move  "),
                key("[ ]"),
                Span::raw(" month  "),
                key("Enter"),
                Span::raw(" select  "),
                key("Tab"),
                Span::raw(" events  "),
                key("a"),
                Span::raw(" add  "),
                key("d"),
                Span::raw(" delete  "),
            ]),
            ViewMode::Notepad => spans.extend([
                key("↑↓ / j k"),
                Span::raw(" browse  "),
                key("a"),
                Span::raw(" add  "),
                key("d"),
                Span::raw(" delete  "),
            ]),
            ViewMode::Activities => {
                spans.extend([
                    key("↑↓ / j k"),
                    Span::raw(" browse  "),
                    key("y/n/u"),
                    Span::raw(" answer  "),
                ]);
                if self.tracker.can_add() {
                    spans.extend([key("a"), Span::raw(" add  ")]);
                }
                spans.extend([
                    key("d"),
                    Span::raw(" remove  "),
                    key("e"),
                    Span::raw(" evaluate  "),
                ]);
            }
        }
        spans.extend([
            Span::styled("q", Style::default().fg(p.alert)),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }

    fn draw_input(
        &self,
        f: &mut ratatui::Frame<'_>,
        target: InputTarget,
        field: &FieldValue,
        p: Palette,
    ) {
        let area = centered_rect(60, 20, f.size());
        let body = vec![
            Line::from(Span::styled(
                field.with_caret(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to add • Esc to cancel",
                Style::default().fg(p.muted),
            )),
        ];
        let dialog = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(p.background).fg(p.text))
            .block(panel(target.title(), true, p));
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, target: DeleteTarget, p: Palette) {
        let area = centered_rect(50, 30, f.size());
        let text = match target {
            DeleteTarget::Event { date, index } => self.events.events_on(date).get(index).cloned(),
            DeleteTarget::Note(index) => self.notes.get(index).map(str::to_string),
        }
        .unwrap_or_default();
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", text),
                Style::default().fg(p.alert).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(p.background).fg(p.text))
            .block(
                Block::default()
                    .title(Span::styled(
                        "Confirm Delete",
                        Style::default().fg(p.alert).add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(p.alert)),
            );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn panel(title: &str, focused: bool, p: Palette) -> Block<'static> {
    let color = if focused { p.accent } else { p.muted };
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn prev_boundary(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_boundary(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{load_events, load_notes, NOTES_KEY};
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, codes: &[KeyCode]) {
        for code in codes {
            app.handle_key(key(*code));
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
    }

    fn app_in(dir: &std::path::Path) -> App {
        App::new(
            LocalStorage::new(dir),
            EventStore::default(),
            NoteList::default(),
            ActivityTracker::default(),
            Theme::Dark,
        )
    }

    fn date(year: i32, month: u32, day: u32) -> CalendarDate {
        CalendarDate::new(year, month, day).unwrap()
    }

    #[test]
    fn adding_event_requires_a_selected_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        press(&mut app, &[KeyCode::Char('a')]);
        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.status.contains("Select a day"));
    }

    #[test]
    fn add_and_delete_event_write_through() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        let day = date(2026, 10, 18);
        app.calendar.cursor = day;
        app.calendar.month = Month::containing(day);

        press(&mut app, &[KeyCode::Enter, KeyCode::Char('a')]);
        type_text(&mut app, "dentist");
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.events.has_events(day));
        assert_eq!(load_events(&app.storage).events_on(day), ["dentist"]);
        assert!(app.last_save.is_some());

        press(&mut app, &[KeyCode::Tab, KeyCode::Char('d')]);
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));
        press(&mut app, &[KeyCode::Char('y')]);
        assert!(!app.events.has_events(day));
        assert!(load_events(&app.storage).is_empty());
    }

    #[test]
    fn empty_event_text_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('a'), KeyCode::Enter]);
        assert!(app.events.is_empty());
        assert_eq!(app.status, "Nothing to add");
        assert!(app.last_save.is_none());
    }

    #[test]
    fn cursor_moves_across_month_and_year_edges() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.calendar.cursor = date(2026, 1, 31);
        app.calendar.month = Month::containing(app.calendar.cursor);

        press(&mut app, &[KeyCode::Char(']')]);
        assert_eq!(app.calendar.cursor, date(2026, 2, 28));
        press(&mut app, &[KeyCode::Char('['), KeyCode::Char('[')]);
        assert_eq!(app.calendar.cursor, date(2025, 12, 28));
        assert_eq!(app.calendar.month, Month::new(2025, 12).unwrap());

        app.calendar.cursor = date(2025, 12, 31);
        press(&mut app, &[KeyCode::Right]);
        assert_eq!(app.calendar.cursor, date(2026, 1, 1));
        assert_eq!(app.calendar.month, Month::new(2026, 1).unwrap());
        press(&mut app, &[KeyCode::Up]);
        assert_eq!(app.calendar.cursor, date(2025, 12, 25));
    }

    #[test]
    fn notes_add_and_confirmed_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        press(&mut app, &[KeyCode::Char('2')]);
        for text in ["first", "second"] {
            press(&mut app, &[KeyCode::Char('a')]);
            type_text(&mut app, text);
            press(&mut app, &[KeyCode::Enter]);
        }
        assert_eq!(app.note_idx, 1);

        press(&mut app, &[KeyCode::Char('k'), KeyCode::Char('d'), KeyCode::Esc]);
        assert_eq!(app.notes.len(), 2);
        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('y')]);
        assert_eq!(app.notes.iter().collect::<Vec<_>>(), ["second"]);
        assert_eq!(
            load_notes(&app.storage).iter().collect::<Vec<_>>(),
            ["second"]
        );
    }

    #[test]
    fn input_field_edits_at_caret() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('a')]);
        type_text(&mut app, "caf");
        press(&mut app, &[KeyCode::Home, KeyCode::Delete, KeyCode::End]);
        type_text(&mut app, "é!");
        press(&mut app, &[KeyCode::Backspace, KeyCode::Left]);
        type_text(&mut app, "x");
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.notes.get(0), Some("afxé"));
    }

    #[test]
    fn activities_answer_and_evaluate() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        press(&mut app, &[KeyCode::Char('3'), KeyCode::Char('e')]);
        assert!(app
            .evaluation
            .as_deref()
            .unwrap_or_default()
            .contains("3 responses"));

        press(&mut app, &[
            KeyCode::Char('y'),
            KeyCode::Char('j'),
            KeyCode::Char('y'),
            KeyCode::Char('j'),
            KeyCode::Char('y'),
            KeyCode::Char('e'),
        ]);
        assert_eq!(app.evaluation.as_deref(), Some("Perfect day! You did it all!"));

        press(&mut app, &[KeyCode::Char('n'), KeyCode::Char('e')]);
        assert_eq!(app.evaluation.as_deref(), Some("Very good effort!"));

        // The placeholder takes no answer and cannot be removed.
        press(&mut app, &[KeyCode::Char('j'), KeyCode::Char('y'), KeyCode::Char('d')]);
        assert_eq!(app.tracker.response(OTHER_ACTIVITY), None);
        assert_eq!(app.tracker.activities().len(), 4);
    }

    #[test]
    fn activity_list_stops_at_cap() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        press(&mut app, &[KeyCode::Char('3')]);
        for label in ["Yoga", "Swim"] {
            press(&mut app, &[KeyCode::Char('a')]);
            type_text(&mut app, label);
            press(&mut app, &[KeyCode::Enter]);
        }
        assert!(!app.tracker.can_add());
        press(&mut app, &[KeyCode::Char('a')]);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.status, "Activity limit reached");
        assert_eq!(app.tracker.activities().last().unwrap(), OTHER_ACTIVITY);
    }

    #[test]
    fn removing_every_activity_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        press(&mut app, &[
            KeyCode::Char('3'),
            KeyCode::Char('d'),
            KeyCode::Char('d'),
            KeyCode::Char('d'),
            KeyCode::Char('e'),
        ]);
        assert_eq!(app.tracker.activities(), [OTHER_ACTIVITY]);
        assert_eq!(
            app.evaluation.as_deref(),
            Some("Error 404: Activities not found")
        );
    }

    #[test]
    fn failed_write_keeps_memory_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let mut app = app_in(&blocker.join("data"));
        press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('a')]);
        type_text(&mut app, "keep me");
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.notes.len(), 1);
        assert!(app.status.contains("not saved"));
        assert!(!blocker.join("data").join(format!("{}.json", NOTES_KEY)).exists());
    }

    #[test]
    fn theme_toggles_and_quit_exits() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        press(&mut app, &[KeyCode::Char('t')]);
        assert_eq!(app.theme, Theme::Light);
        press(&mut app, &[KeyCode::Char('t')]);
        assert_eq!(app.theme, Theme::Dark);
        assert!(app.handle_key(key(KeyCode::Char('q'))));
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn every_view_renders() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.events.add_event(Some(app.calendar.cursor), "today");
        app.notes.add_note("a note");
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        for (view, expected) in [('1', "1. today"), ('2', "a note"), ('3', "Gym"), ('t', "Gym")] {
            press(&mut app, &[KeyCode::Char(view), KeyCode::Enter, KeyCode::Char('a')]);
            terminal.draw(|f| app.draw(f)).unwrap();
            press(&mut app, &[KeyCode::Esc]);
            terminal.draw(|f| app.draw(f)).unwrap();
            assert!(screen(&terminal).contains(expected), "view {} lacks {:?}", view, expected);
        }
    }

    #[test]
    fn calendar_marks_days_with_events_and_lists_them() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let marked = format!("{:>2}•", app.calendar.cursor.day());
        terminal.draw(|f| app.draw(f)).unwrap();
        assert!(!screen(&terminal).contains(&marked));
        assert!(screen(&terminal).contains("Press Enter on a day"));

        app.events.add_event(Some(app.calendar.cursor), "dentist");
        press(&mut app, &[KeyCode::Enter]);
        terminal.draw(|f| app.draw(f)).unwrap();
        let shown = screen(&terminal);
        assert!(shown.contains(&marked));
        assert!(shown.contains("1. dentist"));
        assert!(shown.contains(&app.calendar.cursor.to_string()));
    }

    #[test]
    fn activities_view_shows_the_verdict_after_evaluating() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        press(&mut app, &[KeyCode::Char('3')]);
        terminal.draw(|f| app.draw(f)).unwrap();
        assert!(screen(&terminal).contains("Press e to evaluate the day"));
        assert!(screen(&terminal).contains("Gym"));

        press(&mut app, &[KeyCode::Char('e')]);
        terminal.draw(|f| app.draw(f)).unwrap();
        let shown = screen(&terminal);
        assert!(!shown.contains("Press e to evaluate the day"));
        assert!(shown.contains("responses"));
    }

    #[test]
    fn rejected_activity_only_changes_the_status_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        let before = app.tracker.activities().to_vec();
        press(&mut app, &[KeyCode::Char('3'), KeyCode::Char('a')]);
        type_text(&mut app, "Gym");
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.tracker.activities(), before.as_slice());
        assert!(app.status.contains("not added"));
        assert!(matches!(app.mode, Mode::Normal));
    }
}
