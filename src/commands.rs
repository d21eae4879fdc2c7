use crate::activity::{ActivityTracker, Response};
use crate::calendar::{CalendarDate, Month, WEEKDAY_HEADERS};
use crate::config::{default_config_path, load_config, Config};
use crate::logging::init_logging;
use crate::model::EventStore;
use crate::storage::{
    default_data_dir, load_events, load_notes, save_events, save_notes, LocalStorage,
};
use crate::ui;
use anyhow::{bail, Context, Result};
use flexi_logger::LoggerHandle;
use log::info;
use std::path::PathBuf;

/// Resolved configuration and storage location for one run.
pub struct Session {
    pub config: Config,
    pub storage: LocalStorage,
}

impl Session {
    pub fn open(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => default_config_path()?,
        };
        let config = load_config(&config_path)?;
        let dir = match data_dir.or_else(|| config.data_dir.clone()) {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        Ok(Session {
            config,
            storage: LocalStorage::new(dir),
        })
    }

    /// Logging is best effort; the app runs without it.
    pub fn start_logging(&self) -> Option<LoggerHandle> {
        let log_dir = self.storage.dir().join("logs");
        match init_logging(&self.config.log_level, &log_dir) {
            Ok(handle) => {
                info!(
                    "daypad {} starting, data dir {}",
                    env!("CARGO_PKG_VERSION"),
                    self.storage.dir().display()
                );
                Some(handle)
            }
            Err(err) => {
                eprintln!("warning: logging disabled: {:#}", err);
                None
            }
        }
    }
}

pub fn tui(session: Session) -> Result<()> {
    let events = load_events(&session.storage);
    let notes = load_notes(&session.storage);
    let tracker = ActivityTracker::new(&session.config.activities);
    ui::run(ui::App::new(
        session.storage,
        events,
        notes,
        tracker,
        session.config.theme,
    ))
}

pub fn calendar(session: &Session, month: Option<String>) -> Result<()> {
    let month = match month {
        Some(raw) => Month::parse(&raw)?,
        None => Month::current(),
    };
    let events = load_events(&session.storage);
    for line in month_lines(month, &events) {
        println!("{}", line);
    }
    Ok(())
}

pub fn events(session: &Session, date: Option<String>) -> Result<()> {
    let events = load_events(&session.storage);
    if let Some(raw) = date {
        let date = CalendarDate::parse_iso(&raw)?;
        println!("{}", date);
        print_numbered(events.events_on(date).iter().map(String::as_str));
        return Ok(());
    }
    if events.is_empty() {
        println!("(no events)");
    }
    for (date, day_events) in events.days() {
        println!("{}", date);
        print_numbered(day_events.iter().map(String::as_str));
    }
    Ok(())
}

pub fn add_event(session: &Session, date: String, text: String) -> Result<()> {
    let date = CalendarDate::parse_iso(&date)?;
    let mut events = load_events(&session.storage);
    if !events.add_event(Some(date), &text) {
        bail!("event text cannot be empty");
    }
    save_events(&session.storage, &events)?;
    info!("added event on {}", date.key());
    println!("Added event to {}", date);
    Ok(())
}

pub fn delete_event(session: &Session, date: String, index: usize) -> Result<()> {
    let date = CalendarDate::parse_iso(&date)?;
    let mut events = load_events(&session.storage);
    let deleted = index
        .checked_sub(1)
        .map(|idx| events.delete_event(date, idx))
        .unwrap_or(false);
    if !deleted {
        bail!("no event {} on {}", index, date);
    }
    save_events(&session.storage, &events)?;
    info!("deleted event {} on {}", index, date.key());
    println!("Deleted event {} from {}", index, date);
    Ok(())
}

pub fn notes(session: &Session) -> Result<()> {
    let notes = load_notes(&session.storage);
    if notes.is_empty() {
        println!("(no notes)");
    }
    print_numbered(notes.iter());
    Ok(())
}

pub fn add_note(session: &Session, text: String) -> Result<()> {
    let mut notes = load_notes(&session.storage);
    if !notes.add_note(&text) {
        bail!("note text cannot be empty");
    }
    save_notes(&session.storage, &notes)?;
    info!("added note, {} total", notes.len());
    println!("Added note {}", notes.len());
    Ok(())
}

pub fn delete_note(session: &Session, index: usize) -> Result<()> {
    let mut notes = load_notes(&session.storage);
    let deleted = index
        .checked_sub(1)
        .map(|idx| notes.delete_note(idx))
        .unwrap_or(false);
    if !deleted {
        bail!("no note {}", index);
    }
    save_notes(&session.storage, &notes).context("saving notes")?;
    info!("deleted note {}", index);
    println!("Deleted note {}", index);
    Ok(())
}

pub fn evaluate(session: &Session, yes: Vec<String>, no: Vec<String>) -> Result<()> {
    let mut tracker = ActivityTracker::new(&session.config.activities);
    let answers = yes
        .iter()
        .map(|label| (label, Response::Yes))
        .chain(no.iter().map(|label| (label, Response::No)));
    for (label, value) in answers {
        let label = label.trim();
        tracker.add_activity(label);
        if !tracker.set_response(label, value) {
            eprintln!("ignoring answer for {:?}: not an activity slot", label);
        }
    }
    for label in tracker.activities() {
        let answer = tracker
            .response(label)
            .map(|r| r.label())
            .unwrap_or("-");
        println!("  {:<20} {}", label, answer);
    }
    match tracker.evaluate() {
        Ok(verdict) => println!("{}", verdict),
        Err(err) => println!("{}", err),
    }
    Ok(())
}

/// Text rendering of a month grid; `*` follows days that have events.
pub fn month_lines(month: Month, events: &EventStore) -> Vec<String> {
    let mut lines = vec![
        month.title(),
        WEEKDAY_HEADERS
            .iter()
            .map(|h| format!("{:>4}", h))
            .collect::<String>(),
    ];
    for week in month.grid().chunks(7) {
        let row = week
            .iter()
            .map(|cell| match cell {
                Some(date) if events.has_events(*date) => format!("{:>3}*", date.day()),
                Some(date) => format!("{:>3} ", date.day()),
                None => "    ".to_string(),
            })
            .collect::<String>();
        lines.push(row.trim_end().to_string());
    }
    lines
}

fn print_numbered<'a>(items: impl Iterator<Item = &'a str>) {
    for (idx, item) in items.enumerate() {
        println!("  {}. {}", idx + 1, item);
    }
}
