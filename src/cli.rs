use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "daypad",
    version,
    about = "Terminal calendar, notepad and daily activity check-in"
)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding myEvents.json and myNotes.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the interactive TUI
    Tui,
    /// Print a month grid; days with events are marked with *
    Calendar {
        /// Month in YYYY-MM format (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// List events
    Events {
        /// Only show this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Add an event to a day
    AddEvent {
        /// Day in YYYY-MM-DD format
        date: String,
        /// Event description
        text: String,
    },
    /// Delete an event by its position in `events --date` (1-based)
    DeleteEvent {
        /// Day in YYYY-MM-DD format
        date: String,
        /// Position of the event, starting at 1
        index: usize,
    },
    /// List notes
    Notes,
    /// Append a note
    AddNote {
        /// Note text
        text: String,
    },
    /// Delete a note by its position in `notes` (1-based)
    DeleteNote {
        /// Position of the note, starting at 1
        index: usize,
    },
    /// Score today's activities
    Evaluate {
        /// Activity done today (repeatable)
        #[arg(long = "yes", short = 'y')]
        yes: Vec<String>,
        /// Activity skipped today (repeatable)
        #[arg(long = "no", short = 'n')]
        no: Vec<String>,
    },
}
