mod activity;
mod calendar;
mod cli;
mod commands;
mod config;
mod logging;
mod model;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let session = commands::Session::open(args.config, args.data_dir)?;
    let _logger = session.start_logging();
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Tui => commands::tui(session),
        cli::Command::Calendar { month } => commands::calendar(&session, month),
        cli::Command::Events { date } => commands::events(&session, date),
        cli::Command::AddEvent { date, text } => commands::add_event(&session, date, text),
        cli::Command::DeleteEvent { date, index } => {
            commands::delete_event(&session, date, index)
        }
        cli::Command::Notes => commands::notes(&session),
        cli::Command::AddNote { text } => commands::add_note(&session, text),
        cli::Command::DeleteNote { index } => commands::delete_note(&session, index),
        cli::Command::Evaluate { yes, no } => commands::evaluate(&session, yes, no),
    }
}
