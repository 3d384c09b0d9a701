use chrono::Weekday;
use clap::Subcommand;
use timesheet_core::Config;

use super::{day_or_today, open_service, parse_day, print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum NoteAction {
    /// Replace a day's notes
    Set {
        /// Note text (empty clears it)
        text: String,
        /// Day of the week (defaults to today)
        #[arg(long, value_parser = parse_day)]
        day: Option<Weekday>,
    },
    /// Print a day's notes
    Show {
        /// Day of the week (defaults to today)
        #[arg(long, value_parser = parse_day)]
        day: Option<Weekday>,
    },
}

pub fn run(action: NoteAction, ctx: &Context, config: Config) -> CliResult {
    let service = open_service(config)?;
    let mut week = ctx.open_week(&service)?;

    match action {
        NoteAction::Set { text, day } => {
            let event = service.edit_note(&mut week, day_or_today(day), &text)?;
            print_json(&event)?;
        }
        NoteAction::Show { day } => {
            println!("{}", week.day(day_or_today(day)).notes());
        }
    }
    Ok(())
}
