use chrono::Weekday;
use clap::Subcommand;
use serde_json::json;
use timesheet_core::{Clock, Config, TaskRef};

use super::{day_or_today, open_service, parse_day, print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start timing a task
    Start {
        /// Task name
        task: String,
        /// Subtask of the task
        #[arg(long)]
        subtask: Option<String>,
        /// Day of the week (defaults to today)
        #[arg(long, value_parser = parse_day)]
        day: Option<Weekday>,
    },
    /// Stop the running timer
    Stop {
        /// Day to stop (defaults to whichever day is running)
        #[arg(long, value_parser = parse_day)]
        day: Option<Weekday>,
    },
    /// Print the running timer as JSON
    Status,
}

pub fn run(action: TimerAction, ctx: &Context, config: Config) -> CliResult {
    let service = open_service(config)?;
    let mut week = ctx.open_week(&service)?;

    match action {
        TimerAction::Start { task, subtask, day } => {
            let task = match subtask {
                Some(subtask) => TaskRef::with_subtask(task, subtask),
                None => TaskRef::new(task),
            };
            let events = service.start_timer(&mut week, day_or_today(day), task)?;
            for event in &events {
                print_json(event)?;
            }
        }
        TimerAction::Stop { day } => {
            let event = match day {
                Some(day) => service.stop_timer(&mut week, day)?,
                None => service.stop_running(&mut week)?,
            };
            print_json(&event)?;
        }
        TimerAction::Status => {
            let now = service.clock().now();
            let status = match week.running_session() {
                Some((day, session)) => json!({
                    "running": true,
                    "day": day,
                    "task": session.task,
                    "started_at": session.start,
                    "elapsed_secs": session.elapsed_at(now).num_seconds(),
                }),
                None => json!({ "running": false }),
            };
            print_json(&status)?;
        }
    }
    Ok(())
}
