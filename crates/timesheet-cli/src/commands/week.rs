use clap::Subcommand;
use serde_json::json;
use timesheet_core::week::format_hhmm;
use timesheet_core::{Clock, Config};

use super::{open_service, print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum WeekAction {
    /// Print the week snapshot as JSON
    Show,
    /// Print day and week totals as HH:MM
    Totals,
    /// List the employee's stored weeks
    List,
}

pub fn run(action: WeekAction, ctx: &Context, config: Config) -> CliResult {
    let service = open_service(config)?;
    match action {
        WeekAction::Show => {
            let week = ctx.open_week(&service)?;
            print_json(&service.snapshot(&week))?;
        }
        WeekAction::Totals => {
            let week = ctx.open_week(&service)?;
            let now = service.clock().now();
            for day in week.days() {
                let running = if day.running().is_some() { " (running)" } else { "" };
                println!(
                    "{} {}  {}{running}",
                    day.weekday(),
                    day.date(),
                    format_hhmm(day.live_total(now))
                );
            }
            println!("Total          {}", format_hhmm(week.live_total_for_week(now)));
        }
        WeekAction::List => {
            let keys = service.weeks_of(ctx.employee()?)?;
            let weeks: Vec<_> = keys
                .iter()
                .map(|k| json!({ "employee": k.employee, "week_start": k.week_start }))
                .collect();
            print_json(&weeks)?;
        }
    }
    Ok(())
}
