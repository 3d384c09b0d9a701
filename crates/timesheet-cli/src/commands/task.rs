use clap::Subcommand;
use serde_json::json;
use timesheet_core::Config;

use super::{open_service, print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Activate a catalogue task for the week
    Add {
        /// Task name as listed by `task catalog`
        name: String,
    },
    /// Remove a task that has no sessions
    Delete {
        /// Task name
        name: String,
    },
    /// List the tasks active in the week
    List,
    /// List the department's task catalogue
    Catalog,
}

pub fn run(action: TaskAction, ctx: &Context, config: Config) -> CliResult {
    let service = open_service(config)?;
    let mut week = ctx.open_week(&service)?;

    match action {
        TaskAction::Add { name } => {
            let event = service.add_task(&mut week, &name)?;
            print_json(&event)?;
        }
        TaskAction::Delete { name } => {
            let event = service.delete_task(&mut week, &name)?;
            print_json(&event)?;
        }
        TaskAction::List => {
            print_json(&week.tasks())?;
        }
        TaskAction::Catalog => {
            let catalog: Vec<_> = service
                .catalog(&week)
                .into_iter()
                .map(|name| {
                    json!({
                        "task": name,
                        "active": week.task(name).is_some(),
                    })
                })
                .collect();
            print_json(&catalog)?;
        }
    }
    Ok(())
}
