use clap::Subcommand;
use serde_json::json;
use timesheet_core::{Config, Directory};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum EmployeeAction {
    /// List employees with their departments
    List,
    /// Show an employee's department and task catalogue
    Show {
        /// Employee name
        name: String,
    },
}

pub fn run(action: EmployeeAction, config: Config) -> CliResult {
    let directory = Directory::from_config(&config)?;
    match action {
        EmployeeAction::List => {
            let employees: Vec<_> = directory
                .employees()
                .map(|name| {
                    json!({
                        "name": name,
                        "department": directory.department_of(name),
                    })
                })
                .collect();
            print_json(&employees)?;
        }
        EmployeeAction::Show { name } => {
            let department = directory
                .department_of(&name)
                .ok_or_else(|| format!("unknown employee: {name}"))?;
            let tasks: serde_json::Map<_, _> = directory
                .tasks_for(department)
                .into_iter()
                .map(|task| {
                    let subtasks = directory.subtasks_for(department, task).unwrap_or_default();
                    (task.to_string(), json!(subtasks))
                })
                .collect();
            print_json(&json!({
                "name": name,
                "department": department,
                "tasks": tasks,
            }))?;
        }
    }
    Ok(())
}
