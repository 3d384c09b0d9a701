pub mod config;
pub mod employee;
pub mod note;
pub mod submit;
pub mod task;
pub mod timer;
pub mod week;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use timesheet_core::{Clock, Config, Directory, JsonFileStore, SystemClock, TimesheetService, Week};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Service = TimesheetService<JsonFileStore, SystemClock>;

/// Global selection shared by week-scoped commands.
pub struct Context {
    pub employee: Option<String>,
    pub week: Option<NaiveDate>,
}

impl Context {
    pub fn employee(&self) -> Result<&str, Box<dyn std::error::Error>> {
        self.employee
            .as_deref()
            .ok_or_else(|| "no employee selected (pass --employee <name>)".into())
    }

    /// The selected week, created on first use.
    pub fn open_week(&self, service: &Service) -> Result<Week, Box<dyn std::error::Error>> {
        let date = self.week.unwrap_or_else(|| service.clock().today());
        let (week, _) = service.open_week(self.employee()?, date)?;
        Ok(week)
    }
}

pub fn open_service(config: Config) -> Result<Service, Box<dyn std::error::Error>> {
    let store = JsonFileStore::new(config.data_file_path()?);
    let directory = Directory::from_config(&config)?;
    Ok(TimesheetService::new(store, directory, config, SystemClock))
}

/// Clap value parser for `--day`.
pub fn parse_day(s: &str) -> Result<Weekday, String> {
    timesheet_core::week::parse_weekday(s).ok_or_else(|| format!("invalid day: {s}"))
}

/// `day`, or today's weekday.
pub fn day_or_today(day: Option<Weekday>) -> Weekday {
    day.unwrap_or_else(|| SystemClock.today().weekday())
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
