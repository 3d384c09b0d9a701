mod day;
mod model;
mod session;
mod task;

pub use day::Day;
pub use model::{Submission, Week, WeekKey, WeekState, DAYS_PER_WEEK};
pub use session::{Session, TaskRef};
pub use task::Task;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// The Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Formats a duration as `HH:MM`, rounding to the nearest minute.
pub fn format_hhmm(duration: Duration) -> String {
    let minutes = (duration.num_seconds() as f64 / 60.0).round() as i64;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Duration in hours, rounded to two decimals.
pub fn decimal_hours(duration: Duration) -> f64 {
    (duration.num_seconds() as f64 / 3600.0 * 100.0).round() / 100.0
}

/// Parses a weekday name such as `mon`, `Tuesday` or `SUN`.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    s.trim().parse::<Weekday>().ok()
}
