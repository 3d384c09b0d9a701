//! End-to-end behaviour of the week state machine.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc, Weekday};
use proptest::prelude::*;
use timesheet_core::{Event, TaskRef, Week, WeekError, WeekState};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, h, m, 0).unwrap()
}

fn technical_week() -> Week {
    let mut week = Week::new("Jayant Rai", "Technical", monday());
    week.add_task(
        "Software Development",
        "Technical",
        vec!["Coding".into(), "Code Review".into()],
    )
    .unwrap();
    week.add_task("Meeting", "Technical", vec!["Meeting".into()])
        .unwrap();
    week
}

#[test]
fn test_monday_two_sessions_total_seven_hours() {
    let mut week = technical_week();
    let coding = TaskRef::with_subtask("Software Development", "Coding");

    week.start_session_at(Weekday::Mon, coding.clone(), at(1, 9, 0))
        .unwrap();
    week.stop_session_at(Weekday::Mon, at(1, 12, 0)).unwrap();
    week.start_session_at(Weekday::Mon, coding, at(1, 13, 0))
        .unwrap();
    week.stop_session_at(Weekday::Mon, at(1, 17, 0)).unwrap();

    assert_eq!(week.total_for_day(Weekday::Mon), Duration::hours(7));
    assert_eq!(week.total_for_week(), Duration::hours(7));
    assert_eq!(timesheet_core::week::format_hhmm(week.total_for_week()), "07:00");
}

#[test]
fn test_submit_empty_week_locks_it() {
    let mut week = technical_week();
    let submission = week.submit_at(at(5, 18, 0)).unwrap();

    assert_eq!(week.state(), WeekState::Locked);
    assert_eq!(week.total_for_week(), Duration::zero());
    assert_eq!(week.submitted_at(), Some(at(5, 18, 0)));
    match submission.event() {
        Event::WeekSubmitted {
            weekly_total_secs, ..
        } => assert_eq!(weekly_total_secs, 0),
        other => panic!("Expected WeekSubmitted, got {other:?}"),
    }
}

#[test]
fn test_locked_week_rejects_every_command() {
    let mut week = technical_week();
    week.submit_at(at(5, 18, 0)).unwrap();
    let before = week.clone();

    let meeting = TaskRef::new("Meeting");
    assert_eq!(
        week.start_session_at(Weekday::Fri, meeting, at(5, 19, 0))
            .unwrap_err(),
        WeekError::LockedWeek
    );
    assert_eq!(
        week.stop_session_at(Weekday::Fri, at(5, 19, 0)).unwrap_err(),
        WeekError::LockedWeek
    );
    assert_eq!(
        week.edit_note(Weekday::Fri, "late").unwrap_err(),
        WeekError::LockedWeek
    );
    assert_eq!(
        week.add_task("Research", "Technical", vec![]).unwrap_err(),
        WeekError::LockedWeek
    );
    assert_eq!(week.delete_task("Meeting").unwrap_err(), WeekError::LockedWeek);
    assert_eq!(week.submit_at(at(5, 20, 0)).unwrap_err(), WeekError::LockedWeek);

    assert_eq!(week, before);
}

#[test]
fn test_submit_rejected_while_timer_runs() {
    let mut week = technical_week();
    week.start_session_at(Weekday::Thu, TaskRef::new("Meeting"), at(4, 10, 0))
        .unwrap();

    assert_eq!(
        week.submit_at(at(4, 11, 0)).unwrap_err(),
        WeekError::RunningSession { day: Weekday::Thu }
    );
    assert_eq!(week.state(), WeekState::Open);

    week.stop_session_at(Weekday::Thu, at(4, 11, 0)).unwrap();
    week.submit_at(at(4, 11, 5)).unwrap();
    assert_eq!(week.total_for_week(), Duration::hours(1));
}

#[test]
fn test_second_start_on_same_day_is_rejected() {
    let mut week = technical_week();
    week.start_session_at(Weekday::Tue, TaskRef::new("Meeting"), at(2, 9, 0))
        .unwrap();
    let before = week.clone();

    let err = week
        .start_session_at(Weekday::Tue, TaskRef::new("Meeting"), at(2, 9, 30))
        .unwrap_err();
    assert_eq!(err, WeekError::SessionAlreadyRunning { day: Weekday::Tue });
    assert_eq!(week, before);
}

#[test]
fn test_stop_without_running_session() {
    let mut week = technical_week();
    assert_eq!(
        week.stop_session_at(Weekday::Wed, at(3, 9, 0)).unwrap_err(),
        WeekError::NoRunningSession { day: Weekday::Wed }
    );
}

#[test]
fn test_running_session_excluded_from_totals() {
    let mut week = technical_week();
    week.start_session_at(Weekday::Mon, TaskRef::new("Meeting"), at(1, 9, 0))
        .unwrap();
    week.stop_session_at(Weekday::Mon, at(1, 9, 30)).unwrap();
    week.start_session_at(Weekday::Mon, TaskRef::new("Meeting"), at(1, 10, 0))
        .unwrap();

    assert_eq!(week.total_for_day(Weekday::Mon), Duration::minutes(30));
    assert_eq!(
        week.live_total_for_day(Weekday::Mon, at(1, 10, 15)),
        Duration::minutes(45)
    );
    assert_eq!(week.live_total_for_week(at(1, 10, 15)), Duration::minutes(45));
}

#[test]
fn test_totals_are_idempotent() {
    let mut week = technical_week();
    week.start_session_at(Weekday::Sat, TaskRef::new("Meeting"), at(6, 8, 0))
        .unwrap();
    week.stop_session_at(Weekday::Sat, at(6, 8, 40)).unwrap();

    let first = (week.total_for_day(Weekday::Sat), week.total_for_week());
    let second = (week.total_for_day(Weekday::Sat), week.total_for_week());
    assert_eq!(first, second);
}

#[test]
fn test_note_edit_keeps_totals() {
    let mut week = technical_week();
    week.start_session_at(Weekday::Fri, TaskRef::new("Meeting"), at(5, 9, 0))
        .unwrap();
    week.stop_session_at(Weekday::Fri, at(5, 10, 0)).unwrap();

    week.edit_note(Weekday::Fri, "Sprint planning").unwrap();
    week.edit_note(Weekday::Fri, "Sprint planning, retro").unwrap();

    assert_eq!(week.day(Weekday::Fri).notes(), "Sprint planning, retro");
    assert_eq!(week.total_for_week(), Duration::hours(1));
}

#[derive(Debug, Clone)]
struct Booking {
    day: u32,
    start_ms: i64,
    length_ms: i64,
}

fn booking() -> impl Strategy<Value = Booking> {
    (0u32..7, 0i64..36_000_000, 0i64..14_400_000).prop_map(|(day, start_ms, length_ms)| Booking {
        day,
        start_ms,
        length_ms,
    })
}

proptest! {
    #[test]
    fn prop_week_total_is_sum_of_completed_sessions(bookings in prop::collection::vec(booking(), 0..30)) {
        let mut week = technical_week();
        let mut expected = Duration::zero();

        for b in &bookings {
            let weekday = week.days()[b.day as usize].weekday();
            let start = at(1 + b.day, 0, 0) + Duration::milliseconds(b.start_ms);
            let end = start + Duration::milliseconds(b.length_ms);
            week.start_session_at(weekday, TaskRef::new("Meeting"), start).unwrap();
            week.stop_session_at(weekday, end).unwrap();
            expected = expected + (end - start);
        }

        let day_sum = week
            .days()
            .iter()
            .fold(Duration::zero(), |acc, d| acc + d.total());
        prop_assert_eq!(week.total_for_week(), expected);
        prop_assert_eq!(day_sum, expected);
        for day in week.days() {
            let sessions = day
                .sessions()
                .iter()
                .filter_map(|s| s.duration())
                .fold(Duration::zero(), |acc, d| acc + d);
            prop_assert_eq!(day.total(), sessions);
        }
    }
}
