//! Calendar helpers

use jiff::{
    ToSpan,
    civil::{Date, Weekday},
};

/// English name of a weekday, as stored in zone and collection point schedules.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

/// Whether a schedule lists the weekday of `date`, ignoring case.
pub fn schedule_includes(days: &[String], date: Date) -> bool {
    let name = weekday_name(date.weekday());

    days.iter().any(|day| day.trim().eq_ignore_ascii_case(name))
}

/// Whether `date` falls on or after tomorrow.
pub fn is_after_today(date: Date, today: Date) -> bool {
    date > today
}

/// Dates from tomorrow onwards, `horizon` days long.
pub fn upcoming(today: Date, horizon: usize) -> impl Iterator<Item = Date> {
    today.series(1.day()).skip(1).take(horizon)
}
