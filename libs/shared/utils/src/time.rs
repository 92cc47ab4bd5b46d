use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};

/// Parse a wall-clock "HH:MM" string into minutes since midnight.
///
/// No timezone handling: the string is treated as local wall-clock time,
/// which is also how schedules and appointment times are persisted.
pub fn parse_time(time: &str) -> Result<i32> {
    let parsed = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|e| anyhow!("Invalid time {:?}: {}", time, e))?;
    Ok(parsed.hour() as i32 * 60 + parsed.minute() as i32)
}

/// Format minutes since midnight back to a zero-padded 24-hour "HH:MM".
pub fn format_time(minutes: i32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// The weekly-schedule key for a date: plain English day names, matching
/// the `dayOfWeek` values stored on each professional's schedule.
pub fn weekday_key(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Sun => "sunday",
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
    }
}

/// Format a date as "DD/MM/YYYY".
///
/// This exact format is embedded verbatim inside the appointment `hora`
/// field and used for string-prefix queries against it. Changing the
/// zero-padding or separator is a data migration, not a refactor.
pub fn format_date_key(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Parse a "DD/MM/YYYY" date key back into a date.
pub fn parse_date_key(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(key, "%d/%m/%Y")
        .map_err(|e| anyhow!("Invalid date key {:?}: {}", key, e))
}
