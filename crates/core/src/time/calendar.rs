use anyhow::Context;
use chrono::{Datelike, Duration, NaiveDate};

/// First day of the calendar month following `date`.
pub fn next_month_start(date: NaiveDate) -> anyhow::Result<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("no month follows {date}"))
}

pub fn add_days(date: NaiveDate, days: i64) -> anyhow::Result<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
        .with_context(|| format!("date overflow adding {days} days to {date}"))
}
