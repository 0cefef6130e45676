//! Session arithmetic. Business days skip weekends only; there is no
//! holiday calendar, so a holiday effective date simply finds no bar.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Next Monday–Friday strictly after `date`.
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let step = match date.weekday() {
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        _ => 1,
    };
    date.checked_add_days(Days::new(step)).unwrap_or(NaiveDate::MAX)
}

/// Trading date a publication is attributed to. Published after the
/// session close, it counts toward the next business day.
pub fn effective_date(published: NaiveDateTime, session_close: NaiveTime) -> NaiveDate {
    if published.time() > session_close {
        next_business_day(published.date())
    } else {
        published.date()
    }
}
