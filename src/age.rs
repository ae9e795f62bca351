//! age.rs
//!
//! Calendar arithmetic used by the aggregator and the fact sheet.
//!
//! Two things live here:
//!     • `years_before`: the instant N *calendar* years before another instant,
//!       i.e. the year field is decremented and everything else kept. This is
//!       not a 365-day window, so leap days shift the effective span by a day.
//!     • `age_string`: a human "X years, Y months, Z days" between two dates,
//!       used to describe how long an account has existed.
//!
//! Chrono does not provide a built-in year/month/day diff, so we implement the
//! calendar-aware borrowing rules manually.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// The same wall-clock instant `years` calendar years earlier.
///
/// Feb 29 has no counterpart in a non-leap target year; the date rolls over
/// to Mar 1, the same way date overflow normalises elsewhere.
pub fn years_before(instant: DateTime<Utc>, years: i32) -> DateTime<Utc> {
    let target_year = instant.year() - years;
    let date = NaiveDate::from_ymd_opt(target_year, instant.month(), instant.day())
        .or_else(|| NaiveDate::from_ymd_opt(target_year, 3, 1))
        .unwrap_or(NaiveDate::MIN);

    date.and_time(instant.time()).and_utc()
}

/// Returns a human age as a string
pub fn age_string(since: NaiveDate, today: NaiveDate) -> String {
    let mut years = today.year() - since.year();
    let mut months = today.month() as i32 - since.month() as i32;
    let mut days = today.day() as i32 - since.day() as i32;

    // Borrow from the previous month
    if days < 0 {
        months -= 1;

        let (prev_year, prev_month) = if today.month() == 1 {
            (today.year() - 1, 12)
        } else {
            (today.year(), today.month() - 1)
        };

        days += days_in_month(prev_year, prev_month) as i32;
    }

    if months < 0 {
        years -= 1;
        months += 12;
    }

    // Dates in the future read as a zero age rather than a negative one.
    if years < 0 {
        return "0 years, 0 months, 0 days".to_string();
    }

    format!(
        "{} year{}, {} month{}, {} day{}",
        years,
        plural(years),
        months,
        plural(months),
        days,
        plural(days)
    )
}

fn plural(n: i32) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// Gregorian: every 4th year, except centuries, except every 4th century.
fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
