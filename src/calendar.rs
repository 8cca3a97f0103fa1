//! Calendar arithmetic shared by the forecasting engines.
//!
//! Everything here is pure date math: leap-year lengths, fractional and
//! whole-day spans, and the planning-oriented [`YearContext`]. Temporal
//! context is always passed in; nothing in this module reads a clock.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub(crate) const MS_PER_DAY: i64 = 86_400_000;

/// Number of days in a calendar year (leap-aware).
pub fn days_in_year(year: i32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    if leap {
        366
    } else {
        365
    }
}

/// January 1 of the given year.
pub fn start_of_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Midnight on January 1 of the given year.
pub fn start_of_year_dt(year: i32) -> NaiveDateTime {
    start_of_year(year)
        .and_hms_opt(0, 0, 0)
        .unwrap_or(NaiveDateTime::MIN)
}

/// The last representable instant of the year, December 31 23:59:59.999.
pub fn end_of_year_dt(year: i32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Fractional number of days from `from` to `to` (negative when `to` is
/// earlier), at millisecond resolution.
pub fn frac_days_between(from: NaiveDateTime, to: NaiveDateTime) -> Decimal {
    Decimal::from((to - from).num_milliseconds()) / Decimal::from(MS_PER_DAY)
}

/// Whole days from `from` to `to`, floored (toward negative infinity).
pub fn whole_days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_milliseconds().div_euclid(MS_PER_DAY)
}

/// The mid-month sample date (the 15th) used by monthly forecast lines.
pub fn mid_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 15).unwrap_or_else(|| start_of_year(year))
}

/// The last calendar day of the given month.
pub fn month_end(year: i32, month: u32) -> NaiveDate {
    let first_of_next = if month >= 12 {
        start_of_year(year + 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap_or_else(|| start_of_year(year + 1))
    };
    first_of_next.pred_opt().unwrap_or(first_of_next)
}

/// Planning frame for one date within its year.
///
/// `week_of_year` is the simple `ceil(day_of_year / 7)` week number, not an
/// ISO week; `days_left_in_year` counts today as a remaining day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearContext {
    pub today: NaiveDate,

    pub year: i32,

    /// 1..=53.
    pub week_of_year: u32,

    /// 0..=52.
    pub weeks_left_in_year: u32,

    /// 0..=366, inclusive of today.
    pub days_left_in_year: u32,
}

impl YearContext {
    pub fn for_date(today: NaiveDate) -> YearContext {
        let year = today.year();
        let day = today.ordinal();
        let week_of_year = (day + 6) / 7;
        let weeks_left_in_year = 53u32.saturating_sub(week_of_year);
        let days_left_in_year = (start_of_year(year + 1) - today).num_days().max(0) as u32;

        YearContext {
            today,
            year,
            week_of_year,
            weeks_left_in_year,
            days_left_in_year,
        }
    }
}
