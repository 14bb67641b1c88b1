//! Calendar dates, reporting windows and month grids.
//!
//! Months are zero-based (`0` = January) throughout this module, and weekday
//! indices count from Sunday (`0`) to Saturday (`6`).

mod weekday_mask;

pub use weekday_mask::{WeekdayMask, DAY_LABELS};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ─── CalendarDate ─────────────────────────────────────────────────────────────

/// Years a `CalendarDate` may carry: the span where every day has a
/// four-digit `YYYY-MM-DD` form.
pub const MIN_YEAR: i32 = 0;
pub const MAX_YEAR: i32 = 9999;

/// A real day of the proleptic Gregorian calendar in `MIN_YEAR..=MAX_YEAR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date: {0:?} (expected YYYY-MM-DD)")]
pub struct InvalidDate(pub String);

impl CalendarDate {
    /// `None` unless (year, month0, day) names a day that exists.
    pub fn new(year: i32, month0: u32, day: u32) -> Option<Self> {
        if month0 > 11 || !(MIN_YEAR..=MAX_YEAR).contains(&year) { return None; }
        NaiveDate::from_ymd_opt(year, month0 + 1, day).map(Self)
    }

    fn from_naive(date: NaiveDate) -> Option<Self> {
        (MIN_YEAR..=MAX_YEAR).contains(&date.year()).then_some(Self(date))
    }

    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    pub fn year(self)   -> i32 { self.0.year() }
    pub fn month0(self) -> u32 { self.0.month0() }
    pub fn day(self)    -> u32 { self.0.day() }

    /// 0 = Sunday … 6 = Saturday, independent of any locale's week start.
    pub fn weekday_from_sunday(self) -> u32 {
        self.0.weekday().num_days_from_sunday()
    }

    /// `None` when the result leaves the supported years.
    pub fn add_days(self, days: i64) -> Option<Self> {
        let step = Days::new(days.unsigned_abs());
        let shifted = if days >= 0 {
            self.0.checked_add_days(step)
        } else {
            self.0.checked_sub_days(step)
        }?;
        Self::from_naive(shifted)
    }

    pub fn first_of_month(self) -> Self {
        Self(self.0 - Days::new(u64::from(self.day() - 1)))
    }

    pub fn last_of_month(self) -> Self {
        let last = days_in_month(self.year(), self.month0());
        // stays inside the month, so inside the supported years
        Self(self.0 + Days::new(u64::from(last - self.day())))
    }
}

// ─── Formatting & parsing ─────────────────────────────────────────────────────

pub fn format(date: CalendarDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month0() + 1, date.day())
}

pub fn parse(text: &str) -> Result<CalendarDate, InvalidDate> {
    let invalid = || InvalidDate(text.to_owned());
    let b = text.as_bytes();
    let shape_ok = b.len() == 10
        && b[4] == b'-' && b[7] == b'-'
        && b.iter().enumerate().all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shape_ok { return Err(invalid()); }

    let year:  i32 = text[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = text[5..7].parse().map_err(|_| invalid())?;
    let day:   u32 = text[8..10].parse().map_err(|_| invalid())?;

    // from_ymd_opt rejects days the month doesn't have; the round-trip check
    // guards against any normalisation.
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    if date.year() != year || date.month() != month || date.day() != day {
        return Err(invalid());
    }
    Ok(CalendarDate(date))
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(*self))
    }
}

impl FromStr for CalendarDate {
    type Err = InvalidDate;
    fn from_str(s: &str) -> Result<Self, Self::Err> { parse(s) }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(*self))
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ─── Ranges ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range start {from} is after its end {to}")]
    Reversed { from: CalendarDate, to: CalendarDate },
    #[error(transparent)]
    Date(#[from] InvalidDate),
}

/// Inclusive span of days, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: CalendarDate,
    to:   CalendarDate,
}

impl DateRange {
    pub fn new(from: CalendarDate, to: CalendarDate) -> Result<Self, RangeError> {
        if from > to {
            return Err(RangeError::Reversed { from, to });
        }
        Ok(Self { from, to })
    }

    /// Range typed in by a user as two `YYYY-MM-DD` strings.
    pub fn parse(from: &str, to: &str) -> Result<Self, RangeError> {
        Self::new(parse(from)?, parse(to)?)
    }

    pub fn from(&self) -> CalendarDate { self.from }
    pub fn to(&self)   -> CalendarDate { self.to }

    pub fn num_days(&self) -> i64 {
        (self.to.0 - self.from.0).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.from, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub range:    DateRange,
    pub last_day: u32,
}

/// Monday-to-Sunday week containing `reference`. The two weeks that straddle
/// `MIN_YEAR`/`MAX_YEAR` are cut at the first/last supported day.
pub fn current_week_range(reference: CalendarDate) -> DateRange {
    let offset = i64::from((reference.weekday_from_sunday() + 6) % 7);
    let from = reference.add_days(-offset).unwrap_or(reference.first_of_month());
    let to   = reference.add_days(6 - offset).unwrap_or(reference.last_of_month());
    DateRange { from, to }
}

pub fn current_month_range(reference: CalendarDate) -> MonthRange {
    let from = reference.first_of_month();
    let to   = reference.last_of_month();
    MonthRange { range: DateRange { from, to }, last_day: to.day() }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Length of a month, zero-based.
pub fn days_in_month(year: i32, month0: u32) -> u32 {
    match month0 {
        1 if is_leap_year(year) => 29,
        1 => 28,
        3 | 5 | 8 | 10 => 30,
        _ => 31,
    }
}

/// Month range for a year and zero-based month; `None` for a month outside 0..=11.
pub fn month_range(year: i32, month0: u32) -> Option<MonthRange> {
    CalendarDate::new(year, month0, 1).map(current_month_range)
}

// ─── Month grid ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthGridCell {
    Blank,
    Day(CalendarDate),
}

/// Leading blanks up to the weekday of the 1st (Sunday-first), then every day
/// of the month. Trailing padding of the last week is left to the renderer.
pub fn month_grid(year: i32, month0: u32) -> Vec<MonthGridCell> {
    let Some(month) = month_range(year, month0) else { return Vec::new(); };
    let first = month.range.from();
    let lead  = first.weekday_from_sunday() as usize;

    let mut cells = Vec::with_capacity(lead + month.last_day as usize);
    cells.extend(std::iter::repeat(MonthGridCell::Blank).take(lead));
    cells.extend((1..=month.last_day)
        .filter_map(|day| CalendarDate::new(first.year(), first.month0(), day))
        .map(MonthGridCell::Day));
    cells
}
