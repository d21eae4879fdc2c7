use chrono::{Datelike, Local, Months, NaiveDate};
use std::fmt;

pub const WEEKDAY_HEADERS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const KEY_FORMAT: &str = "%a %b %d %Y";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DateKeyError {
    #[error("invalid date (use YYYY-MM-DD): {0}")]
    Date(String),
    #[error("invalid month (use YYYY-MM): {0}")]
    Month(String),
}

/// A day on the Gregorian calendar, compared by year/month/day only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(CalendarDate)
    }

    pub fn today() -> Self {
        CalendarDate(Local::now().date_naive())
    }

    /// Parses the `YYYY-MM-DD` form accepted on the command line.
    pub fn parse_iso(input: &str) -> Result<Self, DateKeyError> {
        NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
            .map(CalendarDate)
            .map_err(|_| DateKeyError::Date(input.to_string()))
    }

    /// Storage key, e.g. `Sun Oct 18 2026`.
    pub fn key(&self) -> String {
        self.0.format(KEY_FORMAT).to_string()
    }

    pub fn from_key(key: &str) -> Option<Self> {
        NaiveDate::parse_from_str(key.trim(), KEY_FORMAT)
            .ok()
            .map(CalendarDate)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Moves by whole days; `None` only past chrono's supported range.
    pub fn offset_days(&self, days: i64) -> Option<Self> {
        self.0
            .checked_add_signed(chrono::Duration::days(days))
            .map(CalendarDate)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// A calendar month, held as its first day so it is always a real month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    first: NaiveDate,
}

impl Month {
    /// `None` for a month outside 1..=12 or outside chrono's range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Month { first })
    }

    pub fn containing(date: CalendarDate) -> Self {
        Month {
            first: date.0.with_day(1).unwrap_or(date.0),
        }
    }

    pub fn current() -> Self {
        Month::containing(CalendarDate::today())
    }

    pub fn parse(input: &str) -> Result<Self, DateKeyError> {
        let err = || DateKeyError::Month(input.to_string());
        let (year, month) = input.trim().split_once('-').ok_or_else(err)?;
        let year = year.parse::<i32>().map_err(|_| err())?;
        let month = month.parse::<u32>().map_err(|_| err())?;
        Month::new(year, month).ok_or_else(err)
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn prev(&self) -> Self {
        self.first
            .checked_sub_months(Months::new(1))
            .map(|first| Month { first })
            .unwrap_or(*self)
    }

    pub fn next(&self) -> Self {
        self.first
            .checked_add_months(Months::new(1))
            .map(|first| Month { first })
            .unwrap_or(*self)
    }

    pub fn first_day(&self) -> CalendarDate {
        CalendarDate(self.first)
    }

    pub fn day(&self, day: u32) -> Option<CalendarDate> {
        self.first.with_day(day).map(CalendarDate)
    }

    pub fn days_in_month(&self) -> u32 {
        self.next()
            .first
            .pred_opt()
            .filter(|last| last.month() == self.month())
            .map(|last| last.day())
            .unwrap_or(31)
    }

    /// Weekday column of the 1st, counting from Sunday.
    pub fn leading_blanks(&self) -> usize {
        self.first.weekday().num_days_from_sunday() as usize
    }

    /// One cell per grid slot: blanks up to the 1st's weekday column, then every day.
    pub fn grid(&self) -> Vec<Option<CalendarDate>> {
        let blanks = self.leading_blanks();
        let mut cells = Vec::with_capacity(blanks + self.days_in_month() as usize);
        cells.extend(std::iter::repeat(None).take(blanks));
        cells.extend((1..=self.days_in_month()).map(|d| self.day(d)));
        cells
    }

    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}
