//! Calendar helpers: month keys, bill recurrence, birthdays.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TrackerError;
use crate::kinds::Recurrence;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Build a month key, returning `None` for an out-of-range month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Month containing the given date.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    /// Whether `date` falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| TrackerError::invalid_month(s))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(TrackerError::invalid_month(s));
        }
        let year: i32 = year.parse().map_err(|_| TrackerError::invalid_month(s))?;
        let month: u32 = month.parse().map_err(|_| TrackerError::invalid_month(s))?;
        Self::new(year, month).ok_or_else(|| TrackerError::invalid_month(s))
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Recurrence {
    /// Next due date after `due`, or `None` for one-off bills.
    ///
    /// `anchor_day` is the day of month the schedule was set up on. Monthly
    /// and yearly steps land on it, clamped to the end of shorter months:
    /// a bill anchored on the 31st goes Jan 31 → Feb 29 → Mar 31.
    pub fn next_due(&self, due: NaiveDate, anchor_day: u32) -> Option<NaiveDate> {
        let months = match self {
            Self::None => return None,
            Self::Weekly => return due.checked_add_days(Days::new(7)),
            Self::Monthly => 1,
            Self::Yearly => 12,
        };
        let target = MonthKey::of(due.with_day(1)?.checked_add_months(Months::new(months))?);
        let day = anchor_day.clamp(1, target.last_day().day());
        NaiveDate::from_ymd_opt(target.year(), target.month(), day)
    }
}

/// Next occurrence of a birthday on or after `today`.
///
/// Feb 29 birthdays are celebrated on Feb 28 in non-leap years.
pub fn next_birthday(birthday: NaiveDate, today: NaiveDate) -> NaiveDate {
    let this_year = anniversary_in(birthday, today.year());
    if this_year >= today {
        this_year
    } else {
        anniversary_in(birthday, today.year() + 1)
    }
}

/// Days from `today` until the next birthday (0 when it is today).
pub fn days_until_birthday(birthday: NaiveDate, today: NaiveDate) -> i64 {
    (next_birthday(birthday, today) - today).num_days()
}

fn anniversary_in(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_key_parses_and_formats() {
        let key: MonthKey = "2024-02".parse().unwrap();
        assert_eq!(key.to_string(), "2024-02");
        assert_eq!(key.first_day(), d(2024, 2, 1));
        assert_eq!(key.last_day(), d(2024, 2, 29));
    }

    #[test]
    fn month_key_rejects_garbage() {
        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("2024-1".parse::<MonthKey>().is_err());
        assert!("202402".parse::<MonthKey>().is_err());
        assert!("abcd-ef".parse::<MonthKey>().is_err());
    }

    #[test]
    fn month_key_wraps_years() {
        let dec = MonthKey::new(2023, 12).unwrap();
        assert_eq!(dec.next(), MonthKey::new(2024, 1).unwrap());
        assert_eq!(MonthKey::new(2024, 1).unwrap().prev(), dec);
        assert_eq!(dec.last_day(), d(2023, 12, 31));
    }

    #[test]
    fn recurrence_steps() {
        assert_eq!(Recurrence::None.next_due(d(2024, 1, 31), 31), None);
        assert_eq!(Recurrence::Weekly.next_due(d(2024, 1, 29), 29), Some(d(2024, 2, 5)));
        assert_eq!(Recurrence::Monthly.next_due(d(2024, 1, 31), 31), Some(d(2024, 2, 29)));
        assert_eq!(Recurrence::Yearly.next_due(d(2024, 2, 29), 29), Some(d(2025, 2, 28)));
    }

    #[test]
    fn monthly_chain_returns_to_anchor_day() {
        let mut due = d(2024, 1, 31);
        let mut seen = Vec::new();
        for _ in 0..4 {
            due = Recurrence::Monthly.next_due(due, 31).unwrap();
            seen.push(due);
        }
        assert_eq!(
            seen,
            vec![d(2024, 2, 29), d(2024, 3, 31), d(2024, 4, 30), d(2024, 5, 31)]
        );
    }

    #[test]
    fn yearly_leap_day_comes_back() {
        let mut due = d(2024, 2, 29);
        for _ in 0..4 {
            due = Recurrence::Yearly.next_due(due, 29).unwrap();
        }
        assert_eq!(due, d(2028, 2, 29));
    }

    #[test]
    fn monthly_wraps_year() {
        assert_eq!(Recurrence::Monthly.next_due(d(2024, 12, 15), 15), Some(d(2025, 1, 15)));
    }

    #[test]
    fn birthday_later_this_year() {
        let today = d(2024, 3, 10);
        assert_eq!(next_birthday(d(1990, 5, 1), today), d(2024, 5, 1));
        assert_eq!(days_until_birthday(d(1990, 3, 10), today), 0);
    }

    #[test]
    fn birthday_already_passed_rolls_to_next_year() {
        let today = d(2024, 12, 30);
        assert_eq!(next_birthday(d(1985, 1, 2), today), d(2025, 1, 2));
        assert_eq!(days_until_birthday(d(1985, 1, 2), today), 3);
    }

    #[test]
    fn leap_day_birthday_in_common_year() {
        assert_eq!(next_birthday(d(2000, 2, 29), d(2023, 1, 1)), d(2023, 2, 28));
        assert_eq!(next_birthday(d(2000, 2, 29), d(2024, 1, 1)), d(2024, 2, 29));
    }
}
