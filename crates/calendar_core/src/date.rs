//! Linear day arithmetic for the fixed 30-day-month campaign calendar.
//!
//! Every date difference and overflow carry routes through [`linear_day`] so
//! that agenda, weather and clock code agree on ordering. The month count is
//! always passed explicitly; no function assumes a 12-month year.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

/// Days in every campaign month.
pub const DAYS_PER_MONTH: u32 = 30;

/// A `(year, month, day)` triple in a campaign calendar.
///
/// Field order gives chronological ordering for a fixed month count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CampaignDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl CampaignDate {
    pub const fn new(year: u32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Check the date against a calendar with `total_months` months.
    pub fn validate(self, total_months: u32) -> Result<Self> {
        if self.year >= 1
            && (1..=total_months).contains(&self.month)
            && (1..=DAYS_PER_MONTH).contains(&self.day)
        {
            Ok(self)
        } else {
            Err(CalendarError::InvalidDate {
                year: self.year,
                month: self.month,
                day: self.day,
                total_months,
            })
        }
    }

    pub fn key(self) -> DateKey {
        DateKey(self)
    }
}

impl fmt::Display for CampaignDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.year, self.month, self.day)
    }
}

/// Absolute day index of `date`, counting from year 1, month 1, day 1.
pub fn linear_day(date: CampaignDate, total_months: u32) -> i64 {
    let year_days = i64::from(total_months) * i64::from(DAYS_PER_MONTH);
    (i64::from(date.year) - 1) * year_days
        + (i64::from(date.month) - 1) * i64::from(DAYS_PER_MONTH)
        + (i64::from(date.day) - 1)
}

/// Inverse of [`linear_day`]. Indices before the epoch have no date.
pub fn from_linear_day(index: i64, total_months: u32) -> Option<CampaignDate> {
    if index < 0 || total_months == 0 {
        return None;
    }
    let month_days = i64::from(DAYS_PER_MONTH);
    let year_days = i64::from(total_months) * month_days;
    let year = u32::try_from(index / year_days + 1).ok()?;
    let within_year = index % year_days;
    Some(CampaignDate {
        year,
        month: (within_year / month_days) as u32 + 1,
        day: (within_year % month_days) as u32 + 1,
    })
}

/// Carry overflowing days into months and overflowing months into years.
///
/// Inputs come from addition, so only overflow is handled. A zero day or
/// month is treated as already normalized. `None` when the carried year no
/// longer fits a `u32`.
pub fn normalize(day: u64, month: u64, year: u64, total_months: u32) -> Option<CampaignDate> {
    let month_days = u64::from(DAYS_PER_MONTH);
    let total_months = u64::from(total_months.max(1));

    let mut month = month;
    let mut day = day;
    if day > month_days {
        month += (day - 1) / month_days;
        day = (day - 1) % month_days + 1;
    }
    let mut year = year;
    if month > total_months {
        year += (month - 1) / total_months;
        month = (month - 1) % total_months + 1;
    }

    Some(CampaignDate {
        year: u32::try_from(year).ok()?,
        month: u32::try_from(month).ok()?,
        day: u32::try_from(day).ok()?,
    })
}

/// Signed number of days from `a` to `b`.
pub fn days_between(a: CampaignDate, b: CampaignDate, total_months: u32) -> i64 {
    linear_day(b, total_months) - linear_day(a, total_months)
}

/// The date `days` after `date`, if it is still representable.
pub fn add_days(date: CampaignDate, days: u32, total_months: u32) -> Option<CampaignDate> {
    normalize(
        u64::from(date.day) + u64::from(days),
        u64::from(date.month),
        u64::from(date.year),
        total_months,
    )
}

/// Persisted weather key: `"{year}-{month}-{day}"` without zero padding.
///
/// The in-memory ordering is chronological; the string form is not, so
/// consumers of the persisted map must parse keys before sorting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(pub CampaignDate);

impl DateKey {
    pub fn date(self) -> CampaignDate {
        self.0
    }
}

impl From<CampaignDate> for DateKey {
    fn from(date: CampaignDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DateKey {
    type Err = CalendarError;

    fn from_str(key: &str) -> Result<Self> {
        let malformed = || CalendarError::MalformedDateKey {
            key: key.to_string(),
        };
        let mut parts = key.splitn(3, '-').map(|part| part.parse::<u32>());
        let (Some(Ok(year)), Some(Ok(month)), Some(Ok(day))) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        Ok(Self(CampaignDate { year, month, day }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn linear_day_counts_from_epoch() {
        assert_eq!(linear_day(CampaignDate::new(1, 1, 1), 12), 0);
        assert_eq!(linear_day(CampaignDate::new(1, 2, 1), 12), 30);
        assert_eq!(linear_day(CampaignDate::new(2, 1, 1), 12), 360);
        assert_eq!(linear_day(CampaignDate::new(2, 1, 1), 10), 300);
    }

    #[test]
    fn normalize_carries_days_and_months() {
        assert_eq!(normalize(31, 1, 1, 12), Some(CampaignDate::new(1, 2, 1)));
        assert_eq!(normalize(30, 12, 1, 12), Some(CampaignDate::new(1, 12, 30)));
        assert_eq!(normalize(31, 12, 1, 12), Some(CampaignDate::new(2, 1, 1)));
        assert_eq!(normalize(95, 9, 3, 10), Some(CampaignDate::new(4, 2, 5)));
    }

    #[test]
    fn normalize_refuses_to_pin_the_last_year() {
        let last = u64::from(u32::MAX);
        assert_eq!(
            normalize(30, 12, last, 12),
            Some(CampaignDate::new(u32::MAX, 12, 30))
        );
        assert_eq!(normalize(31, 12, last, 12), None);
        assert_eq!(add_days(CampaignDate::new(u32::MAX, 12, 30), 1, 12), None);
    }

    #[test]
    fn days_between_crosses_year_boundary() {
        let a = CampaignDate::new(1, 12, 30);
        let b = CampaignDate::new(2, 1, 1);
        assert_eq!(days_between(a, b, 12), 1);
        assert_eq!(days_between(b, a, 12), -1);
    }

    #[test]
    fn from_linear_day_rejects_pre_epoch() {
        assert_eq!(from_linear_day(-1, 12), None);
        assert_eq!(from_linear_day(0, 12), Some(CampaignDate::new(1, 1, 1)));
    }

    #[test]
    fn date_key_round_trips_without_padding() {
        let key = CampaignDate::new(3, 4, 5).key();
        assert_eq!(key.to_string(), "3-4-5");
        assert_eq!("3-4-5".parse::<DateKey>(), Ok(key));
        assert!("3-4".parse::<DateKey>().is_err());
        assert!("3-x-5".parse::<DateKey>().is_err());
    }

    #[test]
    fn date_key_orders_chronologically_unlike_strings() {
        let early = CampaignDate::new(1, 2, 1).key();
        let late = CampaignDate::new(1, 10, 1).key();
        assert!(early < late);
        assert!(early.to_string() > late.to_string());
    }

    #[test]
    fn validate_rejects_out_of_range_components() {
        assert!(CampaignDate::new(1, 10, 30).validate(10).is_ok());
        assert!(CampaignDate::new(1, 11, 1).validate(10).is_err());
        assert!(CampaignDate::new(1, 1, 31).validate(10).is_err());
        assert!(CampaignDate::new(0, 1, 1).validate(10).is_err());
    }

    proptest! {
        #[test]
        fn add_days_matches_linear_offset(
            year in 1u32..500,
            month in 1u32..=13,
            day in 1u32..=30,
            days in 0u32..20_000,
        ) {
            let date = CampaignDate::new(year, month, day);
            let later = add_days(date, days, 13).unwrap();
            prop_assert_eq!(days_between(date, later, 13), i64::from(days));
            prop_assert_eq!(from_linear_day(linear_day(later, 13), 13), Some(later));
        }
    }
}
