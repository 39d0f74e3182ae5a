//! Timezone-naive wall-clock readings with overflow-normalizing adjustment.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::field::days_in_month;

/// A wall-clock reading: the year/month/day/hour/minute/second tuple as
/// displayed under some timezone, independent of any absolute instant.
///
/// A `WallDate` used purely as a search seed may hold a day that does not
/// exist in its month (receding through April carries a day-31 reset); such a
/// value is only ever compared against the per-month day list and never
/// converted to a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl WallDate {
    pub(crate) fn from_naive(naive: NaiveDateTime) -> Self {
        Self {
            year: naive.year(),
            month: naive.month(),
            day: naive.day(),
            hour: naive.hour(),
            minute: naive.minute(),
            second: naive.second(),
        }
    }

    /// The reading as a `NaiveDateTime`. Callers only convert readings whose
    /// day exists in their month.
    pub(crate) fn to_naive(self) -> NaiveDateTime {
        debug_assert!(self.day >= 1 && self.day <= days_in_month(self.year, self.month));
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .unwrap_or(NaiveDate::MIN);
        date.and_hms_opt(self.hour, self.minute, self.second)
            .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
    }

    /// Replace the time-of-day components, normalizing overflow through the
    /// calendar: second 60 rolls into the next minute, second −1 borrows from
    /// the previous one, hour −1 at midnight lands on the previous day.
    pub(crate) fn with_hms_carry(self, hour: i64, minute: i64, second: i64) -> Self {
        let midnight = NaiveDateTime::new(
            NaiveDate::from_ymd_opt(self.year, self.month, self.day).unwrap_or(NaiveDate::MIN),
            NaiveTime::MIN,
        );
        Self::from_naive(midnight + Duration::seconds(hour * 3600 + minute * 60 + second))
    }

}
