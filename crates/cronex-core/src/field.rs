//! Compiled schedule fields: the per-month day resolver and the
//! possibly-unbounded year field.
//!
//! The flat fields (seconds, minutes, hours, months) are plain sorted
//! `Vec<u32>` values produced by the parser. Days are different: which days
//! exist, and which weekday each falls on, depends on the month, so the day
//! field is a resolver keyed by `(year, month)` rather than a flat set.

use chrono::{Datelike, NaiveDate};

/// Number of days in the given month, Gregorian calendar.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(31, |d| d.day())
}

/// Weekday of a date as 0 = Sunday .. 6 = Saturday.
fn weekday_number(year: i32, month: u32, day: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.weekday().num_days_from_sunday())
        .unwrap_or(0)
}

/// Nearest weekday to `target` within the month, Quartz-style: a Saturday
/// moves back to Friday (forward to Monday at the month start), a Sunday
/// moves forward to Monday (back to Friday at the month end).
fn nearest_weekday(year: i32, month: u32, target: u32, month_len: u32) -> u32 {
    match weekday_number(year, month, target) {
        6 => {
            if target > 1 {
                target - 1
            } else {
                target + 2
            }
        }
        0 => {
            if target < month_len {
                target + 1
            } else {
                target - 2
            }
        }
        _ => target,
    }
}

/// Combined day-of-month and day-of-week constraints, resolved per
/// `(year, month)`.
///
/// Cron convention: when both day fields are restricted, a day matching
/// either fires (union); when only one is restricted, it alone applies;
/// `*` (or `?`) in both selects every day of the month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayField {
    /// Day-of-month field was `*`/`?`.
    pub(crate) any_dom: bool,
    /// Plain day numbers, sorted ascending.
    pub(crate) dom: Vec<u32>,
    /// `L`: last day of the month.
    pub(crate) last_dom: bool,
    /// `nW` targets: nearest weekday to day n, sorted ascending.
    pub(crate) nearest_weekday: Vec<u32>,
    /// `LW`: last weekday of the month.
    pub(crate) last_weekday_dom: bool,
    /// Day-of-week field was `*`/`?`.
    pub(crate) any_dow: bool,
    /// Plain weekdays (0 = Sunday .. 6 = Saturday), sorted ascending.
    pub(crate) dow: Vec<u32>,
    /// `d#n`: nth weekday d of the month, n in 1..=5.
    pub(crate) nth_dow: Vec<(u32, u32)>,
    /// `dL`: weekday d only in the last seven days of the month.
    pub(crate) last_dow: Vec<u32>,
}

impl DayField {
    /// Sorted days of `(year, month)` satisfying the day constraints.
    ///
    /// May be empty (e.g. day 31 requested in February); the caller treats an
    /// empty list as a failed level and backtracks.
    pub fn days_in(&self, year: i32, month: u32) -> Vec<u32> {
        let month_len = days_in_month(year, month);
        let dom_restricted = !self.any_dom;
        let dow_restricted = !self.any_dow;

        if !dom_restricted && !dow_restricted {
            return (1..=month_len).collect();
        }

        let mut selected = vec![false; month_len as usize + 1];

        if dom_restricted {
            for &day in &self.dom {
                if day <= month_len {
                    selected[day as usize] = true;
                }
            }
            if self.last_dom {
                selected[month_len as usize] = true;
            }
            if self.last_weekday_dom {
                selected[nearest_weekday(year, month, month_len, month_len) as usize] = true;
            }
            for &target in &self.nearest_weekday {
                if target <= month_len {
                    selected[nearest_weekday(year, month, target, month_len) as usize] = true;
                }
            }
        }

        if dow_restricted {
            for day in 1..=month_len {
                let weekday = weekday_number(year, month, day);
                let matches = self.dow.binary_search(&weekday).is_ok()
                    || self
                        .nth_dow
                        .iter()
                        .any(|&(w, n)| w == weekday && (day - 1) / 7 + 1 == n)
                    || (day + 7 > month_len && self.last_dow.contains(&weekday));
                if matches {
                    selected[day as usize] = true;
                }
            }
        }

        (1..=month_len)
            .filter(|&d| selected[d as usize])
            .collect()
    }
}

/// Allowed years: an explicit sorted set, or "every year".
///
/// Navigation on the unbounded variant is the identity rather than a nullable
/// sentinel, so the year-level search loop treats it like any other field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearField {
    /// Every year matches.
    Unbounded,
    /// Explicit sorted, deduplicated years.
    Bounded(Vec<i32>),
}

impl YearField {
    /// Smallest allowed year at or after `from`.
    pub fn next(&self, from: i32) -> Option<i32> {
        match self {
            YearField::Unbounded => Some(from),
            YearField::Bounded(years) => years.iter().copied().find(|&y| y >= from),
        }
    }

    /// Largest allowed year at or before `from`.
    pub fn previous(&self, from: i32) -> Option<i32> {
        match self {
            YearField::Unbounded => Some(from),
            YearField::Bounded(years) => years.iter().rev().copied().find(|&y| y <= from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_days(field: &DayField, year: i32, month: u32) -> Vec<u32> {
        field.days_in(year, month)
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn unrestricted_selects_whole_month() {
        let field = DayField {
            any_dom: true,
            any_dow: true,
            ..DayField::default()
        };
        assert_eq!(all_days(&field, 2024, 2), (1..=29).collect::<Vec<_>>());
    }

    #[test]
    fn dom_clipped_to_month_length() {
        let field = DayField {
            dom: vec![15, 30, 31],
            any_dow: true,
            ..DayField::default()
        };
        assert_eq!(all_days(&field, 2024, 2), vec![15]);
        assert_eq!(all_days(&field, 2024, 4), vec![15, 30]);
        assert_eq!(all_days(&field, 2024, 1), vec![15, 30, 31]);
    }

    #[test]
    fn last_day_of_month() {
        let field = DayField {
            last_dom: true,
            any_dow: true,
            ..DayField::default()
        };
        assert_eq!(all_days(&field, 2024, 2), vec![29]);
        assert_eq!(all_days(&field, 2023, 2), vec![28]);
    }

    #[test]
    fn nearest_weekday_moves_off_weekends() {
        // 2024-06-01 is a Saturday: 1W must go forward to Monday the 3rd.
        let field = DayField {
            nearest_weekday: vec![1],
            any_dow: true,
            ..DayField::default()
        };
        assert_eq!(all_days(&field, 2024, 6), vec![3]);

        // 2024-09-15 is a Sunday: 15W moves forward to Monday the 16th.
        let field = DayField {
            nearest_weekday: vec![15],
            any_dow: true,
            ..DayField::default()
        };
        assert_eq!(all_days(&field, 2024, 9), vec![16]);
    }

    #[test]
    fn last_weekday_of_month() {
        // 2024-11-30 is a Saturday, so LW is Friday the 29th.
        let field = DayField {
            last_weekday_dom: true,
            any_dow: true,
            ..DayField::default()
        };
        assert_eq!(all_days(&field, 2024, 11), vec![29]);
    }

    #[test]
    fn weekday_union_with_dom() {
        // Both fields restricted: union applies.
        let field = DayField {
            dom: vec![1],
            dow: vec![1], // Mondays
            ..DayField::default()
        };
        // June 2024 Mondays: 3, 10, 17, 24, plus day 1.
        assert_eq!(all_days(&field, 2024, 6), vec![1, 3, 10, 17, 24]);
    }

    #[test]
    fn nth_and_last_weekday() {
        // 2nd Tuesday and last Friday of June 2024: Tue 11, Fri 28.
        let field = DayField {
            any_dom: true,
            nth_dow: vec![(2, 2)],
            last_dow: vec![5],
            ..DayField::default()
        };
        assert_eq!(all_days(&field, 2024, 6), vec![11, 28]);
    }

    #[test]
    fn year_navigation() {
        let years = YearField::Bounded(vec![2020, 2024, 2030]);
        assert_eq!(years.next(2019), Some(2020));
        assert_eq!(years.next(2024), Some(2024));
        assert_eq!(years.next(2025), Some(2030));
        assert_eq!(years.next(2031), None);
        assert_eq!(years.previous(2031), Some(2030));
        assert_eq!(years.previous(2024), Some(2024));
        assert_eq!(years.previous(2023), Some(2020));
        assert_eq!(years.previous(2019), None);

        assert_eq!(YearField::Unbounded.next(1999), Some(1999));
        assert_eq!(YearField::Unbounded.previous(1999), Some(1999));
    }
}
