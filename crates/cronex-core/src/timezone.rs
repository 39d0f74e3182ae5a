//! Timezone abstraction: fixed UTC offsets or IANA zones with DST rules.
//!
//! Wraps `chrono-tz` for named zones and `chrono::FixedOffset` for numeric
//! offsets, and pins down the two mappings the search engine needs to be
//! deterministic about: ambiguous wall times (fall-back) and nonexistent wall
//! times (spring-forward gaps).

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CronexError, Result};

/// A fixed-offset or named (DST-aware) timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timezone {
    /// Constant offset from UTC; never has transitions.
    Fixed(FixedOffset),
    /// IANA zone backed by the chrono-tz rule database.
    Named(Tz),
}

impl Timezone {
    /// Build from an IANA name, e.g. `"Europe/Zurich"`.
    pub fn named(name: &str) -> Result<Self> {
        name.parse::<Tz>()
            .map(Timezone::Named)
            .map_err(|_| CronexError::InvalidTimezone(name.to_string()))
    }

    /// Build from a UTC offset in minutes, east positive: `-300` is UTC-5.
    pub fn fixed_minutes(minutes: i32) -> Result<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Timezone::Fixed)
            .ok_or(CronexError::InvalidOffset(minutes))
    }

    /// Whether this timezone's offset never changes.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Timezone::Fixed(_))
    }

    /// Wall-clock reading of `instant` under this timezone.
    pub(crate) fn wall_of(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Timezone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
            Timezone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    /// Absolute instant of a wall-clock reading under this timezone.
    ///
    /// Ambiguous readings (fall-back) resolve to the earlier instant.
    /// Nonexistent readings (spring-forward gap) resolve using the offset in
    /// effect just before the gap, so a gap reading and the reading one hour
    /// later map to the same instant, which is the property the gap-boundary
    /// detection in the correction layer relies on.
    pub(crate) fn instant_of(&self, wall: NaiveDateTime) -> DateTime<Utc> {
        match self {
            Timezone::Fixed(offset) => match offset.from_local_datetime(&wall) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                LocalResult::None => Utc.from_utc_datetime(&wall),
            },
            Timezone::Named(tz) => match tz.from_local_datetime(&wall) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                LocalResult::None => resolve_gap(*tz, wall),
            },
        }
    }
}

/// Map a nonexistent wall time through the offset that was in effect just
/// before the transition. Probes backwards one hour at a time; every gap in
/// the chrono-tz database is shorter than the probe limit.
fn resolve_gap(tz: Tz, wall: NaiveDateTime) -> DateTime<Utc> {
    for hours in 1..=4 {
        let probe = wall - Duration::hours(hours);
        if let Some(before) = tz.from_local_datetime(&probe).earliest() {
            let offset = i64::from(before.offset().fix().local_minus_utc());
            return Utc.from_utc_datetime(&(wall - Duration::seconds(offset)));
        }
    }
    Utc.from_utc_datetime(&wall)
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timezone::Fixed(offset) => {
                let minutes = offset.local_minus_utc() / 60;
                let (sign, abs) = if minutes < 0 {
                    ('-', -minutes)
                } else {
                    ('+', minutes)
                };
                write!(f, "UTC{}{:02}:{:02}", sign, abs / 60, abs % 60)
            }
            Timezone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}
