//! Compiled cron expressions: the cascading field search, the DST correction
//! layer around it, and the public occurrence API.
//!
//! The search walks six levels coarse to fine (year, month, day, hour,
//! minute, second), picking at each level the nearest allowed value in the
//! direction of travel. A level with no candidate reports failure and the
//! next coarser level backtracks to its own next candidate; a level that
//! advances past the seed's component resets every finer component to its
//! domain bound. Day candidates are re-derived per (year, month) because day
//! validity depends on the month's length and weekday layout.
//!
//! The search works purely on wall clocks. For zoned timezones the
//! correction layer around it detects repeated and missing wall hours near
//! the query instant and adjusts seeds and results according to the
//! expression's policies.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::date::WallDate;
use crate::dst::{backward_hour_context, forward_hour_context, MissingHourPolicy};
use crate::error::{CronexError, Result};
use crate::field::{DayField, YearField};
use crate::parser::{parse_fields, Warning, WarningKind};
use crate::timezone::Timezone;

/// Upper bound, in years, on how far a search may wander from its seed.
/// Turns unsatisfiable field combinations (day 31 in February) into a finite
/// `None` instead of an unbounded walk.
const MAX_YEAR_SPAN: i32 = 2000;

/// Strict-mode configuration for [`CronExpression::parse_with`].
#[derive(Debug, Clone, Default)]
pub enum StrictMode {
    /// Warnings are informational only.
    #[default]
    Off,
    /// Any warning fails construction.
    All,
    /// Only warning kinds mapped to `true` fail construction.
    PerWarning(HashMap<WarningKind, bool>),
}

/// Options accepted by [`CronExpression::parse_with`].
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Timezone the schedule is evaluated in; `None` reads the fields as UTC
    /// wall time ("Local" in the descriptive string).
    pub timezone: Option<Timezone>,
    /// When true (the default), the second pass of a repeated hour never
    /// matches.
    pub skip_repeated_hour: bool,
    /// What to do with matches inside a spring-forward gap.
    pub missing_hour: MissingHourPolicy,
    /// Whether parser warnings fail construction.
    pub strict: StrictMode,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            timezone: None,
            skip_repeated_hour: true,
            missing_hour: MissingHourPolicy::Insert,
            strict: StrictMode::Off,
        }
    }
}

impl ParseOptions {
    pub fn timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = Some(timezone);
        self
    }

    pub fn skip_repeated_hour(mut self, skip: bool) -> Self {
        self.skip_repeated_hour = skip;
        self
    }

    pub fn missing_hour(mut self, policy: MissingHourPolicy) -> Self {
        self.missing_hour = policy;
        self
    }

    pub fn strict(mut self, strict: StrictMode) -> Self {
        self.strict = strict;
        self
    }
}

/// Direction of travel for the cascading search. Forward and backward share
/// one code path; the direction flips the comparator, the candidate order
/// and the reset bounds for finer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Index of the nearest allowed value at-or-after (forward) or
    /// at-or-before (backward) `from`, in a sorted slice.
    fn locate(self, values: &[u32], from: u32) -> Option<usize> {
        match self {
            Direction::Forward => values.iter().position(|&v| v >= from),
            Direction::Backward => values.iter().rposition(|&v| v <= from),
        }
    }

    /// Next candidate index when a finer level reported failure.
    fn advance(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Direction::Forward => (index + 1 < len).then_some(index + 1),
            Direction::Backward => index.checked_sub(1),
        }
    }

    fn reset_month(self) -> u32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => 12,
        }
    }

    /// Day reset is a plain bound, not a calendar day: 31 in a shorter month
    /// is clamped by the day-level candidate list before any conversion.
    fn reset_day(self) -> u32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => 31,
        }
    }

    fn reset_time(self) -> (u32, u32, u32) {
        match self {
            Direction::Forward => (0, 0, 0),
            Direction::Backward => (23, 59, 59),
        }
    }
}

/// A compiled cron expression.
///
/// Immutable after construction: all fields, the timezone and the DST
/// policies are fixed at parse time and warnings are computed eagerly, so a
/// value can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct CronExpression {
    text: String,
    seconds: Vec<u32>,
    minutes: Vec<u32>,
    hours: Vec<u32>,
    days: DayField,
    months: Vec<u32>,
    years: YearField,
    timezone: Option<Timezone>,
    skip_repeated_hour: bool,
    missing_hour: MissingHourPolicy,
    warnings: Vec<Warning>,
}

impl CronExpression {
    /// Compile an expression with default options.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &ParseOptions::default())
    }

    /// Compile an expression with explicit timezone, DST policies and strict
    /// mode.
    pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Self> {
        let fields = parse_fields(text)?;

        let offending = match &options.strict {
            StrictMode::Off => 0,
            StrictMode::All => fields.warnings.len(),
            StrictMode::PerWarning(kinds) => fields
                .warnings
                .iter()
                .filter(|warning| kinds.get(&warning.kind).copied().unwrap_or(false))
                .count(),
        };
        if offending > 0 {
            return Err(CronexError::StrictWarnings { count: offending });
        }

        Ok(Self {
            text: text.trim().to_string(),
            seconds: fields.seconds,
            minutes: fields.minutes,
            hours: fields.hours,
            days: fields.days,
            months: fields.months,
            years: fields.years,
            timezone: options.timezone,
            skip_repeated_hour: options.skip_repeated_hour,
            missing_hour: options.missing_hour,
            warnings: fields.warnings,
        })
    }

    /// The original expression text.
    pub fn cron_text(&self) -> &str {
        &self.text
    }

    /// The configured timezone, if any.
    pub fn timezone(&self) -> Option<&Timezone> {
        self.timezone.as_ref()
    }

    /// Parser diagnostics collected at construction.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    // ── occurrence API ──────────────────────────────────────────────────

    /// Next matching instant strictly after `after`, or `None` if no match
    /// exists within the year horizon.
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let from = self.wall_of(after);
        let tz = match &self.timezone {
            Some(tz) if !tz.is_fixed() => *tz,
            // Fixed offsets and the UTC fallback have no wall-clock
            // ambiguity; the raw search result stands.
            _ => {
                return self
                    .search(Direction::Forward, &from, true)
                    .map(|found| self.instant_of(&found))
            }
        };

        let hour = Duration::hours(1);
        let ctx = forward_hour_context(after, &tz);

        // Inside the second pass of a repeated hour with skipping enabled:
        // force the search strictly past the repeated hour.
        if self.skip_repeated_hour && ctx.repeated_seed {
            let seed = from.with_hms_carry(i64::from(from.hour), 59, 60);
            return self
                .search(Direction::Forward, &seed, false)
                .map(|found| self.instant_of(&found));
        }

        // Just past a gap with the offset policy: the hour that never was
        // may still hold a virtual candidate in the future.
        if self.missing_hour == MissingHourPolicy::Offset && ctx.missing_behind {
            let seed = from.with_hms_carry(
                i64::from(from.hour) - 1,
                i64::from(from.minute),
                i64::from(from.second),
            );
            match self.search(Direction::Forward, &seed, true) {
                None => return None,
                Some(found) => {
                    let instant = self.instant_of(&found);
                    if instant > after {
                        return Some(instant);
                    }
                }
            }
        }

        let raw = self.search(Direction::Forward, &from, true);

        if self.missing_hour != MissingHourPolicy::Offset {
            if let Some(found) = &raw {
                let instant = self.instant_of(found);
                let next_hour = found.with_hms_carry(
                    i64::from(found.hour) + 1,
                    i64::from(found.minute),
                    i64::from(found.second),
                );
                // A match whose hour+1 twin maps to the same instant sits in
                // a spring-forward gap.
                if self.instant_of(&next_hour) == instant {
                    return match self.missing_hour {
                        MissingHourPolicy::Insert => Some(self.instant_of(&WallDate {
                            minute: 0,
                            second: 0,
                            ..*found
                        })),
                        _ => self
                            .search(
                                Direction::Forward,
                                &WallDate {
                                    minute: 59,
                                    second: 59,
                                    ..*found
                                },
                                true,
                            )
                            .map(|next| self.instant_of(&next)),
                    };
                }
            }
        }

        let mut next = raw.map(|found| self.instant_of(&found));
        if !self.skip_repeated_hour {
            // The upcoming hour repeats the current wall hour: a candidate in
            // the current wall hour fires again, so prefer it over anything
            // more than an hour out.
            if ctx.repeated_adjacent && next.map_or(true, |instant| instant > after + hour) {
                next = self
                    .search(
                        Direction::Forward,
                        &WallDate {
                            minute: 0,
                            second: 0,
                            ..from
                        },
                        false,
                    )
                    .map(|found| self.instant_of(&found));
            }
            // Ambiguous results resolve to the first pass; when that is not
            // strictly in the future, the second pass is meant.
            if let Some(instant) = next {
                if instant <= after {
                    next = Some(instant + hour);
                }
            }
        }
        next
    }

    /// Previous matching instant strictly before `before`, or `None` if no
    /// match exists within the year horizon.
    pub fn previous_occurrence(&self, before: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let from = self.wall_of(before);
        let tz = match &self.timezone {
            Some(tz) if !tz.is_fixed() => *tz,
            _ => {
                return self
                    .search(Direction::Backward, &from, true)
                    .map(|found| self.instant_of(&found))
            }
        };

        let hour = Duration::hours(1);
        let ctx = backward_hour_context(before, &tz);

        if self.skip_repeated_hour && ctx.repeated_seed {
            let seed = from.with_hms_carry(i64::from(from.hour), 0, -1);
            return self
                .search(Direction::Backward, &seed, false)
                .map(|found| self.instant_of(&found));
        }

        if self.missing_hour == MissingHourPolicy::Offset && ctx.missing_behind {
            let seed = from.with_hms_carry(
                i64::from(from.hour) + 1,
                i64::from(from.minute),
                i64::from(from.second),
            );
            match self.search(Direction::Backward, &seed, true) {
                None => return None,
                Some(found) => {
                    let instant = self.instant_of(&found);
                    if instant < before {
                        return Some(instant);
                    }
                }
            }
        }

        let raw = self.search(Direction::Backward, &from, true);

        if self.missing_hour != MissingHourPolicy::Offset {
            if let Some(found) = &raw {
                let instant = self.instant_of(found);
                let previous_hour = found.with_hms_carry(
                    i64::from(found.hour) - 1,
                    i64::from(found.minute),
                    i64::from(found.second),
                );
                if self.instant_of(&previous_hour) == instant {
                    return match self.missing_hour {
                        MissingHourPolicy::Insert => Some(self.instant_of(&WallDate {
                            minute: 59,
                            second: 59,
                            ..*found
                        })),
                        _ => self
                            .search(
                                Direction::Backward,
                                &WallDate {
                                    minute: 0,
                                    second: 0,
                                    ..*found
                                },
                                true,
                            )
                            .map(|previous| self.instant_of(&previous)),
                    };
                }
            }
        }

        let mut previous = raw.map(|found| self.instant_of(&found));
        if !self.skip_repeated_hour {
            if ctx.repeated_adjacent
                && previous.map_or(true, |instant| instant < before - hour)
            {
                previous = self
                    .search(
                        Direction::Backward,
                        &WallDate {
                            minute: 59,
                            second: 59,
                            ..from
                        },
                        false,
                    )
                    .map(|found| self.instant_of(&found));
            }
            if let Some(instant) = previous {
                if instant >= before {
                    previous = Some(instant - hour);
                }
            }
        }
        previous
    }

    /// Up to `n` occurrences strictly after `after`, each step seeded by the
    /// previous result. Stops early when a step yields nothing.
    pub fn next_occurrences(&self, after: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
        let mut occurrences = Vec::with_capacity(n.min(64));
        let mut cursor = after;
        for _ in 0..n {
            match self.next_occurrence(cursor) {
                Some(instant) => {
                    occurrences.push(instant);
                    cursor = instant;
                }
                None => break,
            }
        }
        occurrences
    }

    /// Up to `n` occurrences strictly before `before`, newest first.
    pub fn previous_occurrences(&self, before: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
        let mut occurrences = Vec::with_capacity(n.min(64));
        let mut cursor = before;
        for _ in 0..n {
            match self.previous_occurrence(cursor) {
                Some(instant) => {
                    occurrences.push(instant);
                    cursor = instant;
                }
                None => break,
            }
        }
        occurrences
    }

    // ── wall-clock ⇄ instant glue ───────────────────────────────────────

    fn wall_of(&self, instant: DateTime<Utc>) -> WallDate {
        match &self.timezone {
            Some(tz) => WallDate::from_naive(tz.wall_of(instant)),
            None => WallDate::from_naive(instant.naive_utc()),
        }
    }

    fn instant_of(&self, wall: &WallDate) -> DateTime<Utc> {
        match &self.timezone {
            Some(tz) => tz.instant_of(wall.to_naive()),
            None => Utc.from_utc_datetime(&wall.to_naive()),
        }
    }

    // ── cascading search ────────────────────────────────────────────────

    /// Nearest wall-clock date satisfying all six fields at-or-after
    /// (forward) / at-or-before (backward) the seed. `exclusive` nudges the
    /// seed by one second so the seed itself cannot match.
    fn search(&self, direction: Direction, seed: &WallDate, exclusive: bool) -> Option<WallDate> {
        let seed = if exclusive {
            let nudge = match direction {
                Direction::Forward => 1,
                Direction::Backward => -1,
            };
            seed.with_hms_carry(
                i64::from(seed.hour),
                i64::from(seed.minute),
                i64::from(seed.second) + nudge,
            )
        } else {
            *seed
        };
        self.search_year(direction, &seed)
    }

    fn search_year(&self, direction: Direction, from: &WallDate) -> Option<WallDate> {
        let mut cursor = from.year;
        loop {
            let year = match direction {
                Direction::Forward => self.years.next(cursor)?,
                Direction::Backward => self.years.previous(cursor)?,
            };
            let out_of_horizon = match direction {
                Direction::Forward => year >= from.year + MAX_YEAR_SPAN,
                Direction::Backward => year <= from.year - MAX_YEAR_SPAN,
            };
            if out_of_horizon {
                return None;
            }

            let seed = if year == from.year {
                *from
            } else {
                seed_year(year, direction)
            };
            if let Some(found) = self.search_month(direction, &seed) {
                return Some(found);
            }

            cursor = match direction {
                Direction::Forward => year + 1,
                Direction::Backward => year - 1,
            };
        }
    }

    fn search_month(&self, direction: Direction, from: &WallDate) -> Option<WallDate> {
        let mut index = direction.locate(&self.months, from.month)?;
        loop {
            let month = self.months[index];
            let seed = if month == from.month {
                *from
            } else {
                seed_month(from, month, direction)
            };
            if let Some(found) = self.search_day(direction, &seed) {
                return Some(found);
            }
            index = direction.advance(index, self.months.len())?;
        }
    }

    fn search_day(&self, direction: Direction, from: &WallDate) -> Option<WallDate> {
        // Re-derived per (year, month): day validity depends on the month.
        let days = self.days.days_in(from.year, from.month);
        let mut index = direction.locate(&days, from.day)?;
        loop {
            let day = days[index];
            let seed = if day == from.day {
                *from
            } else {
                seed_day(from, day, direction)
            };
            if let Some(found) = self.search_hour(direction, &seed) {
                return Some(found);
            }
            index = direction.advance(index, days.len())?;
        }
    }

    fn search_hour(&self, direction: Direction, from: &WallDate) -> Option<WallDate> {
        let mut index = direction.locate(&self.hours, from.hour)?;
        loop {
            let hour = self.hours[index];
            let seed = if hour == from.hour {
                *from
            } else {
                seed_hour(from, hour, direction)
            };
            if let Some(found) = self.search_minute(direction, &seed) {
                return Some(found);
            }
            index = direction.advance(index, self.hours.len())?;
        }
    }

    fn search_minute(&self, direction: Direction, from: &WallDate) -> Option<WallDate> {
        let mut index = direction.locate(&self.minutes, from.minute)?;
        loop {
            let minute = self.minutes[index];
            let seed = if minute == from.minute {
                *from
            } else {
                seed_minute(from, minute, direction)
            };
            if let Some(found) = self.search_second(direction, &seed) {
                return Some(found);
            }
            index = direction.advance(index, self.minutes.len())?;
        }
    }

    fn search_second(&self, direction: Direction, from: &WallDate) -> Option<WallDate> {
        let index = direction.locate(&self.seconds, from.second)?;
        Some(WallDate {
            second: self.seconds[index],
            ..*from
        })
    }
}

fn seed_year(year: i32, direction: Direction) -> WallDate {
    let (hour, minute, second) = direction.reset_time();
    WallDate {
        year,
        month: direction.reset_month(),
        day: direction.reset_day(),
        hour,
        minute,
        second,
    }
}

fn seed_month(base: &WallDate, month: u32, direction: Direction) -> WallDate {
    let (hour, minute, second) = direction.reset_time();
    WallDate {
        month,
        day: direction.reset_day(),
        hour,
        minute,
        second,
        ..*base
    }
}

fn seed_day(base: &WallDate, day: u32, direction: Direction) -> WallDate {
    let (hour, minute, second) = direction.reset_time();
    WallDate {
        day,
        hour,
        minute,
        second,
        ..*base
    }
}

fn seed_hour(base: &WallDate, hour: u32, direction: Direction) -> WallDate {
    let (_, minute, second) = direction.reset_time();
    WallDate {
        hour,
        minute,
        second,
        ..*base
    }
}

fn seed_minute(base: &WallDate, minute: u32, direction: Direction) -> WallDate {
    let (_, _, second) = direction.reset_time();
    WallDate {
        minute,
        second,
        ..*base
    }
}

impl fmt::Display for CronExpression {
    /// Canonical descriptive string:
    /// `<cronText> (tz: <name-or-Local>, skipRepeatedHour: <bool>, missingHour: <policy>)`.
    /// The two policy entries are omitted for fixed numeric offsets, which
    /// have no zone name and no transitions for the policies to act on.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show_policies = self
            .timezone
            .as_ref()
            .map_or(true, |tz| !tz.is_fixed());
        let tz_label = match &self.timezone {
            Some(tz) => tz.to_string(),
            None => "Local".to_string(),
        };
        if show_policies {
            write!(
                f,
                "{} (tz: {}, skipRepeatedHour: {}, missingHour: {})",
                self.text, tz_label, self.skip_repeated_hour, self.missing_hour
            )
        } else {
            write!(f, "{} (tz: {})", self.text, tz_label)
        }
    }
}
