//! DST transition policies and transition detection.
//!
//! Wall-clock → instant mapping is non-bijective around DST transitions: a
//! fall-back repeats a wall hour, a spring-forward removes one. The search
//! engine works purely on wall clocks and is blind to both; the detection
//! here tells the correction layer which situation surrounds a query instant.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::timezone::Timezone;

/// Policy for matches that fall inside a spring-forward gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingHourPolicy {
    /// Snap the match to the instant at the start of the gap.
    #[default]
    Insert,
    /// Treat the gap as if the clock had not jumped: the match fires at the
    /// wall-continuous instant one hour after the last pre-gap reading.
    Offset,
    /// Discard the match and keep searching past the gap.
    Skip,
}

impl fmt::Display for MissingHourPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MissingHourPolicy::Insert => "insert",
            MissingHourPolicy::Offset => "offset",
            MissingHourPolicy::Skip => "skip",
        };
        f.write_str(label)
    }
}

/// Transition context around a query instant, derived by comparing the
/// timezone-naive local timestamps of `t - 1h`, `t` and `t + 1h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourContext {
    /// The query instant sits in the second pass of a repeated hour.
    pub repeated_seed: bool,
    /// The adjacent hour in the direction of travel belongs to a repeated
    /// wall hour, so a result there is ambiguous between two instants.
    pub repeated_adjacent: bool,
    /// A missing hour lies immediately behind the query instant in the
    /// direction of travel.
    pub missing_behind: bool,
}

fn local_timestamp(tz: &Timezone, instant: DateTime<Utc>) -> i64 {
    tz.wall_of(instant).and_utc().timestamp()
}

/// Context for a forward (next-occurrence) query at `t`.
pub fn forward_hour_context(t: DateTime<Utc>, tz: &Timezone) -> HourContext {
    let hour = Duration::hours(1);
    let at = local_timestamp(tz, t);
    let before = local_timestamp(tz, t - hour);
    let after = local_timestamp(tz, t + hour);
    HourContext {
        repeated_seed: at == before,
        repeated_adjacent: after == at,
        missing_behind: at - before == 7200,
    }
}

/// Context for a backward (previous-occurrence) query at `t`. The mirror
/// uses `t + 1h` as the reference for the missing-hour probe, and one hour
/// back is both the seed's and the adjacent repeated-hour signal.
pub fn backward_hour_context(t: DateTime<Utc>, tz: &Timezone) -> HourContext {
    let hour = Duration::hours(1);
    let at = local_timestamp(tz, t);
    let before = local_timestamp(tz, t - hour);
    let after = local_timestamp(tz, t + hour);
    let repeated = before == at;
    HourContext {
        repeated_seed: repeated,
        repeated_adjacent: repeated,
        missing_behind: after - at == 7200,
    }
}
