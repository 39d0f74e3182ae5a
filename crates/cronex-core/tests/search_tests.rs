//! Occurrence-search behavior without DST involvement: plain UTC schedules,
//! fixed offsets, calendar backtracking and the sequence API.

use chrono::{DateTime, TimeZone, Utc};
use cronex_core::{CronExpression, ParseOptions, StrictMode, Timezone, WarningKind};

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn parse(text: &str) -> CronExpression {
    CronExpression::parse(text).unwrap()
}

// ---------------------------------------------------------------------------
// basic next / previous
// ---------------------------------------------------------------------------

#[test]
fn next_daily() {
    let expr = parse("0 30 10 * * *");
    assert_eq!(
        expr.next_occurrence(utc(2024, 6, 1, 0, 0, 0)),
        Some(utc(2024, 6, 1, 10, 30, 0))
    );
}

#[test]
fn next_is_strictly_after_the_query() {
    let expr = parse("0 30 10 * * *");
    assert_eq!(
        expr.next_occurrence(utc(2024, 6, 1, 10, 30, 0)),
        Some(utc(2024, 6, 2, 10, 30, 0))
    );
}

#[test]
fn previous_is_strictly_before_the_query() {
    let expr = parse("0 30 10 * * *");
    assert_eq!(
        expr.previous_occurrence(utc(2024, 6, 1, 10, 30, 0)),
        Some(utc(2024, 5, 31, 10, 30, 0))
    );
    assert_eq!(
        expr.previous_occurrence(utc(2024, 6, 1, 10, 30, 1)),
        Some(utc(2024, 6, 1, 10, 30, 0))
    );
}

#[test]
fn seconds_field_granularity() {
    let expr = parse("*/15 * * * * *");
    assert_eq!(
        expr.next_occurrence(utc(2024, 6, 1, 12, 0, 7)),
        Some(utc(2024, 6, 1, 12, 0, 15))
    );
    assert_eq!(
        expr.previous_occurrence(utc(2024, 6, 1, 12, 0, 7)),
        Some(utc(2024, 6, 1, 12, 0, 0))
    );
}

#[test]
fn five_field_expressions_fire_on_the_minute() {
    let expr = parse("30 10 * * *");
    assert_eq!(
        expr.next_occurrence(utc(2024, 6, 1, 0, 0, 0)),
        Some(utc(2024, 6, 1, 10, 30, 0))
    );
}

// ---------------------------------------------------------------------------
// calendar backtracking
// ---------------------------------------------------------------------------

#[test]
fn day_31_skips_short_months() {
    let expr = parse("0 0 0 31 * *");
    assert_eq!(
        expr.next_occurrence(utc(2024, 4, 15, 0, 0, 0)),
        Some(utc(2024, 5, 31, 0, 0, 0))
    );
    assert_eq!(
        expr.previous_occurrence(utc(2024, 5, 1, 0, 0, 0)),
        Some(utc(2024, 3, 31, 0, 0, 0))
    );
}

#[test]
fn leap_day_found_across_years() {
    let expr = parse("0 0 0 29 2 *");
    assert_eq!(
        expr.next_occurrence(utc(2023, 1, 1, 0, 0, 0)),
        Some(utc(2024, 2, 29, 0, 0, 0))
    );
    assert_eq!(
        expr.previous_occurrence(utc(2023, 1, 1, 0, 0, 0)),
        Some(utc(2020, 2, 29, 0, 0, 0))
    );
}

#[test]
fn unsatisfiable_day_returns_none() {
    let expr = parse("0 0 0 31 2 *");
    assert_eq!(expr.next_occurrence(utc(2024, 1, 1, 0, 0, 0)), None);
    assert_eq!(expr.previous_occurrence(utc(2024, 1, 1, 0, 0, 0)), None);
}

#[test]
fn bounded_year_field() {
    let expr = parse("0 0 0 1 1 * 2030");
    assert_eq!(
        expr.next_occurrence(utc(2024, 6, 1, 0, 0, 0)),
        Some(utc(2030, 1, 1, 0, 0, 0))
    );
    assert_eq!(expr.next_occurrence(utc(2030, 6, 1, 0, 0, 0)), None);
    assert_eq!(expr.previous_occurrence(utc(2024, 6, 1, 0, 0, 0)), None);
}

#[test]
fn dom_dow_union() {
    // Day 1 or any Monday. June 2024 starts on a Saturday.
    let expr = parse("0 0 12 1 * MON");
    assert_eq!(
        expr.next_occurrence(utc(2024, 6, 1, 12, 0, 0)),
        Some(utc(2024, 6, 3, 12, 0, 0))
    );
    assert_eq!(
        expr.next_occurrence(utc(2024, 6, 3, 12, 0, 0)),
        Some(utc(2024, 6, 10, 12, 0, 0))
    );
    assert_eq!(
        expr.previous_occurrence(utc(2024, 6, 3, 12, 0, 0)),
        Some(utc(2024, 6, 1, 12, 0, 0))
    );
}

#[test]
fn nth_weekday_of_month() {
    // Second Tuesday of June 2024 is the 11th.
    let expr = parse("0 0 9 ? * 2#2");
    assert_eq!(
        expr.next_occurrence(utc(2024, 6, 1, 0, 0, 0)),
        Some(utc(2024, 6, 11, 9, 0, 0))
    );
}

#[test]
fn previous_crosses_year_boundary() {
    let expr = parse("0 0 0 1 1 *");
    assert_eq!(
        expr.previous_occurrence(utc(2024, 6, 1, 0, 0, 0)),
        Some(utc(2024, 1, 1, 0, 0, 0))
    );
    assert_eq!(
        expr.previous_occurrence(utc(2024, 1, 1, 0, 0, 0)),
        Some(utc(2023, 1, 1, 0, 0, 0))
    );
}

// ---------------------------------------------------------------------------
// timezones without transitions
// ---------------------------------------------------------------------------

#[test]
fn fixed_offset_shifts_the_wall_clock() {
    let options = ParseOptions::default().timezone(Timezone::fixed_minutes(330).unwrap());
    let expr = CronExpression::parse_with("0 0 9 * * *", &options).unwrap();
    // 09:00 at UTC+05:30 is 03:30Z.
    assert_eq!(
        expr.next_occurrence(utc(2024, 6, 1, 0, 0, 0)),
        Some(utc(2024, 6, 1, 3, 30, 0))
    );
}

// ---------------------------------------------------------------------------
// sequences
// ---------------------------------------------------------------------------

#[test]
fn next_occurrences_chains() {
    let expr = parse("0 * * * * *");
    let dates = expr.next_occurrences(utc(2024, 6, 1, 12, 0, 30), 3);
    assert_eq!(
        dates,
        vec![
            utc(2024, 6, 1, 12, 1, 0),
            utc(2024, 6, 1, 12, 2, 0),
            utc(2024, 6, 1, 12, 3, 0),
        ]
    );
}

#[test]
fn previous_occurrences_newest_first() {
    let expr = parse("0 0 0 1 * *");
    let dates = expr.previous_occurrences(utc(2024, 6, 15, 0, 0, 0), 3);
    assert_eq!(
        dates,
        vec![
            utc(2024, 6, 1, 0, 0, 0),
            utc(2024, 5, 1, 0, 0, 0),
            utc(2024, 4, 1, 0, 0, 0),
        ]
    );
}

#[test]
fn sequence_stops_when_exhausted() {
    let expr = parse("0 0 0 1 1 * 2025");
    let dates = expr.next_occurrences(utc(2024, 1, 1, 0, 0, 0), 5);
    assert_eq!(dates, vec![utc(2025, 1, 1, 0, 0, 0)]);
}

// ---------------------------------------------------------------------------
// warnings, strict mode, display
// ---------------------------------------------------------------------------

#[test]
fn warnings_surface_without_strict_mode() {
    let expr = parse("0 10-20/30 * * * *");
    assert_eq!(expr.warnings().len(), 1);
    assert_eq!(
        expr.warnings()[0].kind,
        WarningKind::IncrementLargerThanRange
    );
}

#[test]
fn strict_mode_escalates_warnings() {
    let options = ParseOptions::default().strict(StrictMode::All);
    let err = CronExpression::parse_with("0 10-20/30 * * * *", &options).unwrap_err();
    assert!(err.to_string().contains("1 warning"));

    let mut kinds = std::collections::HashMap::new();
    kinds.insert(WarningKind::IncrementLargerThanRange, false);
    let options = ParseOptions::default().strict(StrictMode::PerWarning(kinds));
    assert!(CronExpression::parse_with("0 10-20/30 * * * *", &options).is_ok());
}

#[test]
fn display_lists_policies() {
    let expr = parse("0 30 10 * * *");
    assert_eq!(expr.cron_text(), "0 30 10 * * *");
    assert_eq!(
        expr.to_string(),
        "0 30 10 * * * (tz: Local, skipRepeatedHour: true, missingHour: insert)"
    );

    let options = ParseOptions::default()
        .timezone(Timezone::named("Europe/Zurich").unwrap())
        .skip_repeated_hour(false);
    let expr = CronExpression::parse_with("@daily", &options).unwrap();
    assert_eq!(
        expr.to_string(),
        "@daily (tz: Europe/Zurich, skipRepeatedHour: false, missingHour: insert)"
    );

    let options = ParseOptions::default().timezone(Timezone::fixed_minutes(-480).unwrap());
    let expr = CronExpression::parse_with("@hourly", &options).unwrap();
    assert_eq!(expr.to_string(), "@hourly (tz: UTC-08:00)");
}
