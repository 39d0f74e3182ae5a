//! Cron grammar: tokenizing expression fields into sorted value sets.
//!
//! Accepts 5, 6 or 7 whitespace-separated fields:
//! `[second] minute hour day-of-month month day-of-week [year]`.
//! Five fields pin seconds to `0`; the seventh field restricts years.
//!
//! Each field is a comma-separated list of `*`, single values, `a-b` ranges
//! and `/step` suffixes, with month and weekday names accepted. The day
//! fields additionally understand `?`, `L`, `nW`, `LW`, `dL` and `d#n`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CronexError, Result};
use crate::field::{DayField, YearField};

/// Kinds of non-fatal issues the parser can flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A step larger than the span of its range; the range collapses to its
    /// start value.
    IncrementLargerThanRange,
}

/// A non-fatal parser diagnostic. Strict mode can escalate these to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

/// All compiled fields of one expression plus collected warnings.
#[derive(Debug, Clone)]
pub(crate) struct ParsedFields {
    pub seconds: Vec<u32>,
    pub minutes: Vec<u32>,
    pub hours: Vec<u32>,
    pub days: DayField,
    pub months: Vec<u32>,
    pub years: YearField,
    pub warnings: Vec<Warning>,
}

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [(&'static str, u32)],
}

const SECOND: FieldSpec = FieldSpec {
    name: "second",
    min: 0,
    max: 59,
    names: &[],
};
const MINUTE: FieldSpec = FieldSpec {
    name: "minute",
    min: 0,
    max: 59,
    names: &[],
};
const HOUR: FieldSpec = FieldSpec {
    name: "hour",
    min: 0,
    max: 23,
    names: &[],
};
const DAY_OF_MONTH: FieldSpec = FieldSpec {
    name: "day-of-month",
    min: 1,
    max: 31,
    names: &[],
};
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: &[
        ("JAN", 1),
        ("FEB", 2),
        ("MAR", 3),
        ("APR", 4),
        ("MAY", 5),
        ("JUN", 6),
        ("JUL", 7),
        ("AUG", 8),
        ("SEP", 9),
        ("OCT", 10),
        ("NOV", 11),
        ("DEC", 12),
    ],
};
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: &[
        ("SUN", 0),
        ("MON", 1),
        ("TUE", 2),
        ("WED", 3),
        ("THU", 4),
        ("FRI", 5),
        ("SAT", 6),
    ],
};
const YEAR: FieldSpec = FieldSpec {
    name: "year",
    min: 1970,
    max: 2099,
    names: &[],
};

fn expand_macro(text: &str) -> &str {
    match text {
        "@yearly" | "@annually" => "0 0 0 1 1 *",
        "@monthly" => "0 0 0 1 * *",
        "@weekly" => "0 0 0 * * 0",
        "@daily" | "@midnight" => "0 0 0 * * *",
        "@hourly" => "0 0 * * * *",
        other => other,
    }
}

fn field_error(spec: &FieldSpec, message: String) -> CronexError {
    CronexError::InvalidField {
        field: spec.name,
        message,
    }
}

/// Single value: a name from the field's table or a number within range.
fn parse_value(token: &str, spec: &FieldSpec) -> Result<u32> {
    let upper = token.to_ascii_uppercase();
    if let Some(&(_, value)) = spec.names.iter().find(|(name, _)| *name == upper) {
        return Ok(value);
    }
    let value: u32 = token
        .parse()
        .map_err(|_| field_error(spec, format!("unrecognized value '{token}'")))?;
    if value < spec.min || value > spec.max {
        return Err(field_error(
            spec,
            format!("value {value} out of range {}-{}", spec.min, spec.max),
        ));
    }
    Ok(value)
}

/// One comma-separated element: `*`, `v`, `a-b`, any of them with `/step`,
/// or `a/step` (a to field maximum).
fn parse_element(
    element: &str,
    spec: &FieldSpec,
    values: &mut BTreeSet<u32>,
    warnings: &mut Vec<Warning>,
) -> Result<()> {
    let (base, step) = match element.split_once('/') {
        Some((base, raw_step)) => {
            let step = raw_step
                .parse::<u32>()
                .ok()
                .filter(|&s| s >= 1)
                .ok_or_else(|| field_error(spec, format!("invalid step '{raw_step}'")))?;
            (base, Some(step))
        }
        None => (element, None),
    };

    let (start, end) = if base == "*" {
        (spec.min, spec.max)
    } else if let Some((low, high)) = base.split_once('-') {
        let low = parse_value(low, spec)?;
        let high = parse_value(high, spec)?;
        if low > high {
            return Err(field_error(
                spec,
                format!("range start {low} greater than end {high}"),
            ));
        }
        (low, high)
    } else {
        let value = parse_value(base, spec)?;
        match step {
            Some(_) => (value, spec.max),
            None => (value, value),
        }
    };

    let step = step.unwrap_or(1);
    if step > end - start && end > start {
        warnings.push(Warning {
            kind: WarningKind::IncrementLargerThanRange,
            message: format!(
                "step {step} exceeds the {start}-{end} range in the {} field",
                spec.name
            ),
        });
    }

    let mut value = start;
    while value <= end {
        values.insert(value);
        value += step;
    }
    Ok(())
}

/// Whole field: comma-separated elements, sorted and deduplicated.
fn parse_list(token: &str, spec: &FieldSpec, warnings: &mut Vec<Warning>) -> Result<Vec<u32>> {
    let mut values = BTreeSet::new();
    for element in token.split(',') {
        parse_element(element, spec, &mut values, warnings)?;
    }
    Ok(values.into_iter().collect())
}

fn is_any(token: &str) -> bool {
    token == "*" || token == "?"
}

fn parse_day_field(
    dom_token: &str,
    dow_token: &str,
    warnings: &mut Vec<Warning>,
) -> Result<DayField> {
    let mut days = DayField::default();

    if is_any(dom_token) {
        days.any_dom = true;
    } else {
        let mut plain = BTreeSet::new();
        for element in dom_token.split(',') {
            let upper = element.to_ascii_uppercase();
            if upper == "L" {
                days.last_dom = true;
            } else if upper == "LW" {
                days.last_weekday_dom = true;
            } else if let Some(prefix) = upper.strip_suffix('W') {
                let target = prefix
                    .parse::<u32>()
                    .ok()
                    .filter(|day| (1..=31).contains(day))
                    .ok_or_else(|| {
                        field_error(
                            &DAY_OF_MONTH,
                            format!("invalid nearest-weekday element '{element}'"),
                        )
                    })?;
                days.nearest_weekday.push(target);
            } else {
                parse_element(element, &DAY_OF_MONTH, &mut plain, warnings)?;
            }
        }
        days.dom = plain.into_iter().collect();
        days.nearest_weekday.sort_unstable();
        days.nearest_weekday.dedup();
    }

    if is_any(dow_token) {
        days.any_dow = true;
    } else {
        let mut plain = BTreeSet::new();
        for element in dow_token.split(',') {
            let upper = element.to_ascii_uppercase();
            if let Some((day, nth)) = upper.split_once('#') {
                let weekday = parse_value(day, &DAY_OF_WEEK)? % 7;
                let nth = nth
                    .parse::<u32>()
                    .ok()
                    .filter(|n| (1..=5).contains(n))
                    .ok_or_else(|| {
                        field_error(&DAY_OF_WEEK, format!("invalid nth element '{element}'"))
                    })?;
                days.nth_dow.push((weekday, nth));
            } else if upper.len() > 1 && upper.ends_with('L') {
                let weekday = parse_value(&upper[..upper.len() - 1], &DAY_OF_WEEK)? % 7;
                days.last_dow.push(weekday);
            } else {
                parse_element(element, &DAY_OF_WEEK, &mut plain, warnings)?;
            }
        }
        days.dow = plain
            .into_iter()
            .map(|v| v % 7)
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect();
        days.nth_dow.sort_unstable();
        days.nth_dow.dedup();
        days.last_dow.sort_unstable();
        days.last_dow.dedup();
    }

    Ok(days)
}

pub(crate) fn parse_fields(text: &str) -> Result<ParsedFields> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CronexError::InvalidExpression("empty expression".into()));
    }

    let expanded = expand_macro(trimmed);
    let tokens: Vec<&str> = expanded.split_whitespace().collect();
    if !(5..=7).contains(&tokens.len()) {
        return Err(CronexError::InvalidExpression(format!(
            "expected 5 to 7 fields, found {}",
            tokens.len()
        )));
    }

    let mut warnings = Vec::new();
    let offset = usize::from(tokens.len() > 5);
    let seconds = if tokens.len() == 5 {
        vec![0]
    } else {
        parse_list(tokens[0], &SECOND, &mut warnings)?
    };
    let minutes = parse_list(tokens[offset], &MINUTE, &mut warnings)?;
    let hours = parse_list(tokens[offset + 1], &HOUR, &mut warnings)?;
    let days = parse_day_field(tokens[offset + 2], tokens[offset + 4], &mut warnings)?;
    let months = parse_list(tokens[offset + 3], &MONTH, &mut warnings)?;
    let years = match tokens.get(offset + 5) {
        None => YearField::Unbounded,
        Some(&"*") => YearField::Unbounded,
        Some(token) => {
            let years = parse_list(token, &YEAR, &mut warnings)?;
            YearField::Bounded(years.into_iter().map(|y| y as i32).collect())
        }
    };

    Ok(ParsedFields {
        seconds,
        minutes,
        hours,
        days,
        months,
        years,
        warnings,
    })
}
