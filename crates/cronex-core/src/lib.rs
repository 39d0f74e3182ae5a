//! Cron expression scheduling with explicit DST semantics.
//!
//! `cronex-core` compiles cron expressions (5 to 7 fields, Quartz-style day
//! specials, `@`-macros) and answers next/previous occurrence queries as
//! absolute UTC instants. Schedules can be evaluated under a fixed UTC
//! offset or an IANA timezone; for the latter the engine takes an explicit
//! stance on the two awkward cases, repeated wall hours (fall-back) and
//! missing wall hours (spring-forward), configurable per expression.
//!
//! # Modules
//!
//! - [`parser`]: the cron grammar, field value sets and warnings
//! - [`field`]: per-month day resolution and the year field
//! - [`date`]: timezone-naive wall-clock readings
//! - [`timezone`]: fixed-offset and IANA timezones
//! - [`dst`]: transition detection and the missing-hour policy
//! - [`expression`]: compiled expressions and the occurrence search
//! - [`error`]: the crate error type
//!
//! # Quick start
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use cronex_core::{CronExpression, ParseOptions, Timezone};
//!
//! # fn main() -> cronex_core::Result<()> {
//! // Every weekday at 09:30 in Zurich.
//! let options = ParseOptions::default().timezone(Timezone::named("Europe/Zurich")?);
//! let expr = CronExpression::parse_with("0 30 9 * * MON-FRI", &options)?;
//!
//! let after = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
//! let next = expr.next_occurrence(after).unwrap();
//! assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 3, 7, 30, 0).unwrap());
//! # Ok(())
//! # }
//! ```

pub mod date;
pub mod dst;
pub mod error;
pub mod expression;
pub mod field;
pub mod parser;
pub mod timezone;

pub use date::WallDate;
pub use dst::MissingHourPolicy;
pub use error::{CronexError, Result};
pub use expression::{CronExpression, ParseOptions, StrictMode};
pub use field::{DayField, YearField};
pub use parser::{Warning, WarningKind};
pub use timezone::Timezone;
