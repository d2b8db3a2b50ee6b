//! Query window resolution.
//!
//! Turns the mutually exclusive date-selection inputs (days ago, year/month,
//! explicit start+end) and the optional status list into the filter passed to
//! the Orders API. The first mode supplied wins, in that order; with no mode
//! the window starts seven days ago.

use chrono::{Months, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format of explicit start/end dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lookback used when no date mode is supplied.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Statuses queried when the caller gives none.
pub const DEFAULT_STATUSES: [&str; 2] = ["Shipped", "Unshipped"];

/// Raw date-selection inputs, as collected from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeRequest {
    pub days_ago: Option<i64>,
    pub year: Option<i32>,
    /// Only consulted together with `year`; defaults to January.
    pub month: Option<i32>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub statuses: Vec<String>,
}

/// Resolved query window and status filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    /// Lower bound on order creation time, UTC.
    pub created_after: NaiveDateTime,
    /// Upper bound; only set by the explicit start/end mode.
    pub created_before: Option<NaiveDateTime>,
    pub statuses: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RangeError {
    #[error("invalid date '{input}' (expected YYYY-MM-DD): {source}")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("resolved date is out of range: {0}")]
    OutOfRange(String),
}

/// Resolve a [`RangeRequest`] against `now` (UTC).
///
/// No sanity checks are applied beyond date parsing: a negative `days_ago`
/// yields a start date in the future, and months outside 1..=12 roll over
/// into neighbouring years.
pub fn resolve(request: &RangeRequest, now: NaiveDateTime) -> Result<OrderFilter, RangeError> {
    let mut created_after = None;
    let mut created_before = None;

    if let Some(days) = request.days_ago {
        created_after = Some(days_before(now, days)?);
    } else if let Some(year) = request.year {
        let month = request.month.unwrap_or(1);
        created_after = Some(month_anchor(now, year, month)?);
    } else if let (Some(start), Some(end)) = (&request.start, &request.end) {
        created_after = Some(parse_date(start)?);
        created_before = Some(parse_date(end)?);
    }

    let created_after = match created_after {
        Some(date) => date,
        None => days_before(now, DEFAULT_LOOKBACK_DAYS)?,
    };

    let statuses = if request.statuses.is_empty() {
        DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect()
    } else {
        request.statuses.clone()
    };

    Ok(OrderFilter {
        created_after,
        created_before,
        statuses,
    })
}

fn days_before(now: NaiveDateTime, days: i64) -> Result<NaiveDateTime, RangeError> {
    TimeDelta::try_days(days)
        .and_then(|delta| now.checked_sub_signed(delta))
        .ok_or_else(|| RangeError::OutOfRange(format!("{days} days before {now}")))
}

/// `now` with year and month replaced and the day set to 1. The time of day
/// is kept as-is.
fn month_anchor(now: NaiveDateTime, year: i32, month: i32) -> Result<NaiveDateTime, RangeError> {
    let out_of_range = || RangeError::OutOfRange(format!("year {year}, month {month}"));

    let january = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(out_of_range)?;
    let offset = i64::from(month) - 1;
    let months = u32::try_from(offset.unsigned_abs())
        .map(Months::new)
        .map_err(|_| out_of_range())?;
    let first = if offset >= 0 {
        january.checked_add_months(months)
    } else {
        january.checked_sub_months(months)
    }
    .ok_or_else(out_of_range)?;

    Ok(first.and_time(now.time()))
}

fn parse_date(input: &str) -> Result<NaiveDateTime, RangeError> {
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|source| RangeError::Parse {
            input: input.to_string(),
            source,
        })
}
