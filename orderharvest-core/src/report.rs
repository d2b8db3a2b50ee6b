//! Run summary: orders newest first, purchase-date span, pacing counters and
//! elapsed wall-clock time.

use crate::domain::Order;
use crate::throttle::ThrottleState;
use chrono::{DateTime, Datelike, Months, NaiveDateTime, TimeZone};
use serde::Serialize;
use std::fmt;

const SECS_PER_DAY: i64 = 86_400;

/// Boundaries of a harvest run.
///
/// The local times are printed; elapsed time is measured on the UTC pair so
/// a clock change during the run does not distort it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunTiming {
    pub started: NaiveDateTime,
    pub finished: NaiveDateTime,
    pub started_utc: NaiveDateTime,
    pub finished_utc: NaiveDateTime,
}

impl RunTiming {
    /// Timing from zone-aware clock readings.
    pub fn from_clock<Tz: TimeZone>(started: &DateTime<Tz>, finished: &DateTime<Tz>) -> Self {
        Self {
            started: started.naive_local(),
            finished: finished.naive_local(),
            started_utc: started.naive_utc(),
            finished_utc: finished.naive_utc(),
        }
    }

    /// Timing where local time and UTC coincide.
    pub fn utc(started: NaiveDateTime, finished: NaiveDateTime) -> Self {
        Self {
            started,
            finished,
            started_utc: started,
            finished_utc: finished,
        }
    }

    pub fn elapsed(&self) -> ElapsedParts {
        ElapsedParts::between(self.started_utc, self.finished_utc)
    }
}

/// Calendar difference between two timestamps, largest unit first.
///
/// Months are counted as calendar months from the start, so Jan 31 → Feb 29
/// is one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ElapsedParts {
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl ElapsedParts {
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        if end < start {
            return Self::between(end, start).negated();
        }

        let mut months = i64::from(end.year() - start.year()) * 12
            + i64::from(end.month()) - i64::from(start.month());
        let mut anchor = add_months(start, months);
        while months > 0 && anchor > end {
            months -= 1;
            anchor = add_months(start, months);
        }

        let secs = (end - anchor).num_seconds();
        Self {
            years: months / 12,
            months: months % 12,
            days: secs / SECS_PER_DAY,
            hours: secs % SECS_PER_DAY / 3600,
            minutes: secs % 3600 / 60,
            seconds: secs % 60,
        }
    }

    fn negated(self) -> Self {
        Self {
            years: -self.years,
            months: -self.months,
            days: -self.days,
            hours: -self.hours,
            minutes: -self.minutes,
            seconds: -self.seconds,
        }
    }
}

fn add_months(start: NaiveDateTime, months: i64) -> NaiveDateTime {
    u32::try_from(months)
        .ok()
        .and_then(|m| start.checked_add_months(Months::new(m)))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Render the positive components as `1d, 2h & 3s`.
///
/// Units are `y`, `m`, `d`, `h`, `m`, `s`: months and minutes share `m`.
/// A run with no positive component renders as `0s`.
pub fn render_elapsed(parts: &ElapsedParts) -> String {
    let rendered: Vec<String> = [
        (parts.years, "y"),
        (parts.months, "m"),
        (parts.days, "d"),
        (parts.hours, "h"),
        (parts.minutes, "m"),
        (parts.seconds, "s"),
    ]
    .iter()
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit)| format!("{value}{unit}"))
    .collect();

    match rendered.split_last() {
        None => "0s".to_string(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} & {}", rest.join(", "), last),
    }
}

/// Sort newest purchase first. Ties keep their relative order.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
}

/// Everything printed at the end of a harvest run.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    /// Newest purchase first.
    pub orders: Vec<Order>,
    pub timing: RunTiming,
    /// Resolved lower bound of the query window.
    pub start_date: NaiveDateTime,
    pub throttle: ThrottleState,
    /// `None` when no orders were harvested.
    pub elapsed: Option<String>,
    /// Oldest purchase; only set with more than one order.
    pub first_date: Option<NaiveDateTime>,
    /// Newest purchase; only set with more than one order.
    pub last_date: Option<NaiveDateTime>,
}

impl SummaryReport {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

pub fn summarize(
    orders: &[Order],
    timing: RunTiming,
    start_date: NaiveDateTime,
    throttle: &ThrottleState,
) -> SummaryReport {
    let mut sorted = orders.to_vec();
    sort_newest_first(&mut sorted);

    let elapsed = if sorted.is_empty() {
        None
    } else {
        Some(render_elapsed(&timing.elapsed()))
    };

    let (first_date, last_date) = match sorted.as_slice() {
        [newest, .., oldest] => (Some(oldest.purchase_date), Some(newest.purchase_date)),
        _ => (None, None),
    };

    SummaryReport {
        orders: sorted,
        timing,
        start_date,
        throttle: *throttle,
        elapsed,
        first_date,
        last_date,
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            " ==== TOTAL WAITING: {} ## QUERIES: {} ====",
            self.throttle.total_waited_secs(),
            self.throttle.query_count
        )?;
        writeln!(
            f,
            "{} <--> {}",
            self.timing.started.format("%H:%M:%S"),
            self.timing.finished.format("%H:%M:%S")
        )?;

        if self.orders.is_empty() {
            writeln!(f, "No orders for the selected period.")?;
        } else {
            writeln!(f, "Collected {} orders", self.orders.len())?;
            for order in &self.orders {
                writeln!(f, "{order}")?;
            }
        }

        writeln!(f, "START DATE: {}", self.start_date.format("%Y-%m-%d %H:%M"))?;
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            writeln!(f, "FIRST DATE: {}", first.format("%Y-%m-%d %H:%M"))?;
            writeln!(f, "LAST DATE: {}", last.format("%Y-%m-%d %H:%M"))?;
        }
        if let Some(elapsed) = &self.elapsed {
            writeln!(f, "ELAPSED TIME: {elapsed}")?;
        }
        Ok(())
    }
}
