//! Property tests for pacing, range resolution and the run summary.
//!
//! Uses proptest to verify:
//! 1. Pacing totals: the waited total is the sum of the scheduled pauses
//! 2. Lookback windows: `days_ago` always yields an open-ended window
//! 3. Sorting: newest first, stable, and idempotent
//! 4. Elapsed rendering: components stay within their units

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use orderharvest_core::range::{self, RangeRequest};
use orderharvest_core::report::{render_elapsed, sort_newest_first, ElapsedParts};
use orderharvest_core::throttle::{PacingSchedule, Throttle};
use orderharvest_core::Order;
use proptest::prelude::*;
use std::time::Duration;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_schedule() -> impl Strategy<Value = PacingSchedule> {
    (1..40u64, 1..60u64).prop_map(|(every, modulus)| PacingSchedule { every, modulus })
}

fn arb_timestamp() -> impl Strategy<Value = NaiveDateTime> {
    // 2015-01-01 .. ~2035
    (0..630_000_000i64).prop_map(|secs| base() + TimeDelta::seconds(secs))
}

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn order(id: usize, purchased: NaiveDateTime) -> Order {
    Order {
        id: format!("O{id}"),
        status: "Shipped".into(),
        shipped_item_count: 1,
        unshipped_item_count: 0,
        purchase_date: purchased,
        total_amount: None,
        items: Vec::new(),
    }
}

// ── 1. Pacing Totals ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn waited_total_matches_schedule(schedule in arb_schedule(), calls in 0..300u64) {
        let mut slept = Duration::ZERO;
        let mut throttle = Throttle::with_sleeper(schedule, |d: Duration| slept += d);

        for n in 1..=calls {
            let wait = throttle.before_call().as_secs();
            if n % schedule.every != 0 {
                prop_assert_eq!(wait, 0);
            }
            prop_assert!(wait < schedule.modulus);
        }

        let state = throttle.into_state();
        let expected: u64 = (1..=calls).map(|n| schedule.wait_secs(n)).sum();
        prop_assert_eq!(state.query_count, calls);
        prop_assert_eq!(state.total_waited_secs(), expected);
        prop_assert_eq!(slept.as_secs(), expected);
    }
}

// ── 2. Lookback Windows ──────────────────────────────────────────────

proptest! {
    #[test]
    fn days_ago_is_relative_to_now(now in arb_timestamp(), days in 0..3650i64) {
        let request = RangeRequest {
            days_ago: Some(days),
            start: Some("2001-01-01".into()),
            end: Some("2001-02-01".into()),
            ..Default::default()
        };
        let filter = range::resolve(&request, now).unwrap();
        prop_assert_eq!(filter.created_after, now - TimeDelta::days(days));
        prop_assert_eq!(filter.created_before, None);
    }
}

// ── 3. Sorting ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn sorted_newest_first_and_idempotent(
        dates in prop::collection::vec(arb_timestamp(), 0..40),
    ) {
        let mut orders: Vec<Order> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| order(i, *d))
            .collect();
        sort_newest_first(&mut orders);

        for pair in orders.windows(2) {
            prop_assert!(pair[0].purchase_date >= pair[1].purchase_date);
            if pair[0].purchase_date == pair[1].purchase_date {
                // Stable: ids were assigned in input order.
                let a: usize = pair[0].id[1..].parse().unwrap();
                let b: usize = pair[1].id[1..].parse().unwrap();
                prop_assert!(a < b);
            }
        }

        let once = orders.clone();
        sort_newest_first(&mut orders);
        prop_assert_eq!(once, orders);
    }
}

// ── 4. Elapsed Rendering ─────────────────────────────────────────────

proptest! {
    #[test]
    fn elapsed_components_stay_in_range(start in arb_timestamp(), secs in 0..200_000_000i64) {
        let parts = ElapsedParts::between(start, start + TimeDelta::seconds(secs));
        prop_assert!(parts.years >= 0);
        prop_assert!((0..12).contains(&parts.months));
        prop_assert!((0..31).contains(&parts.days));
        prop_assert!((0..24).contains(&parts.hours));
        prop_assert!((0..60).contains(&parts.minutes));
        prop_assert!((0..60).contains(&parts.seconds));
    }

    #[test]
    fn single_component_has_no_separators(slot in 0..6usize, value in 1..1000i64) {
        let mut parts = ElapsedParts::default();
        match slot {
            0 => parts.years = value,
            1 => parts.months = value,
            2 => parts.days = value,
            3 => parts.hours = value,
            4 => parts.minutes = value,
            _ => parts.seconds = value,
        }
        let rendered = render_elapsed(&parts);
        prop_assert!(!rendered.contains(" & "));
        prop_assert!(!rendered.contains(", "));
        prop_assert!(rendered.starts_with(&value.to_string()));
    }
}
