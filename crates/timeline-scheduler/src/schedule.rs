//! Grid-aligned next-run computation
//!
//! All run times for a workflow lie on the grid
//! `start_time + k * interval_seconds`. Re-scheduling is always computed
//! relative to a reference instant ("now" in production), so a slow or late
//! invocation never shifts the grid: the next run lands on the next grid
//! point after the reference, not `reference + interval`.

use std::num::NonZeroU32;

use chrono::{DateTime, Duration, Utc};

/// Compute the next run instant strictly after `reference`.
///
/// If the schedule has not started yet (`reference < start_time`), the
/// first run is `start_time` itself. Otherwise the result is
/// `start_time + k * interval_seconds` for the smallest `k >= 1` that lands
/// strictly after `reference`.
///
/// Elapsed time is floored at millisecond precision so a reference a
/// fraction of a second past a grid point still advances a full period.
///
/// Deterministic; no side effects.
pub fn next_run_after(
    start_time: DateTime<Utc>,
    interval_seconds: NonZeroU32,
    reference: DateTime<Utc>,
) -> DateTime<Utc> {
    if reference < start_time {
        return start_time;
    }
    let interval_ms = i64::from(interval_seconds.get()) * 1000;
    let elapsed_ms = (reference - start_time).num_milliseconds();
    let periods_passed = elapsed_ms.div_euclid(interval_ms) + 1;
    start_time + Duration::milliseconds(periods_passed * interval_ms)
}

/// [`next_run_after`] with the current UTC instant as the reference.
pub fn next_run_from_now(start_time: DateTime<Utc>, interval_seconds: NonZeroU32) -> DateTime<Utc> {
    next_run_after(start_time, interval_seconds, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn secs(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn before_start_returns_start_unchanged() {
        let start = utc("2024-01-01T00:00:00Z");
        let reference = utc("2023-12-31T23:59:59Z");
        assert_eq!(next_run_after(start, secs(3600), reference), start);
    }

    #[test]
    fn first_period_after_start() {
        // Hourly schedule invoked five seconds past the start.
        let start = utc("2024-01-01T00:00:00Z");
        let reference = utc("2024-01-01T00:00:05Z");
        assert_eq!(
            next_run_after(start, secs(3600), reference),
            utc("2024-01-01T01:00:00Z")
        );
    }

    #[test]
    fn reference_exactly_on_grid_advances_one_period() {
        let start = utc("2024-01-01T00:00:00Z");
        assert_eq!(
            next_run_after(start, secs(3600), start),
            utc("2024-01-01T01:00:00Z")
        );
        assert_eq!(
            next_run_after(start, secs(3600), utc("2024-01-01T02:00:00Z")),
            utc("2024-01-01T03:00:00Z")
        );
    }

    #[test]
    fn result_is_grid_aligned_and_strictly_greater() {
        let start = utc("2024-01-01T00:00:00Z");
        let interval = secs(90);
        for offset_s in [0i64, 1, 89, 90, 91, 7200, 86399] {
            let reference = start + Duration::seconds(offset_s);
            let next = next_run_after(start, interval, reference);
            assert!(next > reference, "offset {offset_s}");
            let elapsed = (next - start).num_seconds();
            assert_eq!(elapsed % 90, 0, "offset {offset_s} not on grid");
            assert!(elapsed >= 90);
        }
    }

    #[test]
    fn fractional_seconds_floor_correctly() {
        let start = utc("2024-01-01T00:00:00Z");
        // 1.5s past the start with a 1s interval: one full period has passed,
        // so the next run is at +2s, not +1.5s or +3s.
        let reference = start + Duration::milliseconds(1500);
        assert_eq!(
            next_run_after(start, secs(1), reference),
            start + Duration::seconds(2)
        );
    }

    #[test]
    fn repeated_rescheduling_does_not_drift() {
        let start = utc("2024-01-01T00:00:00Z");
        let interval = secs(300);
        let mut reference = utc("2024-01-01T00:03:21Z");
        let mut previous = None;
        for _ in 0..1000 {
            let next = next_run_after(start, interval, reference);
            assert!(next > reference);
            assert_eq!((next - start).num_seconds() % 300, 0);
            if let Some(prev) = previous {
                assert_eq!(next - prev, Duration::seconds(300));
            }
            previous = Some(next);
            reference = next;
        }
    }

    #[test]
    fn next_run_from_now_lands_in_the_future_on_the_grid() {
        let start = utc("2024-01-01T00:00:00Z");
        let next = next_run_from_now(start, secs(60));
        assert!(next > Utc::now());
        assert_eq!((next - start).num_seconds() % 60, 0);
    }

    #[test]
    fn skips_missed_periods_instead_of_backfilling() {
        // A reference far past the start lands on the next grid point, not
        // on every period missed in between.
        let start = utc("2024-01-01T00:00:00Z");
        let reference = utc("2024-03-15T10:17:42Z");
        let next = next_run_after(start, secs(3600), reference);
        assert_eq!(next, utc("2024-03-15T11:00:00Z"));
    }
}
