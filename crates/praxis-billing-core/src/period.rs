//! Billing period arithmetic
//!
//! Pure date math; nothing here mutates state. Periods are calendar-correct:
//! adding a month to Jan 31 clamps to the last day of February, it never
//! spills into March. Windows are half-open `[start, end)` everywhere.

use chrono::{DateTime, Datelike, Months, Utc};

use praxis_types::BillingCadence;

/// Compute the end of a billing period starting at `start`.
///
/// Day-of-month is preserved where the target month has that day and clamped
/// to the month's last day otherwise (Jan 31 -> Feb 28/29, Feb 29 -> Feb 28 in
/// non-leap years). Returns `None` only on date overflow.
pub fn period_end(start: DateTime<Utc>, cadence: BillingCadence) -> Option<DateTime<Utc>> {
    start.checked_add_months(Months::new(cadence.months()))
}

/// The calendar-month window containing `now`: first instant of the month
/// through the first instant of the next month.
///
/// Used for free-plan metering, where no subscription row carries a period.
pub fn calendar_month_window(now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = now
        .date_naive()
        .with_day(1)?
        .and_hms_opt(0, 0, 0)?
        .and_utc();
    let end = start.checked_add_months(Months::new(1))?;
    Some((start, end))
}

/// Whether `at` falls inside the half-open window `[start, end)`
pub fn in_window(start: DateTime<Utc>, end: DateTime<Utc>, at: DateTime<Utc>) -> bool {
    start <= at && at < end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_monthly_clamps_to_february() {
        // Non-leap year
        assert_eq!(
            period_end(ts("2025-01-31T09:30:00Z"), BillingCadence::Monthly).unwrap(),
            ts("2025-02-28T09:30:00Z")
        );
        // Leap year
        assert_eq!(
            period_end(ts("2024-01-31T09:30:00Z"), BillingCadence::Monthly).unwrap(),
            ts("2024-02-29T09:30:00Z")
        );
    }

    #[test]
    fn test_monthly_preserves_day_when_valid() {
        assert_eq!(
            period_end(ts("2025-03-15T00:00:00Z"), BillingCadence::Monthly).unwrap(),
            ts("2025-04-15T00:00:00Z")
        );
    }

    #[test]
    fn test_quarterly_clamps() {
        assert_eq!(
            period_end(ts("2025-01-31T00:00:00Z"), BillingCadence::Quarterly).unwrap(),
            ts("2025-04-30T00:00:00Z")
        );
        assert_eq!(
            period_end(ts("2025-02-10T00:00:00Z"), BillingCadence::Quarterly).unwrap(),
            ts("2025-05-10T00:00:00Z")
        );
    }

    #[test]
    fn test_yearly_clamps_leap_day() {
        assert_eq!(
            period_end(ts("2024-02-29T12:00:00Z"), BillingCadence::Yearly).unwrap(),
            ts("2025-02-28T12:00:00Z")
        );
        assert_eq!(
            period_end(ts("2025-06-01T00:00:00Z"), BillingCadence::Yearly).unwrap(),
            ts("2026-06-01T00:00:00Z")
        );
    }

    #[test]
    fn test_calendar_month_window() {
        let (start, end) = calendar_month_window(ts("2025-03-17T15:42:00Z")).unwrap();
        assert_eq!(start, ts("2025-03-01T00:00:00Z"));
        assert_eq!(end, ts("2025-04-01T00:00:00Z"));
    }

    #[test]
    fn test_calendar_month_window_december_rolls_year() {
        let (start, end) = calendar_month_window(ts("2025-12-31T23:59:59Z")).unwrap();
        assert_eq!(start, ts("2025-12-01T00:00:00Z"));
        assert_eq!(end, ts("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn test_window_is_half_open() {
        let start = ts("2025-03-01T00:00:00Z");
        let end = ts("2025-04-01T00:00:00Z");
        assert!(in_window(start, end, start));
        assert!(!in_window(start, end, end));
    }
}
