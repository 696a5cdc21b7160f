//! Pure date-range and pricing arithmetic for the booking engine.
//!
//! Ranges are half-open `[start, end)`: a booking that starts exactly when
//! another ends does not overlap it, so back-to-back rentals are allowed.

use chrono::{DateTime, Utc};

/// Milliseconds in one calendar day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Returns whether a rental period is well formed (`end > start`).
pub fn valid_period(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    end > start
}

/// Half-open interval intersection test.
///
/// This is the sole conflict-detection rule: touching endpoints are not an
/// overlap.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Number of billable days: the calendar-day ceiling of the period length.
///
/// Matches the booking-days estimate shown to the client before payment, so
/// a period spilling into a partial day bills the whole day.
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds().max(0);
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Total price for a period at the given daily rate.
pub fn total_price(start: DateTime<Utc>, end: DateTime<Utc>, price_per_day: f64) -> f64 {
    rental_days(start, end) as f64 * price_per_day
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn three_whole_days_at_fifty_cost_150() {
        let start = date(2024, 1, 1);
        let end = date(2024, 1, 4);

        assert_eq!(rental_days(start, end), 3);
        assert_eq!(total_price(start, end, 50.0), 150.0);
    }

    #[test]
    fn partial_day_bills_a_whole_day() {
        let start = date(2024, 1, 1);
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap();

        assert_eq!(rental_days(start, end), 2);
        assert_eq!(total_price(start, end, 50.0), 100.0);
    }

    #[test]
    fn contained_range_overlaps() {
        // Booked 01-01 → 01-04; request 01-02 → 01-03 must conflict
        assert!(overlaps(
            date(2024, 1, 2),
            date(2024, 1, 3),
            date(2024, 1, 1),
            date(2024, 1, 4),
        ));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        // Back-to-back: request starting the day the other ends is allowed
        assert!(!overlaps(
            date(2024, 1, 4),
            date(2024, 1, 5),
            date(2024, 1, 1),
            date(2024, 1, 4),
        ));
        assert!(!overlaps(
            date(2023, 12, 30),
            date(2024, 1, 1),
            date(2024, 1, 1),
            date(2024, 1, 4),
        ));
    }

    #[test]
    fn symmetric_partial_overlaps_conflict() {
        let (r1s, r1e) = (date(2024, 1, 1), date(2024, 1, 4));
        assert!(overlaps(date(2024, 1, 3), date(2024, 1, 6), r1s, r1e));
        assert!(overlaps(date(2023, 12, 30), date(2024, 1, 2), r1s, r1e));
    }

    #[test]
    fn zero_length_period_is_invalid() {
        let day = date(2024, 1, 1);
        assert!(!valid_period(day, day));
        assert!(!valid_period(date(2024, 1, 2), day));
        assert!(valid_period(day, date(2024, 1, 2)));
    }
}
