use crate::constants::{SECONDS_PER_DAY, SECONDS_PER_HOUR};

/// UTC hour of day (0-23) for a unix timestamp.
pub fn hour_of_day(timestamp: i64) -> u8 {
    (timestamp.rem_euclid(SECONDS_PER_DAY) / SECONDS_PER_HOUR) as u8
}

/// Days since the unix epoch.
pub fn day_index(timestamp: i64) -> i64 {
    timestamp.div_euclid(SECONDS_PER_DAY)
}

/// Unix timestamp of 00:00 UTC on the day containing `timestamp`.
pub fn day_start(timestamp: i64) -> i64 {
    timestamp - timestamp.rem_euclid(SECONDS_PER_DAY)
}

/// Day of week for a day index, 0 = Monday. 1970-01-01 was a Thursday.
pub fn weekday(day: i64) -> u8 {
    (day + 3).rem_euclid(7) as u8
}

/// Whether `hour` falls in the half-open window `[start, end)`.
/// A window with `end < start` wraps past midnight.
pub fn in_peak_window(hour: u8, start: u8, end: u8) -> bool {
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_of_day_utc() {
        assert_eq!(hour_of_day(0), 0);
        assert_eq!(hour_of_day(2 * 3_600 + 59), 2);
        assert_eq!(hour_of_day(SECONDS_PER_DAY * 10 + 14 * 3_600), 14);
        assert_eq!(hour_of_day(-1), 23);
    }

    #[test]
    fn weekday_from_epoch() {
        // 1970-01-01 Thursday, 1970-01-05 Monday
        assert_eq!(weekday(0), 3);
        assert_eq!(weekday(4), 0);
        assert_eq!(weekday(day_index(1_700_000_000)), 1); // 2023-11-14, Tuesday
    }

    #[test]
    fn day_start_floors_to_midnight() {
        assert_eq!(day_start(1_704_067_200 + 3_599), 1_704_067_200);
        assert_eq!(day_start(1_704_067_200), 1_704_067_200);
        assert_eq!(day_start(-1), -SECONDS_PER_DAY);
    }

    #[test]
    fn peak_window_is_half_open() {
        assert!(!in_peak_window(8, 9, 17));
        assert!(in_peak_window(9, 9, 17));
        assert!(in_peak_window(16, 9, 17));
        assert!(!in_peak_window(17, 9, 17));
    }

    #[test]
    fn peak_window_wraps_midnight() {
        assert!(in_peak_window(22, 22, 2));
        assert!(in_peak_window(23, 22, 2));
        assert!(in_peak_window(0, 22, 2));
        assert!(in_peak_window(1, 22, 2));
        assert!(!in_peak_window(2, 22, 2));
        assert!(!in_peak_window(12, 22, 2));
    }
}
