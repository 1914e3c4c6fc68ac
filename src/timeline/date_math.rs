//! Calendar-day arithmetic. `NaiveDate` carries no time of day or timezone,
//! so every difference is an exact whole number of days.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{Result, TimelineError};

/// Signed number of days from `a` to `b` (negative when `b` is earlier).
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

/// Shift a date by `n` days, saturating at the representable range.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    Duration::try_days(n)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if n < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Clamp `date` into `[min, max]`. If the bounds are inverted, `min` wins.
pub fn clamp_date(date: NaiveDate, min: NaiveDate, max: NaiveDate) -> NaiveDate {
    date.min(max).max(min)
}

pub fn to_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// chrono alone accepts unpadded fields ("2024-6-1"), which would not survive a
/// format round-trip, so the shape is checked first.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate> {
    let bytes = input.as_bytes();
    let well_shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_shaped {
        return Err(TimelineError::Parse {
            input: input.to_string(),
        });
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| TimelineError::Parse {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(d(2024, 6, 1), d(2024, 6, 5)), 4);
        assert_eq!(days_between(d(2024, 6, 5), d(2024, 6, 1)), -4);
        assert_eq!(days_between(d(2024, 2, 28), d(2024, 3, 1)), 2);
    }

    #[test]
    fn add_days_saturates() {
        assert_eq!(add_days(d(2024, 12, 30), 3), d(2025, 1, 2));
        assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert_eq!(add_days(NaiveDate::MIN, -1), NaiveDate::MIN);
        assert_eq!(add_days(d(2024, 1, 1), i64::MAX), NaiveDate::MAX);
    }

    #[test]
    fn clamp_date_respects_bounds() {
        let (lo, hi) = (d(2024, 6, 1), d(2024, 6, 30));
        assert_eq!(clamp_date(d(2024, 5, 1), lo, hi), lo);
        assert_eq!(clamp_date(d(2024, 7, 1), lo, hi), hi);
        assert_eq!(clamp_date(d(2024, 6, 15), lo, hi), d(2024, 6, 15));
    }

    #[test]
    fn weekend_detection() {
        assert!(is_weekend(d(2024, 6, 1))); // Saturday
        assert!(is_weekend(d(2024, 6, 2)));
        assert!(!is_weekend(d(2024, 6, 3)));
    }

    #[test]
    fn parse_rejects_loose_shapes() {
        for bad in ["2024-6-1", "2024/06/01", "2024-06-01T00:00", "", "2024-02-30", "+2024-06-0"] {
            assert!(parse_iso_date(bad).is_err(), "{bad} should not parse");
        }
        assert_eq!(parse_iso_date("2024-02-29").unwrap(), d(2024, 2, 29));
    }
}
