use chrono::NaiveDate;

use crate::timeline::date_math;

/// The visible date range of the chart: `day_count` days starting at `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    pub origin: NaiveDate,
    pub day_count: u32,
}

impl TimelineWindow {
    pub fn new(origin: NaiveDate, day_count: u32) -> Self {
        Self {
            origin,
            day_count: day_count.max(1),
        }
    }

    /// The last date shown (inclusive).
    pub fn last_day(&self) -> NaiveDate {
        date_math::add_days(self.origin, i64::from(self.day_count) - 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.origin && date <= self.last_day()
    }

    /// Signed day offset of `date` from the window origin.
    pub fn offset_of(&self, date: NaiveDate) -> i64 {
        date_math::days_between(self.origin, date)
    }

    pub fn date_at(&self, offset: i64) -> NaiveDate {
        date_math::add_days(self.origin, offset)
    }
}

/// One column of the day header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayDescriptor {
    pub date: NaiveDate,
    pub offset: u32,
    pub is_today: bool,
    pub is_weekend: bool,
}

/// A run of consecutive header days sharing one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSpan {
    /// e.g. "Jun 2024".
    pub label: String,
    pub start_offset: u32,
    pub day_count: u32,
}

/// Horizontal scale of the chart (controls zoom level).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale {
    pub pixels_per_day: f32,
    pub min_pixels_per_day: f32,
    pub max_pixels_per_day: f32,
}

impl PixelScale {
    /// Inverted bounds are swapped; a NaN zoom level starts at the minimum.
    pub fn new(pixels_per_day: f32, min_pixels_per_day: f32, max_pixels_per_day: f32) -> Self {
        let (min_pixels_per_day, max_pixels_per_day) = if min_pixels_per_day <= max_pixels_per_day {
            (min_pixels_per_day, max_pixels_per_day)
        } else {
            (max_pixels_per_day, min_pixels_per_day)
        };
        let pixels_per_day = if pixels_per_day.is_nan() {
            min_pixels_per_day
        } else {
            pixels_per_day.max(min_pixels_per_day).min(max_pixels_per_day)
        };
        Self {
            pixels_per_day,
            min_pixels_per_day,
            max_pixels_per_day,
        }
    }

    /// Convert a date to an x-pixel offset from the window origin.
    pub fn date_to_x(&self, window: &TimelineWindow, date: NaiveDate) -> f32 {
        window.offset_of(date) as f32 * self.pixels_per_day
    }

    /// Total width in pixels for the window.
    pub fn total_width(&self, window: &TimelineWindow) -> f32 {
        window.day_count as f32 * self.pixels_per_day
    }

    /// Zoom in (increase pixels per day).
    pub fn zoom_in(&mut self) {
        self.pixels_per_day = (self.pixels_per_day * 1.2).min(self.max_pixels_per_day);
    }

    /// Zoom out (decrease pixels per day).
    pub fn zoom_out(&mut self) {
        self.pixels_per_day = (self.pixels_per_day / 1.2).max(self.min_pixels_per_day);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    #[test]
    fn window_bounds_are_inclusive_of_last_day() {
        let window = TimelineWindow::new(d(6, 1), 30);
        assert_eq!(window.last_day(), d(6, 30));
        assert!(window.contains(d(6, 30)));
        assert!(!window.contains(d(7, 1)));
        assert!(!window.contains(d(5, 31)));
    }

    #[test]
    fn pixel_mapping_uses_whole_days() {
        let window = TimelineWindow::new(d(6, 1), 30);
        let scale = PixelScale::new(20.0, 2.0, 80.0);
        assert_eq!(scale.date_to_x(&window, d(6, 4)), 60.0);
        assert_eq!(scale.total_width(&window), 600.0);
    }

    #[test]
    fn unchecked_bounds_do_not_panic() {
        let swapped = PixelScale::new(500.0, 80.0, 2.0);
        assert_eq!(
            (swapped.min_pixels_per_day, swapped.max_pixels_per_day),
            (2.0, 80.0)
        );
        assert_eq!(swapped.pixels_per_day, 80.0);

        let nan_level = PixelScale::new(f32::NAN, 2.0, 80.0);
        assert_eq!(nan_level.pixels_per_day, 2.0);

        let nan_bound = PixelScale::new(18.0, f32::NAN, 80.0);
        assert!(nan_bound.pixels_per_day.is_finite());
    }

    #[test]
    fn zoom_stays_within_bounds() {
        let mut scale = PixelScale::new(70.0, 2.0, 80.0);
        scale.zoom_in();
        assert_eq!(scale.pixels_per_day, 80.0);
        let mut scale = PixelScale::new(2.2, 2.0, 80.0);
        scale.zoom_out();
        assert_eq!(scale.pixels_per_day, 2.0);
    }
}
