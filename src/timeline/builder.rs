//! Visible window and header computation.
//!
//! The window always opens a few days before "today" and runs a trailing margin
//! past the later of today and the latest item end, so a chart of finished
//! work still leaves room to plan forward.

use chrono::{Datelike, NaiveDate};

use crate::model::{DayDescriptor, MonthSpan, ScheduledItem, TimelineWindow};
use crate::timeline::date_math;

/// Days of padding around the scheduled range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineMargins {
    pub lead_days: u32,
    pub trailing_days: u32,
}

impl Default for TimelineMargins {
    fn default() -> Self {
        Self {
            lead_days: 3,
            trailing_days: 14,
        }
    }
}

/// A computed window together with the "today" it was computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    window: TimelineWindow,
    today: NaiveDate,
}

impl Timeline {
    pub fn build(items: &[ScheduledItem], today: NaiveDate, margins: TimelineMargins) -> Self {
        let origin = date_math::add_days(today, -i64::from(margins.lead_days));
        let trailing = i64::from(margins.trailing_days);

        let horizon = items
            .iter()
            .map(|item| item.end)
            .max()
            .map_or(today, |latest| latest.max(today));
        let end = date_math::add_days(horizon, trailing);

        let day_count = date_math::days_between(origin, end).clamp(1, i64::from(u32::MAX)) as u32;

        Self {
            window: TimelineWindow::new(origin, day_count),
            today,
        }
    }

    pub fn window(&self) -> TimelineWindow {
        self.window
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Lazily yields one descriptor per visible day.
    pub fn days(&self) -> Days {
        Days {
            window: self.window,
            today: self.today,
            next: 0,
        }
    }

    /// Group consecutive days of the same calendar month.
    pub fn month_spans(&self) -> Vec<MonthSpan> {
        let mut spans: Vec<MonthSpan> = Vec::new();
        let mut current: Option<(i32, u32)> = None;

        for day in self.days() {
            let key = (day.date.year(), day.date.month());
            if current == Some(key) {
                if let Some(span) = spans.last_mut() {
                    span.day_count += 1;
                    continue;
                }
            }
            spans.push(MonthSpan {
                label: day.date.format("%b %Y").to_string(),
                start_offset: day.offset,
                day_count: 1,
            });
            current = Some(key);
        }

        spans
    }
}

#[derive(Debug, Clone)]
pub struct Days {
    window: TimelineWindow,
    today: NaiveDate,
    next: u32,
}

impl Iterator for Days {
    type Item = DayDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.window.day_count {
            return None;
        }
        let offset = self.next;
        self.next += 1;
        let date = self.window.date_at(i64::from(offset));
        Some(DayDescriptor {
            date,
            offset,
            is_today: date == self.today,
            is_weekend: date_math::is_weekend(date),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.window.day_count - self.next.min(self.window.day_count)) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Days {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn item(id: &str, start: NaiveDate, end: NaiveDate) -> ScheduledItem {
        ScheduledItem::new(id, id, start, end)
    }

    #[test]
    fn empty_list_runs_trailing_margin_past_today() {
        let timeline = Timeline::build(&[], d(6, 10), TimelineMargins::default());
        let window = timeline.window();
        assert_eq!(window.origin, d(6, 7));
        assert_eq!(window.offset_of(d(6, 10)) + 14, i64::from(window.day_count));
    }

    #[test]
    fn window_extends_past_latest_end() {
        let items = [item("a", d(6, 1), d(6, 5)), item("b", d(6, 20), d(7, 2))];
        let timeline = Timeline::build(&items, d(6, 10), TimelineMargins::default());
        let window = timeline.window();
        assert!(window.contains(d(6, 10)));
        assert_eq!(window.date_at(i64::from(window.day_count)), d(7, 16));
    }

    #[test]
    fn past_only_items_still_look_forward() {
        let items = [item("a", d(1, 1), d(1, 31))];
        let timeline = Timeline::build(&items, d(6, 10), TimelineMargins::default());
        let window = timeline.window();
        assert_eq!(window.origin, d(6, 7));
        assert_eq!(window.day_count, 17);
    }

    #[test]
    fn days_flag_today_and_weekends() {
        let timeline = Timeline::build(&[], d(6, 3), TimelineMargins::default());
        let days: Vec<_> = timeline.days().collect();
        assert_eq!(days.len(), timeline.days().len());
        assert_eq!(days.len() as u32, timeline.window().day_count);
        let today = days.iter().find(|day| day.is_today).unwrap();
        assert_eq!(today.date, d(6, 3));
        assert_eq!(today.offset, 3);
        // 2024-06-01 is a Saturday.
        assert!(days[1].is_weekend && days[2].is_weekend);
        assert!(!days[3].is_weekend);
    }

    #[test]
    fn month_spans_cover_every_day() {
        let margins = TimelineMargins {
            lead_days: 3,
            trailing_days: 40,
        };
        let timeline = Timeline::build(&[], d(5, 30), margins);
        let spans = timeline.month_spans();
        assert_eq!(
            spans,
            vec![
                MonthSpan {
                    label: "May 2024".to_string(),
                    start_offset: 0,
                    day_count: 5,
                },
                MonthSpan {
                    label: "Jun 2024".to_string(),
                    start_offset: 5,
                    day_count: 30,
                },
                MonthSpan {
                    label: "Jul 2024".to_string(),
                    start_offset: 35,
                    day_count: 8,
                },
            ]
        );
        let total: u32 = spans.iter().map(|span| span.day_count).sum();
        assert_eq!(total, timeline.window().day_count);
    }
}
