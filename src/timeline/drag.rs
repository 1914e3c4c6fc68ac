//! Pointer drag state machine for timeline bars.
//!
//! Each pointer move is measured against the pointer position and item dates
//! captured when the drag began, never against the previous move, so rounding
//! to whole days cannot accumulate drift.

use chrono::NaiveDate;

use crate::error::{Result, TimelineError};
use crate::model::{ItemId, ScheduledItem};
use crate::timeline::date_math;

/// Which part of a bar is being dragged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DragHandle {
    /// The bar body: shifts start and end together.
    Move,
    /// Left edge: adjusts the start date only.
    ResizeStart,
    /// Right edge: adjusts the end date only.
    ResizeEnd,
}

/// An active drag. Exists only between pointer-down and pointer-up.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub item_id: ItemId,
    pub handle: DragHandle,
    pub origin_pointer_x: f32,
    pub origin_start: NaiveDate,
    pub origin_end: NaiveDate,
    tentative_start: NaiveDate,
    tentative_end: NaiveDate,
}

impl DragSession {
    fn new(item: &ScheduledItem, handle: DragHandle, pointer_x: f32) -> Self {
        Self {
            item_id: item.id.clone(),
            handle,
            origin_pointer_x: pointer_x,
            origin_start: item.start,
            origin_end: item.end,
            tentative_start: item.start,
            tentative_end: item.end,
        }
    }

    /// The last accepted (start, end).
    pub fn tentative(&self) -> (NaiveDate, NaiveDate) {
        (self.tentative_start, self.tentative_end)
    }

    pub fn is_changed(&self) -> bool {
        self.tentative_start != self.origin_start || self.tentative_end != self.origin_end
    }
}

/// Result of a completed drag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragOutcome {
    pub item_id: ItemId,
    pub handle: DragHandle,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub origin_start: NaiveDate,
    pub origin_end: NaiveDate,
}

impl DragOutcome {
    pub fn changed(&self) -> bool {
        self.start != self.origin_start || self.end != self.origin_end
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn active(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active().is_some()
    }

    pub fn is_dragging_item(&self, id: &ItemId) -> bool {
        self.active().is_some_and(|session| &session.item_id == id)
    }

    /// Start a drag. Ignored (returns `false`) while another drag is active.
    pub fn begin(&mut self, item: &ScheduledItem, handle: DragHandle, pointer_x: f32) -> bool {
        if let DragState::Dragging(session) = &self.state {
            log::debug!(
                "ignoring drag start on {} while {} is being dragged",
                item.id,
                session.item_id
            );
            return false;
        }
        self.state = DragState::Dragging(DragSession::new(item, handle, pointer_x));
        true
    }

    /// Apply a pointer move.
    ///
    /// Returns the accepted `(start, end)`, `Ok(None)` when idle, or
    /// `ConstraintViolation` when a resize would invert the range; in that case
    /// the previous tentative range stays in place.
    pub fn drag_to(
        &mut self,
        pointer_x: f32,
        pixels_per_day: f32,
    ) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let DragState::Dragging(session) = &mut self.state else {
            return Ok(None);
        };

        let delta = drag_days(pointer_x - session.origin_pointer_x, pixels_per_day);
        let (start, end) = match session.handle {
            DragHandle::Move => (
                date_math::add_days(session.origin_start, delta),
                date_math::add_days(session.origin_end, delta),
            ),
            DragHandle::ResizeStart => (
                date_math::add_days(session.origin_start, delta),
                session.tentative_end,
            ),
            DragHandle::ResizeEnd => (
                session.tentative_start,
                date_math::add_days(session.origin_end, delta),
            ),
        };

        if start > end {
            return Err(TimelineError::ConstraintViolation {
                item_id: session.item_id.clone(),
                start,
                end,
            });
        }

        session.tentative_start = start;
        session.tentative_end = end;
        Ok(Some((start, end)))
    }

    /// Pointer released: end the session and report where it landed.
    pub fn finish(&mut self) -> Option<DragOutcome> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => Some(DragOutcome {
                item_id: session.item_id,
                handle: session.handle,
                start: session.tentative_start,
                end: session.tentative_end,
                origin_start: session.origin_start,
                origin_end: session.origin_end,
            }),
            DragState::Idle => None,
        }
    }

    /// Abort the drag (focus loss, escape). The caller restores the origin values.
    pub fn cancel(&mut self) -> Option<DragSession> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }
}

pub fn drag_days(delta_x: f32, pixels_per_day: f32) -> i64 {
    if !delta_x.is_finite() || !pixels_per_day.is_finite() || pixels_per_day <= 0.0 {
        return 0;
    }
    (delta_x / pixels_per_day).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const PPD: f32 = 20.0;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn item() -> ScheduledItem {
        ScheduledItem::new("a", "A", d(10), d(14))
    }

    #[test]
    fn move_shifts_both_ends_from_origin() {
        let mut drag = DragController::new();
        assert!(drag.begin(&item(), DragHandle::Move, 100.0));
        assert_eq!(drag.drag_to(129.0, PPD).unwrap(), Some((d(11), d(15))));
        // Measured from the origin, not from the previous tick.
        assert_eq!(drag.drag_to(131.0, PPD).unwrap(), Some((d(12), d(16))));
        assert_eq!(drag.drag_to(60.0, PPD).unwrap(), Some((d(8), d(12))));
    }

    #[test]
    fn resize_start_cannot_cross_end() {
        let mut drag = DragController::new();
        drag.begin(&item(), DragHandle::ResizeStart, 0.0);
        assert_eq!(drag.drag_to(80.0, PPD).unwrap(), Some((d(14), d(14))));

        let err = drag.drag_to(100.0, PPD).unwrap_err();
        assert!(matches!(err, TimelineError::ConstraintViolation { .. }));
        // Rejection is idempotent: the last valid value is kept.
        assert!(drag.drag_to(200.0, PPD).is_err());
        assert_eq!(drag.active().unwrap().tentative(), (d(14), d(14)));
    }

    #[test]
    fn resize_end_cannot_cross_start() {
        let mut drag = DragController::new();
        drag.begin(&item(), DragHandle::ResizeEnd, 0.0);
        assert_eq!(drag.drag_to(-40.0, PPD).unwrap(), Some((d(10), d(12))));
        assert!(drag.drag_to(-100.0, PPD).is_err());
        assert_eq!(drag.active().unwrap().tentative(), (d(10), d(12)));
    }

    #[test]
    fn second_begin_is_ignored_while_dragging() {
        let mut drag = DragController::new();
        let other = ScheduledItem::new("b", "B", d(1), d(2));
        assert!(drag.begin(&item(), DragHandle::Move, 0.0));
        assert!(!drag.begin(&other, DragHandle::Move, 0.0));
        assert!(drag.is_dragging_item(&ItemId::new("a")));
    }

    #[test]
    fn finish_reports_outcome_and_returns_to_idle() {
        let mut drag = DragController::new();
        drag.begin(&item(), DragHandle::Move, 0.0);
        drag.drag_to(5.0, PPD).unwrap();
        let outcome = drag.finish().unwrap();
        assert!(!outcome.changed());
        assert_eq!(drag.state(), &DragState::Idle);
        assert!(drag.finish().is_none());
    }

    #[test]
    fn idle_moves_are_noops() {
        let mut drag = DragController::new();
        assert_eq!(drag.drag_to(50.0, PPD).unwrap(), None);
        assert!(drag.cancel().is_none());
    }

    #[test]
    fn degenerate_scale_does_not_move() {
        let mut drag = DragController::new();
        drag.begin(&item(), DragHandle::Move, 0.0);
        assert_eq!(drag.drag_to(500.0, 0.0).unwrap(), Some((d(10), d(14))));
    }
}
