//! The timeline engine behind one Gantt view.
//!
//! `TimelineView` keeps two copies of the item list: the last snapshot
//! delivered by the data source (last known good) and a shadow copy that drags
//! and reassignments mutate immediately. Commits flow out through the
//! [`PersistenceGateway`]; their acknowledgments either fold the new values
//! into the snapshot or roll the shadow back to it.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::NaiveDate;

use super::builder::{Days, Timeline, TimelineMargins};
use super::date_math;
use super::drag::{DragController, DragHandle, DragOutcome, DragSession};
use super::lanes::{assign_lanes, LaneAssignment};
use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use crate::model::{
    validate_items, AssigneeId, ItemId, MonthSpan, PixelScale, RawItem, ScheduledItem,
    TimelineWindow,
};
use crate::persistence::{
    CommitAck, CommitField, CommitJob, CommitPayload, PersistenceGateway, Resolution,
};

/// Render-ready placement of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGeometry {
    pub item_id: ItemId,
    pub lane_index: usize,
    /// Distance of the visible bar from the window origin.
    pub pixel_offset: f32,
    /// Visible width; zero when the item lies entirely outside the window.
    pub pixel_length: f32,
    pub is_clipped_at_window_start: bool,
    pub is_clipped_at_window_end: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineLayout {
    /// Ordered by lane, then offset.
    pub items: Vec<ItemGeometry>,
    pub lane_count: usize,
}

/// What an acknowledgment did to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    /// Superseded or for a removed item; ignored.
    Stale,
    Committed(ItemId),
    /// The sink rejected the write and the shadow copy was reverted.
    RolledBack(TimelineError),
}

pub struct TimelineView {
    margins: TimelineMargins,
    scale: PixelScale,
    today: NaiveDate,
    snapshot: Vec<ScheduledItem>,
    shadow: Vec<ScheduledItem>,
    timeline: Timeline,
    timeline_stale: bool,
    drag: DragController,
    gateway: PersistenceGateway,
    quarantined: Vec<TimelineError>,
}

impl TimelineView {
    pub fn new(config: &TimelineConfig, today: NaiveDate) -> Self {
        let margins = config.margins();
        Self {
            margins,
            scale: config.scale(),
            today,
            snapshot: Vec::new(),
            shadow: Vec::new(),
            timeline: Timeline::build(&[], today, margins),
            timeline_stale: false,
            drag: DragController::new(),
            gateway: PersistenceGateway::new(config.delays()),
            quarantined: Vec::new(),
        }
    }

    // --- Snapshot handling ---

    /// Replace the source-of-truth list with a fresh delivery from the data source.
    ///
    /// Malformed records are logged and left out of the layout. Returns the
    /// number of accepted items.
    pub fn replace_snapshot(&mut self, records: &[RawItem]) -> usize {
        let (items, rejected) = validate_items(records);
        for err in &rejected {
            log::warn!("quarantined item record: {err}");
        }
        self.quarantined = rejected;
        let accepted = items.len();
        self.apply_snapshot(items);
        accepted
    }

    /// Replace the source-of-truth list with already validated items.
    ///
    /// Shadow entries of idle items are reset to the new values. Fields with an
    /// active drag or a pending/in-flight commit keep their local value.
    pub fn apply_snapshot(&mut self, items: Vec<ScheduledItem>) {
        let incoming: HashSet<&ItemId> = items.iter().map(|item| &item.id).collect();

        let removed: Vec<ItemId> = self
            .shadow
            .iter()
            .filter(|item| !incoming.contains(&item.id))
            .map(|item| item.id.clone())
            .collect();
        for id in &removed {
            let cancelled = self.gateway.cancel_item(id);
            if self.drag.is_dragging_item(id) {
                self.drag.cancel();
                log::info!("item {id} disappeared mid-drag; drag cancelled");
            }
            if cancelled > 0 {
                log::info!("item {id} removed; cancelled {cancelled} pending commit(s)");
            }
        }

        let mut previous: HashMap<ItemId, ScheduledItem> = std::mem::take(&mut self.shadow)
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        self.shadow = items
            .iter()
            .map(|fresh| {
                let mut merged = fresh.clone();
                if let Some(local) = previous.remove(&fresh.id) {
                    if self.is_field_busy(&fresh.id, CommitField::Dates) {
                        merged.start = local.start;
                        merged.end = local.end;
                    }
                    if self.is_field_busy(&fresh.id, CommitField::Assignee) {
                        merged.assignee_id = local.assignee_id;
                        merged.assignee_label = local.assignee_label;
                    }
                }
                merged
            })
            .collect();
        self.snapshot = items;
        self.invalidate_timeline();
    }

    /// Records rejected by the last [`replace_snapshot`](Self::replace_snapshot).
    pub fn quarantined(&self) -> &[TimelineError] {
        &self.quarantined
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        if today != self.today {
            self.today = today;
            self.invalidate_timeline();
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    fn invalidate_timeline(&mut self) {
        self.timeline_stale = true;
        if !self.drag.is_dragging() {
            self.rebuild_timeline();
        }
    }

    fn rebuild_timeline(&mut self) {
        if self.timeline_stale {
            self.timeline = Timeline::build(&self.shadow, self.today, self.margins);
            self.timeline_stale = false;
        }
    }

    // --- Read side ---

    /// The local editable view, in delivery order.
    pub fn items(&self) -> &[ScheduledItem] {
        &self.shadow
    }

    pub fn item(&self, id: &ItemId) -> Option<&ScheduledItem> {
        self.shadow.iter().find(|item| &item.id == id)
    }

    /// The last known-good list.
    pub fn snapshot(&self) -> &[ScheduledItem] {
        &self.snapshot
    }

    pub fn window(&self) -> TimelineWindow {
        self.timeline.window()
    }

    pub fn days(&self) -> Days {
        self.timeline.days()
    }

    pub fn month_spans(&self) -> Vec<MonthSpan> {
        self.timeline.month_spans()
    }

    pub fn scale(&self) -> PixelScale {
        self.scale
    }

    pub fn scale_mut(&mut self) -> &mut PixelScale {
        &mut self.scale
    }

    pub fn lanes(&self) -> LaneAssignment {
        assign_lanes(&self.shadow)
    }

    /// Pixel placement for every item, clipped to the window.
    pub fn layout(&self) -> TimelineLayout {
        let lanes = self.lanes();
        let window = self.window();
        let last_day = window.last_day();
        let ppd = self.scale.pixels_per_day;
        let day_count = i64::from(window.day_count);

        let mut items: Vec<ItemGeometry> = self
            .shadow
            .iter()
            .filter_map(|item| {
                let lane_index = lanes.lane_of(&item.id)?;
                let visible_start = item.start.max(window.origin);
                let visible_end = item.end.min(last_day);
                let offset_days = window.offset_of(visible_start).clamp(0, day_count);
                let length_days = (date_math::days_between(visible_start, visible_end) + 1).max(0);
                Some(ItemGeometry {
                    item_id: item.id.clone(),
                    lane_index,
                    pixel_offset: offset_days as f32 * ppd,
                    pixel_length: length_days as f32 * ppd,
                    is_clipped_at_window_start: item.start < window.origin,
                    is_clipped_at_window_end: item.end > last_day,
                })
            })
            .collect();

        items.sort_by(|a, b| {
            a.lane_index
                .cmp(&b.lane_index)
                .then(a.pixel_offset.total_cmp(&b.pixel_offset))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        TimelineLayout {
            items,
            lane_count: lanes.lane_count(),
        }
    }

    pub fn geometry(&self) -> Vec<ItemGeometry> {
        self.layout().items
    }

    pub fn active_drag(&self) -> Option<&DragSession> {
        self.drag.active()
    }

    pub fn has_pending_commit(&self, id: &ItemId) -> bool {
        self.gateway.is_busy(id)
    }

    pub fn pending_count(&self) -> usize {
        self.gateway.pending_count()
    }

    pub fn in_flight_count(&self) -> usize {
        self.gateway.in_flight_count()
    }

    /// When the next debounce timer fires.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.gateway.next_deadline()
    }

    fn is_field_busy(&self, id: &ItemId, field: CommitField) -> bool {
        let dragging = field == CommitField::Dates && self.drag.is_dragging_item(id);
        dragging || self.gateway.is_field_busy(id, field)
    }

    fn shadow_mut(&mut self, id: &ItemId) -> Option<&mut ScheduledItem> {
        self.shadow.iter_mut().find(|item| &item.id == id)
    }

    // --- Drag hooks ---

    /// Pointer/touch down on a bar or one of its edges.
    ///
    /// Returns `Ok(false)` if another drag is already running.
    pub fn on_drag_start(
        &mut self,
        item_id: &ItemId,
        handle: DragHandle,
        pointer_x: f32,
    ) -> Result<bool> {
        let item = self
            .shadow
            .iter()
            .find(|item| &item.id == item_id)
            .ok_or_else(|| TimelineError::UnknownItem(item_id.clone()))?;
        Ok(self.drag.begin(item, handle, pointer_x))
    }

    /// Pointer/touch move. Writes the tentative dates into the shadow copy and
    /// returns them; a rejected tick returns `None` and changes nothing.
    pub fn on_drag_move(&mut self, pointer_x: f32) -> Option<(NaiveDate, NaiveDate)> {
        let (start, end) = match self.drag.drag_to(pointer_x, self.scale.pixels_per_day) {
            Ok(Some(range)) => range,
            Ok(None) => return None,
            Err(err) => {
                log::debug!("drag tick rejected: {err}");
                return None;
            }
        };
        let item_id = self.drag.active()?.item_id.clone();
        let item = self.shadow_mut(&item_id)?;
        item.start = start;
        item.end = end;
        self.timeline_stale = true;
        Some((start, end))
    }

    /// Pointer/touch up. A changed range arms a date commit.
    pub fn on_drag_end(&mut self, now: Instant) -> Option<DragOutcome> {
        let outcome = self.drag.finish()?;
        if outcome.changed() {
            let seq = self
                .gateway
                .request_dates(outcome.item_id.clone(), outcome.start, outcome.end, now);
            log::debug!(
                "drag on {} ended at {}..{} (commit seq {seq})",
                outcome.item_id,
                outcome.start,
                outcome.end
            );
        }
        self.invalidate_timeline();
        Some(outcome)
    }

    /// Abort the drag and put the item back where it started. Nothing is committed.
    pub fn on_drag_cancel(&mut self) -> bool {
        let Some(session) = self.drag.cancel() else {
            return false;
        };
        if let Some(item) = self.shadow_mut(&session.item_id) {
            item.start = session.origin_start;
            item.end = session.origin_end;
        }
        self.invalidate_timeline();
        true
    }

    // --- Reassignment ---

    /// Move an item to another candidate assignee. Returns `Ok(false)` when the
    /// item already has that assignee.
    pub fn reassign(
        &mut self,
        item_id: &ItemId,
        assignee_id: &AssigneeId,
        now: Instant,
    ) -> Result<bool> {
        let item = self
            .shadow_mut(item_id)
            .ok_or_else(|| TimelineError::UnknownItem(item_id.clone()))?;
        if &item.assignee_id == assignee_id {
            return Ok(false);
        }
        let candidate = item
            .candidate(assignee_id)
            .cloned()
            .ok_or_else(|| TimelineError::UnknownAssignee {
                item_id: item_id.clone(),
                assignee_id: assignee_id.clone(),
            })?;

        item.assignee_id = candidate.id.clone();
        item.assignee_label = candidate.label;
        self.gateway
            .request_assignee(item_id.clone(), candidate.id, now);
        Ok(true)
    }

    // --- Commit protocol ---

    /// Collect the commits whose quiet period has elapsed, ready for the sink.
    pub fn poll_due(&mut self, now: Instant) -> Vec<CommitJob> {
        self.gateway.take_due(now)
    }

    /// Fold a sink acknowledgment back into the view.
    pub fn acknowledge(&mut self, ack: CommitAck) -> AckOutcome {
        let (item_id, field, seq) = (ack.item_id.clone(), ack.field, ack.seq);
        match self.gateway.resolve(ack) {
            Resolution::Stale => {
                log::debug!("dropping stale {field:?} acknowledgment for {item_id} (seq {seq})");
                AckOutcome::Stale
            }
            Resolution::Succeeded(job) => {
                if let Some(known_good) = self.snapshot.iter_mut().find(|i| i.id == job.item_id) {
                    match &job.payload {
                        CommitPayload::Dates { start, end } => {
                            known_good.start = *start;
                            known_good.end = *end;
                        }
                        CommitPayload::Assignee(assignee_id) => {
                            let label = known_good
                                .candidate(assignee_id)
                                .map(|candidate| candidate.label.clone())
                                .unwrap_or_else(|| assignee_id.to_string());
                            known_good.assignee_id = assignee_id.clone();
                            known_good.assignee_label = label;
                        }
                    }
                }
                self.invalidate_timeline();
                AckOutcome::Committed(job.item_id)
            }
            Resolution::Failed(job, reason) => {
                self.roll_back(&job.item_id, job.field());
                log::warn!(
                    "{:?} commit for {} failed, reverted to last known good: {reason}",
                    job.field(),
                    job.item_id
                );
                AckOutcome::RolledBack(TimelineError::CommitFailure {
                    item_id: job.item_id,
                    reason,
                })
            }
        }
    }

    fn roll_back(&mut self, item_id: &ItemId, field: CommitField) {
        let Some(known_good) = self.snapshot.iter().find(|i| &i.id == item_id).cloned() else {
            return;
        };
        let Some(item) = self.shadow_mut(item_id) else {
            return;
        };
        match field {
            CommitField::Dates => {
                item.start = known_good.start;
                item.end = known_good.end;
            }
            CommitField::Assignee => {
                item.assignee_id = known_good.assignee_id;
                item.assignee_label = known_good.assignee_label;
            }
        }
        self.invalidate_timeline();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn view_with(items: Vec<ScheduledItem>) -> TimelineView {
        let mut view = TimelineView::new(&TimelineConfig::default(), d(10));
        view.apply_snapshot(items);
        view
    }

    #[test]
    fn geometry_clips_items_that_start_before_the_window() {
        let view = view_with(vec![
            ScheduledItem::new("old", "Old", d(1), d(8)),
            ScheduledItem::new("new", "New", d(12), d(13)),
        ]);
        let ppd = view.scale().pixels_per_day;
        let window = view.window();
        assert_eq!(window.origin, d(7));

        let layout = view.layout();
        assert_eq!(layout.lane_count, 1);
        let old = &layout.items[0];
        assert_eq!(old.item_id, ItemId::new("old"));
        assert!(old.is_clipped_at_window_start);
        assert_eq!(old.pixel_offset, 0.0);
        assert_eq!(old.pixel_length, 2.0 * ppd);

        let new = &layout.items[1];
        assert!(!new.is_clipped_at_window_start);
        assert_eq!(new.pixel_offset, 5.0 * ppd);
        assert_eq!(new.pixel_length, 2.0 * ppd);
    }

    #[test]
    fn window_does_not_reflow_mid_drag() {
        let mut view = view_with(vec![ScheduledItem::new("a", "A", d(10), d(12))]);
        let before = view.window();
        let ppd = view.scale().pixels_per_day;

        view.on_drag_start(&ItemId::new("a"), DragHandle::Move, 0.0)
            .unwrap();
        view.on_drag_move(ppd * 30.0);
        assert_eq!(view.window(), before);
        let geometry = view.geometry();
        assert!(geometry[0].is_clipped_at_window_end);

        view.on_drag_end(Instant::now());
        assert!(view.window().day_count > before.day_count);
    }

    #[test]
    fn cancelled_drag_applies_the_window_deferred_during_the_drag() {
        let mut view = view_with(vec![ScheduledItem::new("a", "A", d(10), d(12))]);
        let before = view.window();

        view.on_drag_start(&ItemId::new("a"), DragHandle::Move, 0.0)
            .unwrap();
        view.apply_snapshot(vec![
            ScheduledItem::new("a", "A", d(10), d(12)),
            ScheduledItem::new("b", "B", d(20), d(28)),
        ]);
        assert_eq!(view.window(), before);

        assert!(view.on_drag_cancel());
        assert!(view.window().contains(d(28)));
        assert!(view.geometry().iter().all(|g| !g.is_clipped_at_window_end));
    }

    #[test]
    fn cancelled_drag_restores_origin_and_commits_nothing() {
        let mut view = view_with(vec![ScheduledItem::new("a", "A", d(10), d(12))]);
        let ppd = view.scale().pixels_per_day;
        let id = ItemId::new("a");

        view.on_drag_start(&id, DragHandle::ResizeEnd, 0.0).unwrap();
        assert_eq!(view.on_drag_move(ppd * 3.0), Some((d(10), d(15))));
        assert!(view.on_drag_cancel());
        let item = view.item(&id).unwrap();
        assert_eq!((item.start, item.end), (d(10), d(12)));
        assert_eq!(view.pending_count(), 0);
    }

    #[test]
    fn unknown_items_and_assignees_are_rejected() {
        let mut view = view_with(vec![ScheduledItem::new("a", "A", d(10), d(12))
            .with_assignee("u1", "Ana")
            .with_candidates(vec![crate::model::Assignee::new("u2", "Bo")])]);
        let now = Instant::now();

        assert_eq!(
            view.on_drag_start(&ItemId::new("zzz"), DragHandle::Move, 0.0),
            Err(TimelineError::UnknownItem(ItemId::new("zzz")))
        );
        assert!(matches!(
            view.reassign(&ItemId::new("a"), &AssigneeId::new("u9"), now),
            Err(TimelineError::UnknownAssignee { .. })
        ));
        assert_eq!(view.reassign(&ItemId::new("a"), &AssigneeId::new("u1"), now), Ok(false));
        assert_eq!(view.reassign(&ItemId::new("a"), &AssigneeId::new("u2"), now), Ok(true));
        assert_eq!(view.item(&ItemId::new("a")).unwrap().assignee_label, "Bo");
        assert_eq!(
            view.next_deadline(),
            Some(now + Duration::from_millis(400))
        );
    }
}
