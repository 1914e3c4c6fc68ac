//! Greedy lane packing for timeline bars.
//!
//! # Algorithm
//!
//! 1. Sort items by start date, ties broken by id.
//! 2. Keep the end date of every open lane.
//! 3. Place each item in the first lane whose end is strictly before the
//!    item's start, or open a new lane.
//!
//! Intervals are closed: two items sharing a boundary date cannot share a lane,
//! while `end + 1 == start` can. Processing in start order makes the lane count
//! equal to the largest number of items covering a single day, which is the
//! minimum possible.
//!
//! # Complexity
//! O(n log n + n * L) where L is the resulting lane count.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{ItemId, ScheduledItem};

/// Lane index per item id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneAssignment {
    lanes: BTreeMap<ItemId, usize>,
    lane_count: usize,
}

impl LaneAssignment {
    pub fn lane_of(&self, id: &ItemId) -> Option<usize> {
        self.lanes.get(id).copied()
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, usize)> {
        self.lanes.iter().map(|(id, lane)| (id, *lane))
    }
}

/// Pack items into the fewest lanes such that same-lane items never overlap.
pub fn assign_lanes<'a, I>(items: I) -> LaneAssignment
where
    I: IntoIterator<Item = &'a ScheduledItem>,
{
    let mut ordered: Vec<&ScheduledItem> = items.into_iter().collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    let mut lane_ends: Vec<NaiveDate> = Vec::new();
    let mut lanes = BTreeMap::new();

    for item in ordered {
        let lane = match lane_ends.iter().position(|end| *end < item.start) {
            Some(free) => {
                lane_ends[free] = item.end;
                free
            }
            None => {
                lane_ends.push(item.end);
                lane_ends.len() - 1
            }
        };
        lanes.insert(item.id.clone(), lane);
    }

    LaneAssignment {
        lanes,
        lane_count: lane_ends.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn item(id: &str, start: u32, end: u32) -> ScheduledItem {
        ScheduledItem::new(id, id, d(start), d(end))
    }

    #[test]
    fn overlapping_pair_then_fitting_third() {
        let a = item("A", 1, 5);
        let b = item("B", 3, 7);
        let lanes = assign_lanes([&a, &b]);
        assert_eq!(lanes.lane_of(&a.id), Some(0));
        assert_eq!(lanes.lane_of(&b.id), Some(1));

        let c = item("C", 6, 8);
        let lanes = assign_lanes([&a, &b, &c]);
        assert_eq!(lanes.lane_of(&a.id), Some(0));
        assert_eq!(lanes.lane_of(&b.id), Some(1));
        assert_eq!(lanes.lane_of(&c.id), Some(0));
        assert_eq!(lanes.lane_count(), 2);
    }

    #[test]
    fn pairwise_overlapping_needs_one_lane_each() {
        let items = [item("a", 1, 10), item("b", 2, 9), item("c", 3, 8)];
        assert_eq!(assign_lanes(&items).lane_count(), 3);
    }

    #[test]
    fn pairwise_disjoint_share_one_lane() {
        let items = [item("a", 1, 2), item("b", 3, 4), item("c", 5, 6)];
        let lanes = assign_lanes(&items);
        assert_eq!(lanes.lane_count(), 1);
        assert!(lanes.iter().all(|(_, lane)| lane == 0));
    }

    #[test]
    fn shared_boundary_date_is_an_overlap() {
        let items = [item("a", 1, 5), item("b", 5, 6)];
        assert_eq!(assign_lanes(&items).lane_count(), 2);
    }

    #[test]
    fn equal_starts_are_ordered_by_id() {
        let items = [item("z", 1, 1), item("m", 1, 1), item("a", 1, 1)];
        let lanes = assign_lanes(&items);
        assert_eq!(lanes.lane_of(&ItemId::new("a")), Some(0));
        assert_eq!(lanes.lane_of(&ItemId::new("m")), Some(1));
        assert_eq!(lanes.lane_of(&ItemId::new("z")), Some(2));
    }

    #[test]
    fn reuses_earliest_free_lane() {
        // "c" takes lane 0 once "a" ends; "d" then fits in lane 1 after "b".
        let items = [
            item("a", 1, 2),
            item("b", 1, 4),
            item("c", 3, 9),
            item("d", 6, 7),
        ];
        let lanes = assign_lanes(&items);
        assert_eq!(lanes.lane_of(&ItemId::new("c")), Some(0));
        assert_eq!(lanes.lane_of(&ItemId::new("d")), Some(1));
        assert_eq!(lanes.lane_count(), 2);
    }

    #[test]
    fn empty_input() {
        let lanes = assign_lanes(&Vec::<ScheduledItem>::new());
        assert!(lanes.is_empty());
        assert_eq!(lanes.lane_count(), 0);
    }
}
