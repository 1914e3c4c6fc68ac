pub mod item;
pub mod timeline;

pub use item::{validate_items, Assignee, AssigneeId, ItemId, RawAssignee, RawItem, ScheduledItem};
pub use timeline::{DayDescriptor, MonthSpan, PixelScale, TimelineWindow};
