//! Window computation, lane packing, drag handling and the view that ties them
//! to the persistence gateway.

pub mod builder;
pub mod date_math;
pub mod drag;
pub mod lanes;
pub mod view;

pub use builder::{Days, Timeline, TimelineMargins};
pub use drag::{drag_days, DragController, DragHandle, DragOutcome, DragSession, DragState};
pub use lanes::{assign_lanes, LaneAssignment};
pub use view::{AckOutcome, ItemGeometry, TimelineLayout, TimelineView};
