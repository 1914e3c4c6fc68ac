use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{AssigneeId, ItemId};

/// Errors produced by the timeline engine.
///
/// None of these are fatal: malformed records are quarantined, rejected drags
/// keep their last valid value and failed commits roll back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("malformed date '{input}': expected YYYY-MM-DD")]
    Parse { input: String },

    #[error("invalid item '{id}': {reason}")]
    InvalidItem { id: String, reason: String },

    #[error("item {item_id} cannot span {start} to {end}: start would pass end")]
    ConstraintViolation {
        item_id: ItemId,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("commit for item {item_id} failed: {reason}")]
    CommitFailure { item_id: ItemId, reason: String },

    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    #[error("{assignee_id} is not a candidate assignee for item {item_id}")]
    UnknownAssignee {
        item_id: ItemId,
        assignee_id: AssigneeId,
    },
}

pub type Result<T> = std::result::Result<T, TimelineError>;
