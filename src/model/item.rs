use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TimelineError};
use crate::timeline::date_math;

/// Opaque identifier of a scheduled item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Opaque identifier of a team member an item can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssigneeId(String);

impl AssigneeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssigneeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssigneeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub id: AssigneeId,
    pub label: String,
}

impl Assignee {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: AssigneeId::new(id),
            label: label.into(),
        }
    }
}

/// A task as the timeline sees it. `start <= end` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub id: ItemId,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub assignee_id: AssigneeId,
    pub assignee_label: String,
    /// Optional group/category name shown alongside the bar.
    pub group_label: Option<String>,
    /// Members this item may be reassigned to, in display order.
    pub candidate_assignees: Vec<Assignee>,
}

impl ScheduledItem {
    /// Create an unassigned item. An `end` before `start` is pulled up to `start`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
            start,
            end: end.max(start),
            assignee_id: AssigneeId::new(""),
            assignee_label: String::new(),
            group_label: None,
            candidate_assignees: Vec::new(),
        }
    }

    pub fn with_assignee(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.assignee_id = AssigneeId::new(id);
        self.assignee_label = label.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group_label = Some(group.into());
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<Assignee>) -> Self {
        self.candidate_assignees = candidates;
        self
    }

    /// Number of calendar days covered, both ends included.
    pub fn span_days(&self) -> i64 {
        date_math::days_between(self.start, self.end) + 1
    }

    /// Closed-interval overlap: sharing a boundary date counts as overlapping.
    pub fn overlaps(&self, other: &ScheduledItem) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn candidate(&self, assignee_id: &AssigneeId) -> Option<&Assignee> {
        self.candidate_assignees
            .iter()
            .find(|candidate| &candidate.id == assignee_id)
    }
}

/// An item record as delivered by the data collaborator, before validation.
///
/// Every field is optional and identifiers may arrive as strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawItem {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub assignee_id: Option<String>,
    pub assignee_label: Option<String>,
    pub group_label: Option<String>,
    pub candidate_assignees: Vec<RawAssignee>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAssignee {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    pub label: Option<String>,
}

impl RawItem {
    /// Convert into the strict item shape.
    pub fn validate(&self) -> Result<ScheduledItem> {
        let id = non_empty(self.id.as_deref()).ok_or_else(|| TimelineError::InvalidItem {
            id: "<missing>".to_string(),
            reason: "missing id".to_string(),
        })?;
        let invalid = |reason: &str| TimelineError::InvalidItem {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let title = non_empty(self.title.as_deref()).ok_or_else(|| invalid("missing title"))?;
        let start = self
            .start
            .as_deref()
            .ok_or_else(|| invalid("missing start date"))
            .and_then(date_math::parse_iso_date)?;
        let end = self
            .end
            .as_deref()
            .ok_or_else(|| invalid("missing end date"))
            .and_then(date_math::parse_iso_date)?;
        if start > end {
            return Err(invalid(&format!(
                "start {} is after end {}",
                date_math::to_iso_date(start),
                date_math::to_iso_date(end)
            )));
        }

        let assignee_id =
            non_empty(self.assignee_id.as_deref()).ok_or_else(|| invalid("missing assignee"))?;
        let assignee_label = non_empty(self.assignee_label.as_deref()).unwrap_or(assignee_id);

        let candidate_assignees = self
            .candidate_assignees
            .iter()
            .filter_map(|raw| {
                let candidate_id = non_empty(raw.id.as_deref())?;
                let label = non_empty(raw.label.as_deref()).unwrap_or(candidate_id);
                Some(Assignee::new(candidate_id, label))
            })
            .collect();

        Ok(ScheduledItem {
            id: ItemId::new(id),
            title: title.to_string(),
            start,
            end,
            assignee_id: AssigneeId::new(assignee_id),
            assignee_label: assignee_label.to_string(),
            group_label: non_empty(self.group_label.as_deref()).map(str::to_string),
            candidate_assignees,
        })
    }
}

impl From<&ScheduledItem> for RawItem {
    fn from(item: &ScheduledItem) -> Self {
        Self {
            id: Some(item.id.to_string()),
            title: Some(item.title.clone()),
            start: Some(date_math::to_iso_date(item.start)),
            end: Some(date_math::to_iso_date(item.end)),
            assignee_id: Some(item.assignee_id.to_string()),
            assignee_label: Some(item.assignee_label.clone()),
            group_label: item.group_label.clone(),
            candidate_assignees: item
                .candidate_assignees
                .iter()
                .map(|candidate| RawAssignee {
                    id: Some(candidate.id.to_string()),
                    label: Some(candidate.label.clone()),
                })
                .collect(),
        }
    }
}

/// Validate a whole snapshot, quarantining bad or duplicate records.
///
/// Returns the accepted items in delivery order and one error per rejected record.
pub fn validate_items(raw: &[RawItem]) -> (Vec<ScheduledItem>, Vec<TimelineError>) {
    let mut items = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    let mut seen = HashSet::new();

    for record in raw {
        match record.validate() {
            Ok(item) => {
                if seen.insert(item.id.clone()) {
                    items.push(item);
                } else {
                    rejected.push(TimelineError::InvalidItem {
                        id: item.id.to_string(),
                        reason: "duplicate id".to_string(),
                    });
                }
            }
            Err(err) => rejected.push(err),
        }
    }

    (items, rejected)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Accept strings, numbers and booleans where an identifier is expected.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
