//! Debounced, coalescing commit table.
//!
//! Every request arms a deadline for its `(item, field)` key and replaces any
//! earlier request for the same key, so a burst of drags produces one write
//! carrying the latest values. Each request takes the next sequence number for
//! its key; an acknowledgment only counts if it carries the latest one.
//!
//! The table never reads a clock itself. Callers pass `now` in and poll
//! [`PersistenceGateway::take_due`] from their event loop.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::model::{AssigneeId, ItemId};

/// Which part of an item a commit writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitField {
    Dates,
    Assignee,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitPayload {
    Dates { start: NaiveDate, end: NaiveDate },
    Assignee(AssigneeId),
}

impl CommitPayload {
    pub fn field(&self) -> CommitField {
        match self {
            CommitPayload::Dates { .. } => CommitField::Dates,
            CommitPayload::Assignee(_) => CommitField::Assignee,
        }
    }
}

/// Quiet period before a request fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceDelays {
    pub dates: Duration,
    pub assignee: Duration,
}

impl Default for DebounceDelays {
    fn default() -> Self {
        Self {
            dates: Duration::from_millis(1200),
            assignee: Duration::from_millis(400),
        }
    }
}

impl DebounceDelays {
    fn for_field(&self, field: CommitField) -> Duration {
        match field {
            CommitField::Dates => self.dates,
            CommitField::Assignee => self.assignee,
        }
    }
}

/// A request waiting for its quiet period to elapse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingCommit {
    pub item_id: ItemId,
    pub payload: CommitPayload,
    pub seq: u64,
    pub due_at: Instant,
}

/// A commit whose timer fired and that should now be sent to the sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitJob {
    pub item_id: ItemId,
    pub seq: u64,
    pub payload: CommitPayload,
}

impl CommitJob {
    pub fn field(&self) -> CommitField {
        self.payload.field()
    }
}

/// The sink's answer to a [`CommitJob`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitAck {
    pub item_id: ItemId,
    pub field: CommitField,
    pub seq: u64,
    pub result: Result<(), String>,
}

impl CommitAck {
    pub fn for_job(job: &CommitJob, result: anyhow::Result<()>) -> Self {
        Self {
            item_id: job.item_id.clone(),
            field: job.field(),
            seq: job.seq,
            result: result.map_err(|err| format!("{err:#}")),
        }
    }
}

/// What an acknowledgment means once checked against the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// A newer request superseded this one, or the item was removed.
    Stale,
    Succeeded(CommitJob),
    Failed(CommitJob, String),
}

type CommitKey = (ItemId, CommitField);

#[derive(Debug, Default)]
pub struct PersistenceGateway {
    delays: DebounceDelays,
    pending: BTreeMap<CommitKey, PendingCommit>,
    in_flight: HashMap<CommitKey, CommitJob>,
    latest_seq: HashMap<CommitKey, u64>,
}

impl PersistenceGateway {
    pub fn new(delays: DebounceDelays) -> Self {
        Self {
            delays,
            ..Default::default()
        }
    }

    pub fn delays(&self) -> DebounceDelays {
        self.delays
    }

    /// Arm (or re-arm) the date commit for an item. Returns its sequence number.
    pub fn request_dates(
        &mut self,
        item_id: ItemId,
        start: NaiveDate,
        end: NaiveDate,
        now: Instant,
    ) -> u64 {
        self.arm(item_id, CommitPayload::Dates { start, end }, now)
    }

    /// Arm (or re-arm) the assignee commit for an item. Returns its sequence number.
    pub fn request_assignee(&mut self, item_id: ItemId, assignee: AssigneeId, now: Instant) -> u64 {
        self.arm(item_id, CommitPayload::Assignee(assignee), now)
    }

    fn arm(&mut self, item_id: ItemId, payload: CommitPayload, now: Instant) -> u64 {
        let field = payload.field();
        let key = (item_id.clone(), field);

        let seq = self.latest_seq.entry(key.clone()).or_insert(0);
        *seq += 1;
        let seq = *seq;

        let pending = PendingCommit {
            item_id,
            payload,
            seq,
            due_at: now + self.delays.for_field(field),
        };
        if let Some(replaced) = self.pending.insert(key, pending) {
            log::debug!(
                "coalesced {:?} commit for {} (seq {} -> {})",
                field,
                replaced.item_id,
                replaced.seq,
                seq
            );
        }
        seq
    }

    /// Remove every commit whose quiet period has elapsed and mark it in flight.
    ///
    /// Jobs come out in deadline order.
    pub fn take_due(&mut self, now: Instant) -> Vec<CommitJob> {
        let mut due: Vec<PendingCommit> = Vec::new();
        self.pending.retain(|_, pending| {
            if pending.due_at <= now {
                due.push(pending.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_at.cmp(&b.due_at));

        due.into_iter()
            .map(|pending| {
                let job = CommitJob {
                    item_id: pending.item_id,
                    seq: pending.seq,
                    payload: pending.payload,
                };
                self.in_flight
                    .insert((job.item_id.clone(), job.field()), job.clone());
                job
            })
            .collect()
    }

    /// Cancel all timers for an item and forget its in-flight commits.
    ///
    /// Returns how many pending timers were cancelled.
    pub fn cancel_item(&mut self, item_id: &ItemId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|(id, _), _| id != item_id);
        self.in_flight.retain(|(id, _), _| id != item_id);
        before - self.pending.len()
    }

    /// Check an acknowledgment against the latest request for its key.
    pub fn resolve(&mut self, ack: CommitAck) -> Resolution {
        let key = (ack.item_id.clone(), ack.field);
        let latest = self.latest_seq.get(&key).copied().unwrap_or(0);

        let matches_in_flight = self
            .in_flight
            .get(&key)
            .is_some_and(|job| job.seq == ack.seq);
        if !matches_in_flight {
            return Resolution::Stale;
        }
        let Some(job) = self.in_flight.remove(&key) else {
            return Resolution::Stale;
        };
        if ack.seq < latest {
            return Resolution::Stale;
        }

        match ack.result {
            Ok(()) => Resolution::Succeeded(job),
            Err(reason) => Resolution::Failed(job, reason),
        }
    }

    pub fn pending(&self, item_id: &ItemId, field: CommitField) -> Option<&PendingCommit> {
        self.pending.get(&(item_id.clone(), field))
    }

    pub fn is_field_busy(&self, item_id: &ItemId, field: CommitField) -> bool {
        let key = (item_id.clone(), field);
        self.pending.contains_key(&key) || self.in_flight.contains_key(&key)
    }

    pub fn is_busy(&self, item_id: &ItemId) -> bool {
        self.is_field_busy(item_id, CommitField::Dates)
            || self.is_field_busy(item_id, CommitField::Assignee)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Earliest armed deadline, for scheduling the next poll.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.due_at).min()
    }
}
