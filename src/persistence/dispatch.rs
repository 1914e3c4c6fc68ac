//! Runs fired commits against the external sink.
//!
//! Sink calls execute on a tokio runtime; their acknowledgments are queued on a
//! channel and drained by the owner of the [`TimelineView`], so engine state
//! is only ever touched from that one thread.
//!
//! [`TimelineView`]: crate::timeline::TimelineView

use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::gateway::{CommitAck, CommitJob, CommitPayload};
use crate::model::{AssigneeId, ItemId};
use crate::timeline::date_math;

/// The write side of the data collaborator.
///
/// Both operations must be safe to repeat with identical arguments.
#[async_trait]
pub trait CommitSink: Send + Sync {
    /// Persist a date range given as ISO `YYYY-MM-DD` strings.
    async fn commit_date_range(&self, item_id: &ItemId, start: &str, end: &str)
        -> anyhow::Result<()>;

    async fn commit_assignee(&self, item_id: &ItemId, assignee_id: &AssigneeId)
        -> anyhow::Result<()>;
}

/// Send one job to the sink.
pub async fn execute(sink: &dyn CommitSink, job: &CommitJob) -> anyhow::Result<()> {
    match &job.payload {
        CommitPayload::Dates { start, end } => {
            let start = date_math::to_iso_date(*start);
            let end = date_math::to_iso_date(*end);
            sink.commit_date_range(&job.item_id, &start, &end).await
        }
        CommitPayload::Assignee(assignee_id) => sink.commit_assignee(&job.item_id, assignee_id).await,
    }
}

type Notify = Arc<dyn Fn() + Send + Sync>;

pub struct CommitDispatcher {
    runtime: Handle,
    sink: Arc<dyn CommitSink>,
    ack_tx: mpsc::UnboundedSender<CommitAck>,
    ack_rx: mpsc::UnboundedReceiver<CommitAck>,
    notify: Option<Notify>,
}

impl CommitDispatcher {
    pub fn new(runtime: Handle, sink: Arc<dyn CommitSink>) -> Self {
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            sink,
            ack_tx,
            ack_rx,
            notify: None,
        }
    }

    /// Call `notify` whenever an acknowledgment is queued (e.g. to wake the UI).
    pub fn with_notify(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(notify));
        self
    }

    pub fn dispatch(&self, job: CommitJob) {
        log::debug!(
            "dispatching {:?} commit for {} (seq {})",
            job.field(),
            job.item_id,
            job.seq
        );
        let sink = Arc::clone(&self.sink);
        let ack_tx = self.ack_tx.clone();
        let notify = self.notify.clone();
        self.runtime.spawn(async move {
            let result = execute(sink.as_ref(), &job).await;
            if ack_tx.send(CommitAck::for_job(&job, result)).is_err() {
                log::debug!("commit for {} finished after the dispatcher closed", job.item_id);
                return;
            }
            if let Some(notify) = notify {
                notify();
            }
        });
    }

    pub fn dispatch_all(&self, jobs: impl IntoIterator<Item = CommitJob>) {
        for job in jobs {
            self.dispatch(job);
        }
    }

    /// Every acknowledgment received so far, without waiting.
    pub fn drain(&mut self) -> Vec<CommitAck> {
        let mut acks = Vec::new();
        while let Ok(ack) = self.ack_rx.try_recv() {
            acks.push(ack);
        }
        acks
    }

    /// Wait for the next acknowledgment.
    pub async fn recv(&mut self) -> Option<CommitAck> {
        self.ack_rx.recv().await
    }
}
