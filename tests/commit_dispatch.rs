// Async dispatch of fired commits to a sink, with acknowledgments folded back into the view

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tokio::runtime::Handle;

use gantt_timeline::config::TimelineConfig;
use gantt_timeline::io::{save_item_file, FileCommitSink, FileItemSource, ItemFile, ItemSource};
use gantt_timeline::model::{Assignee, AssigneeId, ItemId, RawItem, ScheduledItem};
use gantt_timeline::persistence::{CommitDispatcher, CommitSink};
use gantt_timeline::timeline::{AckOutcome, DragHandle, TimelineView};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn sample_items() -> Vec<ScheduledItem> {
    let team = vec![Assignee::new("ana", "Ana"), Assignee::new("bo", "Bo")];
    vec![
        ScheduledItem::new("a", "Design", d(10), d(12))
            .with_assignee("ana", "Ana")
            .with_candidates(team.clone()),
        ScheduledItem::new("b", "Build", d(13), d(20))
            .with_assignee("bo", "Bo")
            .with_candidates(team),
    ]
}

fn loaded_view() -> TimelineView {
    let mut view = TimelineView::new(&TimelineConfig::default(), d(1));
    let records: Vec<RawItem> = sample_items().iter().map(RawItem::from).collect();
    view.replace_snapshot(&records);
    view
}

#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<String>>,
    reject_assignees: bool,
}

#[async_trait]
impl CommitSink for RecordingSink {
    async fn commit_date_range(&self, item_id: &ItemId, start: &str, end: &str) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("dates {item_id} {start} {end}"));
        Ok(())
    }

    async fn commit_assignee(&self, item_id: &ItemId, assignee_id: &AssigneeId) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("assignee {item_id} {assignee_id}"));
        if self.reject_assignees {
            anyhow::bail!("assignee changes are locked");
        }
        Ok(())
    }
}

fn drag_by(view: &mut TimelineView, id: &str, days: f32, now: Instant) {
    let ppd = view.scale().pixels_per_day;
    view.on_drag_start(&ItemId::new(id), DragHandle::Move, 0.0)
        .unwrap();
    view.on_drag_move(days * ppd);
    view.on_drag_end(now);
}

#[tokio::test]
async fn sink_receives_iso_dates_and_acks_flow_back() {
    let sink = Arc::new(RecordingSink {
        reject_assignees: true,
        ..Default::default()
    });
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let mut dispatcher = CommitDispatcher::new(Handle::current(), sink.clone())
        .with_notify(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    let mut view = loaded_view();
    let t0 = Instant::now();
    drag_by(&mut view, "a", 2.0, t0);
    view.reassign(&ItemId::new("b"), &AssigneeId::new("ana"), t0)
        .unwrap();

    let jobs = view.poll_due(t0 + Duration::from_secs(5));
    assert_eq!(jobs.len(), 2);
    dispatcher.dispatch_all(jobs);

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        let ack = dispatcher.recv().await.expect("dispatcher open");
        outcomes.push(view.acknowledge(ack));
    }

    assert!(outcomes.contains(&AckOutcome::Committed(ItemId::new("a"))));
    assert!(outcomes
        .iter()
        .any(|outcome| matches!(outcome, AckOutcome::RolledBack(_))));
    assert_eq!(notified.load(Ordering::SeqCst), 2);

    let mut calls = sink.calls.lock().unwrap().clone();
    calls.sort();
    assert_eq!(
        calls,
        vec![
            "assignee b ana".to_string(),
            "dates a 2024-06-12 2024-06-14".to_string(),
        ]
    );

    let b = view.item(&ItemId::new("b")).unwrap();
    assert_eq!(b.assignee_id, AssigneeId::new("bo"));
    assert_eq!(view.in_flight_count(), 0);
    assert!(dispatcher.drain().is_empty());
}

#[tokio::test]
async fn file_sink_persists_a_drag_that_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.json");
    let records = sample_items().iter().map(RawItem::from).collect();
    save_item_file(&ItemFile::new("test", records), &path).unwrap();

    let source = FileItemSource::new(&path);
    let sink = Arc::new(FileCommitSink::new(&path));
    let mut dispatcher = CommitDispatcher::new(Handle::current(), sink);

    let mut view = TimelineView::new(&TimelineConfig::default(), d(1));
    view.replace_snapshot(&source.load_items().unwrap());

    let t0 = Instant::now();
    drag_by(&mut view, "b", -1.0, t0);
    dispatcher.dispatch_all(view.poll_due(t0 + Duration::from_secs(5)));
    let ack = dispatcher.recv().await.unwrap();
    assert_eq!(view.acknowledge(ack), AckOutcome::Committed(ItemId::new("b")));

    let mut fresh = TimelineView::new(&TimelineConfig::default(), d(1));
    fresh.replace_snapshot(&source.load_items().unwrap());
    let b = fresh.item(&ItemId::new("b")).unwrap();
    assert_eq!((b.start, b.end), (d(12), d(19)));
}

#[tokio::test]
async fn failing_file_sink_rolls_the_view_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.json");
    let records = sample_items().iter().map(RawItem::from).collect();
    save_item_file(&ItemFile::new("test", records), &path).unwrap();

    let sink = Arc::new(FileCommitSink::new(&path));
    sink.set_fail_writes(true);
    let mut dispatcher = CommitDispatcher::new(Handle::current(), sink);

    let mut view = loaded_view();
    let t0 = Instant::now();
    drag_by(&mut view, "a", 3.0, t0);
    dispatcher.dispatch_all(view.poll_due(t0 + Duration::from_secs(5)));

    let ack = dispatcher.recv().await.unwrap();
    assert!(ack.result.is_err());
    assert!(matches!(view.acknowledge(ack), AckOutcome::RolledBack(_)));
    let a = view.item(&ItemId::new("a")).unwrap();
    assert_eq!((a.start, a.end), (d(10), d(12)));
}
