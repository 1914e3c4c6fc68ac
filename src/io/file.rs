use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::ItemSource;
use crate::model::{AssigneeId, ItemId, RawItem};
use crate::persistence::CommitSink;

/// On-disk JSON document holding one timeline's items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemFile {
    pub name: String,
    #[serde(default)]
    pub items: Vec<RawItem>,
    #[serde(default = "Utc::now")]
    pub modified: DateTime<Utc>,
}

impl ItemFile {
    pub fn new(name: impl Into<String>, items: Vec<RawItem>) -> Self {
        Self {
            name: name.into(),
            items,
            modified: Utc::now(),
        }
    }

    fn record_mut(&mut self, item_id: &ItemId) -> Option<&mut RawItem> {
        self.items
            .iter_mut()
            .find(|raw| raw.id.as_deref() == Some(item_id.as_str()))
    }
}

/// Save an item file as pretty-printed JSON.
pub fn save_item_file(file: &ItemFile, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Load an item file from JSON.
pub fn load_item_file(path: &Path) -> anyhow::Result<ItemFile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("{} is not a valid item file", path.display()))
}

/// Reads snapshots from a JSON item file.
#[derive(Debug, Clone)]
pub struct FileItemSource {
    path: PathBuf,
}

impl FileItemSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ItemSource for FileItemSource {
    fn load_items(&self) -> anyhow::Result<Vec<RawItem>> {
        let file = load_item_file(&self.path)?;
        log::debug!("loaded {} record(s) from {}", file.items.len(), self.path.display());
        Ok(file.items)
    }
}

/// Writes commits back into a JSON item file.
///
/// Each commit rewrites the whole file. Writes are serialized so two commits
/// never interleave their read-modify-write cycles.
pub struct FileCommitSink {
    path: PathBuf,
    latency: Option<Duration>,
    fail_writes: AtomicBool,
    lock: Mutex<()>,
}

impl FileCommitSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            latency: None,
            fail_writes: AtomicBool::new(false),
            lock: Mutex::new(()),
        }
    }

    /// Delay every commit, to make in-flight state visible.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make subsequent commits fail without touching the file.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn fails_writes(&self) -> bool {
        self.fail_writes.load(Ordering::Relaxed)
    }

    async fn update<F>(&self, item_id: &ItemId, apply: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut RawItem),
    {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.fails_writes() {
            return Err(anyhow!("writes to {} are disabled", self.path.display()));
        }

        let _guard = self.lock.lock().await;
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let mut file: ItemFile = serde_json::from_str(&json)
            .with_context(|| format!("{} is not a valid item file", self.path.display()))?;

        let record = file
            .record_mut(item_id)
            .ok_or_else(|| anyhow!("item {item_id} not found in {}", self.path.display()))?;
        apply(record);
        file.modified = Utc::now();

        let json = serde_json::to_string_pretty(&file)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

#[async_trait]
impl CommitSink for FileCommitSink {
    async fn commit_date_range(&self, item_id: &ItemId, start: &str, end: &str) -> anyhow::Result<()> {
        self.update(item_id, |record| {
            record.start = Some(start.to_string());
            record.end = Some(end.to_string());
        })
        .await
    }

    async fn commit_assignee(&self, item_id: &ItemId, assignee_id: &AssigneeId) -> anyhow::Result<()> {
        self.update(item_id, |record| {
            let label = record
                .candidate_assignees
                .iter()
                .find(|candidate| candidate.id.as_deref() == Some(assignee_id.as_str()))
                .and_then(|candidate| candidate.label.clone());
            record.assignee_id = Some(assignee_id.to_string());
            record.assignee_label = label;
        })
        .await
    }
}
