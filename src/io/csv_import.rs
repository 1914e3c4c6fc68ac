use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;

use super::ItemSource;
use crate::model::{RawAssignee, RawItem};
use crate::timeline::date_math;

/// Try parsing a date string with several common formats.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Title,
    Start,
    End,
    Assignee,
    AssigneeLabel,
    Group,
    Candidates,
}

fn header_to_col(normalized: &str) -> Option<Column> {
    match normalized {
        "id" | "key" | "itemid" | "taskid" => Some(Column::Id),

        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" | "activity" => {
            Some(Column::Title)
        }

        "start" | "startdate" | "from" | "begin" | "begindate" => Some(Column::Start),

        "end" | "enddate" | "to" | "finish" | "finishdate" | "due" | "duedate" => Some(Column::End),

        "assignee" | "assigneeid" | "owner" | "resource" | "user" => Some(Column::Assignee),

        "assigneename" | "assigneelabel" | "ownername" | "resourcename" => {
            Some(Column::AssigneeLabel)
        }

        "group" | "project" | "lane" | "category" => Some(Column::Group),

        "candidates" | "assignees" | "team" => Some(Column::Candidates),

        _ => None,
    }
}

/// Reads snapshots from a CSV export.
///
/// Auto-detects delimiter (comma, semicolon, tab) and matches column headers
/// flexibly. Candidate assignees go in one column separated by `|`. Rows without
/// an id get a generated one; rows with an unreadable date are skipped.
#[derive(Debug, Clone)]
pub struct CsvItemSource {
    path: PathBuf,
}

impl CsvItemSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse the file. Returns `(records, skipped_count)`.
    pub fn read(&self) -> anyhow::Result<(Vec<RawItem>, usize)> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        parse_csv(&content)
    }
}

impl ItemSource for CsvItemSource {
    fn load_items(&self) -> anyhow::Result<Vec<RawItem>> {
        let (records, skipped) = self.read()?;
        if skipped > 0 {
            log::warn!("skipped {skipped} row(s) in {}", self.path.display());
        }
        Ok(records)
    }
}

fn parse_csv(content: &str) -> anyhow::Result<(Vec<RawItem>, usize)> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .context("failed to read CSV headers")?
        .clone();
    let col_map: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_col(&normalize_header(h)))
        .collect();

    let has = |column| col_map.contains(&Some(column));
    if !has(Column::Title) || !has(Column::Start) || !has(Column::End) || !has(Column::Assignee) {
        let found: Vec<&str> = headers.iter().collect();
        bail!(
            "CSV is missing required columns. Found headers: {found:?}. \
             Need columns for: title, start date, end date, assignee."
        );
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let row = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping CSV row {row}: {e}");
                skipped += 1;
                continue;
            }
        };

        let mut raw = RawItem::default();
        for (field, column) in record.iter().zip(&col_map) {
            let value = Some(field.to_string()).filter(|v| !v.is_empty());
            match column {
                Some(Column::Id) => raw.id = value,
                Some(Column::Title) => raw.title = value,
                Some(Column::Start) => raw.start = value,
                Some(Column::End) => raw.end = value,
                Some(Column::Assignee) => raw.assignee_id = value,
                Some(Column::AssigneeLabel) => raw.assignee_label = value,
                Some(Column::Group) => raw.group_label = value,
                Some(Column::Candidates) => {
                    raw.candidate_assignees = field
                        .split('|')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(|id| RawAssignee {
                            id: Some(id.to_string()),
                            label: None,
                        })
                        .collect();
                }
                None => {}
            }
        }

        if let Err(bad) = normalize_dates(&mut raw) {
            log::warn!("skipping CSV row {row}: unreadable date '{bad}'");
            skipped += 1;
            continue;
        }

        if raw.id.is_none() {
            raw.id = Some(uuid::Uuid::new_v4().to_string());
        }
        records.push(raw);
    }

    Ok((records, skipped))
}

/// Rewrite both dates as ISO strings; returns the offending text on failure.
fn normalize_dates(raw: &mut RawItem) -> Result<(), String> {
    for slot in [&mut raw.start, &mut raw.end] {
        if let Some(text) = slot.as_deref() {
            let date = parse_date(text).ok_or_else(|| text.to_string())?;
            *slot = Some(date_math::to_iso_date(date));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{validate_items, AssigneeId, ItemId};
    use pretty_assertions::assert_eq;

    #[test]
    fn detects_delimiters() {
        assert_eq!(detect_delimiter("a;b;c"), b';');
        assert_eq!(detect_delimiter("a,b,c"), b',');
        assert_eq!(detect_delimiter("a\tb\tc"), b'\t');
    }

    #[test]
    fn flexible_headers_and_date_formats() {
        let csv = "Item Id;Task Name;Start Date;Due Date;Owner;Owner Name;Team\n\
                   7;Design;01/06/2024;2024-06-04;u1;Ana;u1|u2\n";
        let (records, skipped) = parse_csv(csv).unwrap();
        assert_eq!(skipped, 0);

        let (items, rejected) = validate_items(&records);
        assert!(rejected.is_empty());
        let item = &items[0];
        assert_eq!(item.id, ItemId::new("7"));
        assert_eq!(item.start, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(item.assignee_label, "Ana");
        assert_eq!(item.candidate_assignees.len(), 2);
        assert!(item.candidate(&AssigneeId::new("u2")).is_some());
    }

    #[test]
    fn bad_rows_are_skipped_and_missing_ids_generated() {
        let csv = "title,start,end,assignee\n\
                   A,2024-06-01,2024-06-02,u1\n\
                   B,someday,2024-06-02,u1\n";
        let (records, skipped) = parse_csv(csv).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(records.len(), 1);
        let id = records[0].id.as_deref().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn missing_required_columns_fail_the_load() {
        let err = parse_csv("title,start\nA,2024-06-01\n").unwrap_err();
        assert!(err.to_string().contains("missing required columns"));
    }

    #[test]
    fn source_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.csv");
        std::fs::write(&path, "id,title,start,end,assignee\nx,A,2024-06-01,2024-06-03,u1\n")
            .unwrap();
        let records = CsvItemSource::new(&path).load_items().unwrap();
        assert_eq!(records[0].id.as_deref(), Some("x"));
    }
}
