use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use chrono::{Duration, NaiveDate};
use tokio::runtime::Runtime;

use gantt_timeline::config::TimelineConfig;
use gantt_timeline::io::{
    save_item_file, CsvItemSource, FileCommitSink, FileItemSource, ItemFile, ItemSource,
};
use gantt_timeline::model::{Assignee, ItemId, RawItem, ScheduledItem};
use gantt_timeline::persistence::CommitDispatcher;
use gantt_timeline::timeline::{AckOutcome, TimelineView};

use crate::ui;

/// Main application state.
pub struct GanttApp {
    pub view: TimelineView,
    pub selected: Option<ItemId>,
    pub scroll_to_today: bool,

    // Dialog state
    pub show_about: bool,
    pub show_rejected: bool,

    pub status_message: String,
    pub last_error: Option<String>,

    config: TimelineConfig,
    ctx: egui::Context,
    runtime: Runtime,
    source: Option<FileItemSource>,
    sink: Option<Arc<FileCommitSink>>,
    dispatcher: Option<CommitDispatcher>,
}

impl GanttApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: TimelineConfig,
        runtime: Runtime,
        path: Option<PathBuf>,
    ) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let today = chrono::Local::now().date_naive();
        let mut app = Self {
            view: TimelineView::new(&config, today),
            selected: None,
            scroll_to_today: true,
            show_about: false,
            show_rejected: false,
            status_message: "Ready".to_string(),
            last_error: None,
            config,
            ctx: cc.egui_ctx.clone(),
            runtime,
            source: None,
            sink: None,
            dispatcher: None,
        };

        let path = match path {
            Some(path) => Some(path),
            None => match Self::write_sample_file(today) {
                Ok(path) => Some(path),
                Err(err) => {
                    app.report_error(format!("Could not create sample data: {err:#}"));
                    None
                }
            },
        };
        if let Some(path) = path {
            app.open_path(&path);
        }
        app
    }

    /// Write a demonstration item file to the temp directory.
    fn write_sample_file(today: NaiveDate) -> anyhow::Result<PathBuf> {
        let path = std::env::temp_dir().join("gantt-timeline-sample.json");
        if path.exists() {
            return Ok(path);
        }

        let team = vec![
            Assignee::new("ana", "Ana"),
            Assignee::new("bo", "Bo"),
            Assignee::new("chen", "Chen"),
        ];
        let day = |n: i64| today + Duration::days(n);
        let items = [
            ScheduledItem::new("kickoff", "Project Kickoff", day(-5), day(-2))
                .with_assignee("ana", "Ana")
                .with_group("Planning"),
            ScheduledItem::new("requirements", "Requirements", day(-2), day(5))
                .with_assignee("bo", "Bo")
                .with_group("Planning"),
            ScheduledItem::new("design", "UI Design", day(3), day(12))
                .with_assignee("chen", "Chen")
                .with_group("Execution"),
            ScheduledItem::new("backend", "Backend Development", day(6), day(24))
                .with_assignee("bo", "Bo")
                .with_group("Execution"),
            ScheduledItem::new("qa", "Testing & QA", day(20), day(28))
                .with_assignee("ana", "Ana")
                .with_group("Execution"),
        ];
        let records = items
            .into_iter()
            .map(|item| RawItem::from(&item.with_candidates(team.clone())))
            .collect();

        save_item_file(&ItemFile::new("Sample Timeline", records), &path)?;
        log::info!("wrote sample items to {}", path.display());
        Ok(path)
    }

    // --- File operations ---

    pub fn open_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Item File", &["json"])
            .pick_file()
        {
            self.open_path(&path);
        }
    }

    /// Point the view at a new item file. Unsaved commits for the previous file are dropped.
    pub fn open_path(&mut self, path: &Path) {
        let pending = self.view.pending_count() + self.view.in_flight_count();
        if pending > 0 {
            log::warn!("switching files with {pending} unsaved commit(s)");
        }

        let mut sink = FileCommitSink::new(path);
        if let Some(latency) = self.config.commit_latency() {
            log::info!("delaying every commit by {latency:?}");
            sink = sink.with_latency(latency);
        }
        let sink = Arc::new(sink);
        let ctx = self.ctx.clone();
        let dispatcher = CommitDispatcher::new(self.runtime.handle().clone(), sink.clone())
            .with_notify(move || ctx.request_repaint());

        self.view = TimelineView::new(&self.config, chrono::Local::now().date_naive());
        self.selected = None;
        self.source = Some(FileItemSource::new(path));
        self.sink = Some(sink);
        self.dispatcher = Some(dispatcher);
        self.scroll_to_today = true;
        self.reload();
    }

    pub fn reload(&mut self) {
        let Some(source) = &self.source else {
            self.status_message = "No file open".to_string();
            return;
        };
        match source.load_items() {
            Ok(records) => {
                let accepted = self.view.replace_snapshot(&records);
                let rejected = self.view.quarantined().len();
                self.status_message = if rejected > 0 {
                    format!("Loaded {accepted} items ({rejected} rejected)")
                } else {
                    format!("Loaded {accepted} items")
                };
                self.last_error = None;
            }
            Err(err) => self.report_error(format!("Load failed: {err:#}")),
        }
    }

    pub fn import_csv(&mut self) {
        let Some(csv_path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv", "txt"])
            .pick_file()
        else {
            return;
        };

        let (records, skipped) = match CsvItemSource::new(&csv_path).read() {
            Ok(parsed) => parsed,
            Err(err) => {
                self.report_error(format!("CSV import failed: {err:#}"));
                return;
            }
        };

        let name = csv_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Imported")
            .to_string();
        let Some(target) = rfd::FileDialog::new()
            .add_filter("Item File", &["json"])
            .set_file_name(format!("{name}.json"))
            .save_file()
        else {
            return;
        };

        let count = records.len();
        let saved = save_item_file(&ItemFile::new(name, records), &target)
            .with_context(|| format!("could not save {}", target.display()));
        match saved {
            Ok(()) => {
                self.open_path(&target);
                if skipped > 0 {
                    self.status_message = format!("Imported {count} items ({skipped} rows skipped)");
                }
            }
            Err(err) => self.report_error(format!("{err:#}")),
        }
    }

    pub fn source_name(&self) -> String {
        self.source
            .as_ref()
            .and_then(|source| source.path().file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "(no file)".to_string())
    }

    pub fn fail_writes(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| sink.fails_writes())
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        if let Some(sink) = &self.sink {
            sink.set_fail_writes(fail);
            log::info!("simulated write failures {}", if fail { "on" } else { "off" });
        }
    }

    fn report_error(&mut self, message: String) {
        log::error!("{message}");
        self.status_message = message.clone();
        self.last_error = Some(message);
    }

    fn title_of(&self, id: &ItemId) -> String {
        self.view
            .item(id)
            .map(|item| item.title.clone())
            .unwrap_or_else(|| id.to_string())
    }

    // --- Commit pump ---

    /// Fold finished commits into the view, then hand newly due ones to the sink.
    fn pump_commits(&mut self) {
        let acks = self
            .dispatcher
            .as_mut()
            .map(CommitDispatcher::drain)
            .unwrap_or_default();
        for ack in acks {
            match self.view.acknowledge(ack) {
                AckOutcome::Committed(id) => {
                    self.status_message = format!("Saved '{}'", self.title_of(&id));
                }
                AckOutcome::RolledBack(err) => {
                    self.last_error = Some(err.to_string());
                    self.status_message = "Change reverted".to_string();
                }
                AckOutcome::Stale => {}
            }
        }

        let jobs = self.view.poll_due(Instant::now());
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.dispatch_all(jobs);
        }
    }
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.view.set_today(chrono::Local::now().date_naive());
        self.pump_commits();

        if ctx.input(|i| i.key_pressed(egui::Key::F5)) && self.view.active_drag().is_none() {
            self.reload();
        }

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_STATUS)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.0)
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    if let Some(err) = &self.last_error {
                        ui.label(
                            egui::RichText::new(err)
                                .size(11.0)
                                .color(ui::theme::TEXT_ERROR),
                        );
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let dim = |text: String| {
                            egui::RichText::new(text)
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM)
                        };
                        ui.label(dim(format!(
                            "Zoom: {:.0} px/day",
                            self.view.scale().pixels_per_day
                        )));
                        ui.label(dim(" · ".to_string()));
                        ui.label(dim(format!("Saving: {}", self.view.in_flight_count())));
                        ui.label(dim(" · ".to_string()));
                        ui.label(dim(format!("Pending: {}", self.view.pending_count())));
                    });
                });
            });

        // Left panel: item table
        let mut table_action = ui::task_table::TaskTableAction::None;
        egui::SidePanel::left("item_panel")
            .default_width(ui::theme::SIDE_PANEL_WIDTH)
            .min_width(240.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(8.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                table_action =
                    ui::task_table::show_task_table(&self.view, self.selected.as_ref(), ui);
            });

        match table_action {
            ui::task_table::TaskTableAction::Select(id) => {
                self.selected = Some(id);
            }
            ui::task_table::TaskTableAction::Reassign(id, assignee) => {
                match self.view.reassign(&id, &assignee, Instant::now()) {
                    Ok(true) => {
                        self.status_message = format!("Reassigned '{}'", self.title_of(&id));
                    }
                    Ok(false) => {}
                    Err(err) => self.report_error(err.to_string()),
                }
            }
            ui::task_table::TaskTableAction::None => {}
        }

        // Central panel: Gantt chart
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        let interaction = egui::CentralPanel::default()
            .frame(chart_frame)
            .show(ctx, |ui| {
                ui::gantt_chart::show_gantt_chart(
                    &mut self.view,
                    &mut self.selected,
                    &mut self.scroll_to_today,
                    ui,
                )
            })
            .inner;

        if let Some(outcome) = interaction.finished.filter(|outcome| outcome.changed()) {
            self.status_message = format!(
                "Updated '{}' ({} → {})",
                self.title_of(&outcome.item_id),
                outcome.start.format("%Y-%m-%d"),
                outcome.end.format("%Y-%m-%d")
            );
        }
        if interaction.cancelled {
            self.status_message = "Drag cancelled".to_string();
        }

        // Dialogs
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
        if self.show_rejected {
            ui::dialogs::show_rejected_dialog(self, ctx);
        }

        // Wake up for the next debounce deadline
        if let Some(deadline) = self.view.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }
}
