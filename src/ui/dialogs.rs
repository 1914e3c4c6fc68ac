use crate::app::GanttApp;
use crate::ui::theme;
use egui::{Context, RichText, Window};

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut GanttApp, ctx: &Context) {
    let mut open = app.show_about;
    Window::new("About")
        .open(&mut open)
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new("Gantt Timeline").strong().size(16.0));
            ui.label(
                RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                    .color(theme::TEXT_SECONDARY),
            );
            ui.add_space(6.0);
            ui.label("Drag bars to move · Drag edges to resize · Ctrl+Scroll to zoom");
            ui.label("Escape cancels a drag. Changes are saved after a short pause.");
        });
    app.show_about = open;
}

/// List the records the last load rejected.
pub fn show_rejected_dialog(app: &mut GanttApp, ctx: &Context) {
    let mut open = app.show_rejected;
    Window::new("Rejected records")
        .open(&mut open)
        .collapsible(false)
        .default_width(460.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            let rejected = app.view.quarantined();
            if rejected.is_empty() {
                ui.label(RichText::new("Every record was accepted.").color(theme::TEXT_SECONDARY));
                return;
            }
            egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                for err in rejected {
                    ui.label(RichText::new(err.to_string()).color(theme::TEXT_ERROR));
                }
            });
        });
    app.show_rejected = open;
}
