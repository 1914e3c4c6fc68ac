use crate::app::GanttApp;
use crate::ui::theme;
use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{}  Open...", icons::FOLDER_OPEN)).clicked() {
                app.open_file();
                ui.close_menu();
            }
            if ui.button(format!("{}  Import CSV...", icons::FILE_CSV)).clicked() {
                app.import_csv();
                ui.close_menu();
            }
            ui.separator();
            if ui
                .button(format!("{}  Reload          F5", icons::ARROWS_CLOCKWISE))
                .clicked()
            {
                app.reload();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            if ui
                .button(format!("{}  Zoom In        Ctrl+Scroll ↑", icons::MAGNIFYING_GLASS_PLUS))
                .clicked()
            {
                app.view.scale_mut().zoom_in();
                ui.close_menu();
            }
            if ui
                .button(format!("{}  Zoom Out      Ctrl+Scroll ↓", icons::MAGNIFYING_GLASS_MINUS))
                .clicked()
            {
                app.view.scale_mut().zoom_out();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{}  Jump to Today", icons::CALENDAR_CHECK)).clicked() {
                app.scroll_to_today = true;
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Sync  ").font(theme::font_menu()), |ui| {
            let mut fail = app.fail_writes();
            if ui.checkbox(&mut fail, "Simulate write failures").changed() {
                app.set_fail_writes(fail);
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("Rejected records").clicked() {
                app.show_rejected = true;
                ui.close_menu();
            }
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        // Right-aligned source name
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(app.source_name()).size(11.0).weak());
        });
    });
}
