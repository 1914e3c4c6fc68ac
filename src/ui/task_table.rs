use egui::{Color32, RichText, Ui};

use gantt_timeline::model::{AssigneeId, ItemId};
use gantt_timeline::timeline::TimelineView;

use crate::ui::theme;

/// Actions that the item table can request.
pub enum TaskTableAction {
    None,
    Select(ItemId),
    Reassign(ItemId, AssigneeId),
}

/// Render the left-side item table panel.
pub fn show_task_table(view: &TimelineView, selected: Option<&ItemId>, ui: &mut Ui) -> TaskTableAction {
    let mut action = TaskTableAction::None;
    let items = view.items();

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Items")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({})", items.len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
        let rejected = view.quarantined().len();
        if rejected > 0 {
            ui.label(
                RichText::new(format!("{rejected} rejected"))
                    .size(11.0)
                    .color(theme::TEXT_ERROR),
            )
            .on_hover_text("Records that failed validation are hidden. See Help → Rejected records.");
        }
    });
    ui.add_space(4.0);
    ui.separator();
    ui.add_space(2.0);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (i, item) in items.iter().enumerate() {
                let is_selected = selected == Some(&item.id);

                let row_bg = if is_selected {
                    theme::BG_SELECTED
                } else if i % 2 == 0 {
                    theme::BG_PANEL
                } else {
                    theme::BG_DARK
                };

                let frame = egui::Frame {
                    fill: row_bg,
                    rounding: egui::Rounding::same(4.0),
                    inner_margin: egui::Margin::symmetric(6.0, 4.0),
                    outer_margin: egui::Margin::ZERO,
                    stroke: egui::Stroke::NONE,
                    shadow: egui::epaint::Shadow::NONE,
                };

                let frame_resp = frame.show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 6.0;

                        let (dot_rect, _) =
                            ui.allocate_exact_size(egui::vec2(6.0, 6.0), egui::Sense::hover());
                        ui.painter().circle_filled(
                            dot_rect.center(),
                            3.0,
                            theme::assignee_color(&item.assignee_id),
                        );

                        let title = RichText::new(&item.title).size(12.0).color(if is_selected {
                            Color32::WHITE
                        } else {
                            theme::TEXT_PRIMARY
                        });
                        ui.add(egui::Label::new(title).truncate());

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.spacing_mut().item_spacing.x = 4.0;

                            let mut chosen = item.assignee_id.clone();
                            egui::ComboBox::from_id_salt(("assignee", item.id.as_str()))
                                .width(90.0)
                                .selected_text(RichText::new(&item.assignee_label).size(11.0))
                                .show_ui(ui, |ui| {
                                    for candidate in &item.candidate_assignees {
                                        ui.selectable_value(
                                            &mut chosen,
                                            candidate.id.clone(),
                                            &candidate.label,
                                        );
                                    }
                                });
                            if chosen != item.assignee_id {
                                action = TaskTableAction::Reassign(item.id.clone(), chosen);
                            }

                            if view.has_pending_commit(&item.id) {
                                ui.label(RichText::new("●").size(9.0).color(theme::PENDING))
                                    .on_hover_text("Saving…");
                            }

                            ui.label(
                                RichText::new(item.end.format("%m/%d").to_string())
                                    .size(10.0)
                                    .color(theme::TEXT_SECONDARY),
                            );
                            ui.label(RichText::new("→").size(9.0).color(theme::TEXT_DIM));
                            ui.label(
                                RichText::new(item.start.format("%m/%d").to_string())
                                    .size(10.0)
                                    .color(theme::TEXT_SECONDARY),
                            );
                        });
                    });
                });

                let row_click = ui.interact(
                    frame_resp.response.rect,
                    egui::Id::new(("item-row", item.id.as_str())),
                    egui::Sense::click(),
                );
                if row_click.clicked() {
                    action = TaskTableAction::Select(item.id.clone());
                }

                ui.add_space(1.0);
            }
        });

    action
}
