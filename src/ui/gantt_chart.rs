use std::time::Instant;

use egui::{Color32, Pos2, Rect, Response, Rounding, Sense, Stroke, Ui, Vec2};

use gantt_timeline::model::{ItemId, ScheduledItem};
use gantt_timeline::timeline::{DragHandle, DragOutcome, ItemGeometry, TimelineView};

use crate::ui::theme;

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const ROW_PADDING: f32 = theme::ROW_GAP;
const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// Result details from interactions in the Gantt chart.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    /// A drag finished this frame.
    pub finished: Option<DragOutcome>,
    /// A drag was aborted with Escape or by losing window focus.
    pub cancelled: bool,
}

/// Escape or losing window focus aborts a running drag.
fn drag_abort_requested(input: &egui::InputState) -> bool {
    input.key_pressed(egui::Key::Escape) || !input.focused
}

/// Render the Gantt chart area (right panel).
pub fn show_gantt_chart(
    view: &mut TimelineView,
    selected: &mut Option<ItemId>,
    scroll_to_today: &mut bool,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();

    // Ctrl+scroll zooms
    let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
    if ui.rect_contains_pointer(ui.max_rect()) && ui.input(|i| i.modifiers.ctrl) {
        if scroll_delta.y > 0.0 {
            view.scale_mut().zoom_in();
        } else if scroll_delta.y < 0.0 {
            view.scale_mut().zoom_out();
        }
    }

    if view.active_drag().is_some() && ui.input(drag_abort_requested) {
        interaction.cancelled = view.on_drag_cancel();
    }

    let layout = view.layout();
    let window = view.window();
    let scale = view.scale();
    let available = ui.available_size();
    let chart_width = scale.total_width(&window).max(available.x);
    let lane_count = layout.lane_count.max(1);
    let chart_height = HEADER_HEIGHT + lane_count as f32 * (ROW_HEIGHT + ROW_PADDING) + 40.0;

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(chart_width, chart_height.max(available.y)),
                Sense::click(),
            );
            let origin = response.rect.min;
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

            for lane in 0..lane_count {
                let y = origin.y + HEADER_HEIGHT + lane as f32 * (ROW_HEIGHT + ROW_PADDING);
                let row_bg = if lane % 2 == 0 {
                    theme::BG_PANEL
                } else {
                    theme::BG_DARK
                };
                painter.rect_filled(
                    Rect::from_min_size(
                        Pos2::new(origin.x, y),
                        Vec2::new(chart_width, ROW_HEIGHT + ROW_PADDING),
                    ),
                    0.0,
                    row_bg,
                );
                painter.line_segment(
                    [
                        Pos2::new(origin.x, y + ROW_HEIGHT + ROW_PADDING),
                        Pos2::new(origin.x + chart_width, y + ROW_HEIGHT + ROW_PADDING),
                    ],
                    Stroke::new(0.5, theme::BORDER_SUBTLE),
                );
            }

            draw_timeline_header(&painter, origin, view, response.rect.height());
            let today_x = draw_today_line(&painter, origin, view, response.rect.height());

            if std::mem::take(scroll_to_today) {
                if let Some(x) = today_x {
                    let target = Rect::from_center_size(
                        Pos2::new(x, origin.y + HEADER_HEIGHT),
                        Vec2::splat(1.0),
                    );
                    ui.scroll_to_rect(target, Some(egui::Align::Center));
                }
            }

            for geometry in &layout.items {
                let Some(item) = view.item(&geometry.item_id).cloned() else {
                    continue;
                };
                let y = origin.y
                    + HEADER_HEIGHT
                    + geometry.lane_index as f32 * (ROW_HEIGHT + ROW_PADDING)
                    + ROW_PADDING;
                let is_selected = selected.as_ref() == Some(&item.id);
                let is_pending = view.has_pending_commit(&item.id);
                let bar_rect =
                    draw_item_bar(&painter, origin, geometry, &item, y, is_selected, is_pending);

                let bar_response = ui.interact(
                    bar_rect,
                    ui.make_persistent_id(("item-bar", item.id.as_str())),
                    Sense::click_and_drag(),
                );
                let left_handle_rect = Rect::from_min_max(
                    Pos2::new(bar_rect.left() - HANDLE_WIDTH * 0.5, bar_rect.top()),
                    Pos2::new(bar_rect.left() + HANDLE_WIDTH * 0.5, bar_rect.bottom()),
                );
                let right_handle_rect = Rect::from_min_max(
                    Pos2::new(bar_rect.right() - HANDLE_WIDTH * 0.5, bar_rect.top()),
                    Pos2::new(bar_rect.right() + HANDLE_WIDTH * 0.5, bar_rect.bottom()),
                );
                let left_response = ui.interact(
                    left_handle_rect.expand(4.0),
                    ui.make_persistent_id(("item-resize-left", item.id.as_str())),
                    Sense::drag(),
                );
                let right_response = ui.interact(
                    right_handle_rect.expand(4.0),
                    ui.make_persistent_id(("item-resize-right", item.id.as_str())),
                    Sense::drag(),
                );

                if bar_response.clicked() {
                    *selected = Some(item.id.clone());
                    consumed_click = true;
                }

                let handles = [
                    (&left_response, DragHandle::ResizeStart),
                    (&right_response, DragHandle::ResizeEnd),
                    (&bar_response, DragHandle::Move),
                ];
                for (handle_response, handle) in handles {
                    if let Some(outcome) =
                        route_drag(view, &item.id, handle, handle_response, ui.ctx())
                    {
                        interaction.finished = Some(outcome);
                    }
                    if handle_response.drag_started() {
                        *selected = Some(item.id.clone());
                        consumed_click = true;
                    }
                }

                let hovered_edge = left_response.hovered() || right_response.hovered();
                if is_selected || hovered_edge {
                    if hovered_edge {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                    } else if bar_response.hovered() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                    }
                    let handle_h = bar_rect.height() * 0.55;
                    let handle_y = bar_rect.center().y - handle_h / 2.0;
                    let lh = Rect::from_min_size(
                        Pos2::new(bar_rect.left() - 1.5, handle_y),
                        Vec2::new(4.0, handle_h),
                    );
                    let rh = Rect::from_min_size(
                        Pos2::new(bar_rect.right() - 2.5, handle_y),
                        Vec2::new(4.0, handle_h),
                    );
                    painter.rect_filled(lh, Rounding::same(2.0), theme::HANDLE_COLOR);
                    painter.rect_filled(rh, Rounding::same(2.0), theme::HANDLE_COLOR);
                }

                if bar_response.hovered() || hovered_edge {
                    egui::show_tooltip_at_pointer(
                        ui.ctx(),
                        ui.layer_id(),
                        egui::Id::new(("item-tip", item.id.as_str())),
                        |ui| {
                            ui.strong(&item.title);
                            ui.label(format!(
                                "{} → {}",
                                item.start.format("%d/%m/%Y"),
                                item.end.format("%d/%m/%Y"),
                            ));
                            ui.label(format!("Assignee: {}", item.assignee_label));
                            if let Some(group) = &item.group_label {
                                ui.label(format!("Group: {group}"));
                            }
                            if is_pending {
                                ui.label(
                                    egui::RichText::new("Saving…").color(theme::PENDING),
                                );
                            }
                        },
                    );
                }
            }

            // Empty click on background clears selection
            if response.clicked() && !consumed_click {
                *selected = None;
            }
        });

    interaction
}

/// Forward one handle's pointer events to the view.
fn route_drag(
    view: &mut TimelineView,
    item_id: &ItemId,
    handle: DragHandle,
    response: &Response,
    ctx: &egui::Context,
) -> Option<DragOutcome> {
    let pointer_x = response.interact_pointer_pos().map(|p| p.x);

    if response.drag_started() {
        if let Some(x) = pointer_x {
            if let Err(err) = view.on_drag_start(item_id, handle, x) {
                log::warn!("could not start drag: {err}");
            }
        }
    }

    let owns_drag = view
        .active_drag()
        .is_some_and(|session| &session.item_id == item_id && session.handle == handle);
    if !owns_drag {
        return None;
    }

    if response.dragged() {
        ctx.set_cursor_icon(match handle {
            DragHandle::Move => egui::CursorIcon::Grab,
            DragHandle::ResizeStart | DragHandle::ResizeEnd => egui::CursorIcon::ResizeHorizontal,
        });
        if let Some(x) = pointer_x {
            view.on_drag_move(x);
        }
    }

    if response.drag_stopped() {
        return view.on_drag_end(Instant::now());
    }
    None
}

fn draw_timeline_header(painter: &egui::Painter, origin: Pos2, view: &TimelineView, height: f32) {
    let window = view.window();
    let ppd = view.scale().pixels_per_day;
    let width = view.scale().total_width(&window);

    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    for day in view.days() {
        let x = origin.x + day.offset as f32 * ppd;

        if day.is_weekend {
            painter.rect_filled(
                Rect::from_min_size(
                    Pos2::new(x, origin.y + HEADER_HEIGHT),
                    Vec2::new(ppd, height - HEADER_HEIGHT),
                ),
                0.0,
                theme::BG_WEEKEND,
            );
        }

        painter.line_segment(
            [
                Pos2::new(x, origin.y + HEADER_HEIGHT),
                Pos2::new(x, origin.y + height),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );

        if ppd >= 20.0 {
            let day_color = if day.is_today {
                theme::TODAY_LINE
            } else if day.is_weekend {
                theme::TEXT_DIM
            } else {
                theme::TEXT_SECONDARY
            };
            painter.text(
                Pos2::new(x + 3.0, origin.y + 28.0),
                egui::Align2::LEFT_CENTER,
                day.date.format("%d").to_string(),
                theme::font_sub(),
                day_color,
            );
        }
    }

    for span in view.month_spans() {
        let x = origin.x + span.start_offset as f32 * ppd;
        let span_width = span.day_count as f32 * ppd;
        painter.line_segment(
            [Pos2::new(x, origin.y), Pos2::new(x, origin.y + HEADER_HEIGHT)],
            Stroke::new(1.0, theme::BORDER_SUBTLE),
        );
        let clip = Rect::from_min_size(
            Pos2::new(x, origin.y),
            Vec2::new(span_width, HEADER_HEIGHT),
        );
        painter.with_clip_rect(clip).text(
            Pos2::new(x + 5.0, origin.y + 12.0),
            egui::Align2::LEFT_CENTER,
            &span.label,
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
    }
}

/// Draw the today marker; returns its x position when today is inside the window.
fn draw_today_line(
    painter: &egui::Painter,
    origin: Pos2,
    view: &TimelineView,
    height: f32,
) -> Option<f32> {
    let window = view.window();
    let today = view.today();
    if !window.contains(today) {
        return None;
    }
    let x = origin.x + view.scale().date_to_x(&window, today);

    painter.line_segment(
        [
            Pos2::new(x, origin.y + HEADER_HEIGHT),
            Pos2::new(x, origin.y + height),
        ],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, origin.y + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
    Some(x)
}

fn draw_item_bar(
    painter: &egui::Painter,
    origin: Pos2,
    geometry: &ItemGeometry,
    item: &ScheduledItem,
    y: f32,
    is_selected: bool,
    is_pending: bool,
) -> Rect {
    let x_start = origin.x + geometry.pixel_offset;
    let bar_width = geometry.pixel_length.max(theme::MIN_BAR_WIDTH);
    let inset = theme::BAR_INSET;

    let bar_rect = Rect::from_min_size(
        Pos2::new(x_start, y + inset),
        Vec2::new(bar_width, ROW_HEIGHT - inset * 2.0),
    );

    // Square off edges that continue past the window
    let r = theme::BAR_ROUNDING;
    let left = if geometry.is_clipped_at_window_start { 0.0 } else { r };
    let right = if geometry.is_clipped_at_window_end { 0.0 } else { r };
    let rounding = Rounding {
        nw: left,
        sw: left,
        ne: right,
        se: right,
    };

    let shadow_rect = bar_rect.translate(Vec2::new(1.0, 2.0));
    painter.rect_filled(shadow_rect, rounding, Color32::from_black_alpha(35));

    painter.rect_filled(bar_rect, rounding, theme::assignee_color(&item.assignee_id));
    let highlight_rect = Rect::from_min_size(
        bar_rect.min,
        Vec2::new(bar_width, (bar_rect.height() * 0.45).max(4.0)),
    );
    painter.rect_filled(
        highlight_rect,
        Rounding {
            nw: left,
            ne: right,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );

    if is_pending {
        painter.rect_stroke(bar_rect, rounding, Stroke::new(1.5, theme::PENDING));
    }

    if is_selected {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(r + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    // Title on bar (single line, clipped to bar bounds)
    if bar_width > 30.0 {
        let galley = painter.layout_no_wrap(item.title.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
        let clipped = painter.with_clip_rect(bar_rect);
        let text_y = y + inset + (bar_rect.height() - galley.size().y) / 2.0;
        clipped.galley(
            Pos2::new(bar_rect.left() + 6.0, text_y),
            galley,
            Color32::TRANSPARENT,
        );
    }

    bar_rect
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focused_input() -> egui::InputState {
        let mut input = egui::InputState::default();
        input.focused = true;
        input
    }

    #[test]
    fn drag_survives_ordinary_frames() {
        assert!(!drag_abort_requested(&focused_input()));
    }

    #[test]
    fn escape_or_focus_loss_aborts_the_drag() {
        let mut escape = focused_input();
        escape.events.push(egui::Event::Key {
            key: egui::Key::Escape,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        });
        assert!(drag_abort_requested(&escape));

        let mut unfocused = focused_input();
        unfocused.focused = false;
        assert!(drag_abort_requested(&unfocused));
    }
}
