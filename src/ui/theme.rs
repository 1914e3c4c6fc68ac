use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use gantt_timeline::model::AssigneeId;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(20, 24, 29);
pub const BG_PANEL: Color32 = Color32::from_rgb(27, 32, 38);
pub const BG_HEADER: Color32 = Color32::from_rgb(32, 38, 45);
pub const BG_WEEKEND: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 40);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(40, 150, 140, 45);
pub const BG_STATUS: Color32 = Color32::from_rgb(16, 19, 23);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(48, 56, 66);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(60, 180, 165);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(226, 232, 236);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(150, 164, 174);
pub const TEXT_DIM: Color32 = Color32::from_rgb(98, 110, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);
pub const TEXT_ERROR: Color32 = Color32::from_rgb(240, 110, 110);

pub const ACCENT: Color32 = Color32::from_rgb(45, 170, 155);
pub const PENDING: Color32 = Color32::from_rgb(255, 193, 7);
pub const TODAY_LINE: Color32 = Color32::from_rgb(235, 90, 70);
pub const GRID_LINE: Color32 = Color32::from_rgb(40, 47, 55);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(240, 245, 245);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const ROW_HEIGHT: f32 = 30.0;
pub const ROW_GAP: f32 = 2.0;
pub const HEADER_HEIGHT: f32 = 44.0;
pub const HANDLE_WIDTH: f32 = 7.0;
pub const BAR_ROUNDING: f32 = 5.0;
pub const BAR_INSET: f32 = 4.0;
pub const MIN_BAR_WIDTH: f32 = 6.0;
pub const STATUS_BAR_HEIGHT: f32 = 24.0;
pub const SIDE_PANEL_WIDTH: f32 = 340.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

// ── Assignee colors ──────────────────────────────────────────────────────────

pub const ASSIGNEE_COLORS: &[Color32] = &[
    Color32::from_rgb(45, 170, 155),
    Color32::from_rgb(92, 124, 230),
    Color32::from_rgb(214, 120, 60),
    Color32::from_rgb(150, 98, 210),
    Color32::from_rgb(98, 168, 72),
    Color32::from_rgb(205, 80, 120),
    Color32::from_rgb(200, 170, 60),
    Color32::from_rgb(70, 150, 200),
];

/// Stable color per assignee, so a reassigned bar visibly changes color.
pub fn assignee_color(id: &AssigneeId) -> Color32 {
    let hash = id
        .as_str()
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    ASSIGNEE_COLORS[hash % ASSIGNEE_COLORS.len()]
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

fn widget_visuals(fill: Color32, border: Color32, text: Color32, text_width: f32) -> egui::style::WidgetVisuals {
    let mut visuals = Visuals::dark().widgets.inactive;
    visuals.bg_fill = fill;
    visuals.weak_bg_fill = fill;
    visuals.bg_stroke = Stroke::new(1.0, border);
    visuals.fg_stroke = Stroke::new(text_width, text);
    visuals.rounding = Rounding::same(3.0);
    visuals
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.faint_bg_color = BG_HEADER;
    visuals.extreme_bg_color = BG_STATUS;
    visuals.striped = false;

    let widgets = &mut visuals.widgets;
    widgets.noninteractive = widget_visuals(BG_PANEL, BORDER_SUBTLE, TEXT_SECONDARY, 1.0);
    widgets.inactive = widget_visuals(Color32::from_rgb(38, 44, 52), BORDER_SUBTLE, TEXT_PRIMARY, 1.0);
    widgets.hovered = widget_visuals(Color32::from_rgb(46, 54, 64), ACCENT, TEXT_PRIMARY, 1.0);
    widgets.active = widget_visuals(Color32::from_rgb(54, 64, 76), ACCENT, TEXT_ON_BAR, 1.5);

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(6.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    ctx.set_visuals(visuals);

    ctx.style_mut(|style| {
        style.spacing.item_spacing = egui::vec2(6.0, 4.0);
        style.spacing.button_padding = egui::vec2(6.0, 3.0);
    });
}
