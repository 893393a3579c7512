use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

pub const BG_PANEL: Color32 = Color32::from_rgb(24, 24, 26);
pub const BG_WIDGET: Color32 = Color32::from_rgb(36, 36, 40);
pub const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(48, 48, 54);
pub const BG_WIDGET_ACTIVE: Color32 = Color32::from_rgb(60, 60, 70);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(200, 200, 204);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(130, 130, 136);

pub const ACCENT_GREEN: Color32 = Color32::from_rgb(92, 184, 92);
pub const ACCENT_ORANGE: Color32 = Color32::from_rgb(212, 150, 60);
pub const ACCENT_RED: Color32 = Color32::from_rgb(200, 70, 70);
pub const ACCENT_BLUE: Color32 = Color32::from_rgb(90, 130, 210);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(58, 58, 64);

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = Style::default();

    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.window_rounding = Rounding::same(6.0);
    visuals.faint_bg_color = BG_PANEL;
    visuals.extreme_bg_color = BG_WIDGET;
    visuals.warn_fg_color = ACCENT_ORANGE;
    visuals.error_fg_color = ACCENT_RED;
    visuals.hyperlink_color = ACCENT_BLUE;
    visuals.slider_trailing_fill = true;

    visuals.widgets.noninteractive.bg_fill = BG_WIDGET;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_MUTED);
    visuals.widgets.inactive.bg_fill = BG_WIDGET;
    visuals.widgets.inactive.weak_bg_fill = BG_WIDGET;
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.bg_fill = BG_WIDGET_HOVER;
    visuals.widgets.hovered.weak_bg_fill = BG_WIDGET_HOVER;
    visuals.widgets.active.bg_fill = BG_WIDGET_ACTIVE;
    visuals.widgets.active.weak_bg_fill = BG_WIDGET_ACTIVE;
    visuals.widgets.active.bg_stroke = Stroke::new(2.0, ACCENT_BLUE);

    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.slider_width = 170.0;

    style.text_styles = [
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}
