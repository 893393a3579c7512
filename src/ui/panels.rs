use egui::{Context, RichText, ScrollArea, Ui};

use crate::ui::state::ViewerState;
use crate::ui::theme::*;

pub fn draw_control_panel(ctx: &Context, state: &mut ViewerState, fps: f32) {
    egui::SidePanel::right("control_panel")
        .min_width(280.0)
        .max_width(360.0)
        .default_width(300.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Arm Viewer").strong());
                ui.add_space(4.0);
                ui.label(
                    RichText::new("Articulated segment chain")
                        .color(TEXT_MUTED)
                        .size(11.0),
                );
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "CAMERA");
                ui.add(
                    egui::Slider::new(&mut state.cam_radius, 0.0..=10.0).text("Radius"),
                );
                ui.add(
                    egui::Slider::new(&mut state.cam_polar, 0.01..=3.14).text("Polar"),
                );
                ui.add(
                    egui::Slider::new(&mut state.cam_azimuth, 0.0..=6.28).text("Azimuth"),
                );
                ui.add_space(16.0);

                section_header(ui, "SEGMENT");
                ui.add(
                    egui::Slider::new(&mut state.segment_length, 0.0..=1.0).text("Length"),
                );
                ui.add(
                    egui::Slider::new(&mut state.segment_thickness, 0.0..=1.0).text("Thickness"),
                );
                ui.add_space(16.0);

                section_header(ui, "END EFFECTOR");
                ui.add(
                    egui::Slider::new(&mut state.end_pos[0], -1.0..=1.0).text("Position X"),
                );
                ui.add(
                    egui::Slider::new(&mut state.end_pos[1], -1.0..=1.0).text("Position Y"),
                );
                ui.add(
                    egui::Slider::new(&mut state.end_pos[2], -1.0..=1.0).text("Position Z"),
                );
                ui.add_space(16.0);

                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "PERFORMANCE");
                ui.checkbox(&mut state.vsync_enabled, "VSync");
                let fps_color = if fps >= 60.0 {
                    ACCENT_GREEN
                } else if fps >= 30.0 {
                    ACCENT_ORANGE
                } else {
                    ACCENT_RED
                };
                ui.horizontal(|ui| {
                    ui.label(RichText::new("FPS").color(TEXT_MUTED));
                    ui.label(RichText::new(format!("{fps:.0}")).color(fps_color));
                });
            });
        });
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}
