use egui::{Context, RichText};

use crate::controller::{display_rounded, NavigationMode, NavigationStatus};
use crate::options::NavigationOptions;

/// What the user changed through the HUD this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct UiActions {
    pub requested_mode: Option<NavigationMode>,
}

/// Build the HUD. Navigation options are edited in place and take effect on
/// the next frame.
pub fn build_ui(
    ctx: &Context,
    status: &NavigationStatus,
    navigation: &mut NavigationOptions,
    pointer_locked: bool,
    fps: f32,
) -> UiActions {
    let mut actions = UiActions::default();
    if pointer_locked {
        draw_crosshair(ctx);
    }
    draw_status_window(ctx, status, fps);
    draw_settings_window(ctx, status.mode, navigation, &mut actions);
    if let Some(prompt) = status.prompt {
        draw_prompt(ctx, prompt);
    }
    actions
}

fn draw_crosshair(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Foreground, egui::Id::new("crosshair")));
    let center = ctx.screen_rect().center();
    let size = 8.0;
    let stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
    painter.line_segment([egui::pos2(center.x - size, center.y), egui::pos2(center.x + size, center.y)], stroke);
    painter.line_segment([egui::pos2(center.x, center.y - size), egui::pos2(center.x, center.y + size)], stroke);
}

fn format_vec(v: glam::Vec3) -> String {
    let v = display_rounded(v);
    format!("{:.2}, {:.2}, {:.2}", v.x, v.y, v.z)
}

fn draw_status_window(ctx: &Context, status: &NavigationStatus, fps: f32) {
    egui::Window::new("Status")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(RichText::new(format!("FPS: {fps:.0}")).small());
            ui.label(RichText::new(format!("Mode: {}", status.mode)).small());
            ui.label(RichText::new(format!("Camera: {}", format_vec(status.camera_position))).small());
            ui.label(RichText::new(format!("Looking: {}", format_vec(status.camera_direction))).small());
            if let (Some(position), Some(orientation)) = (status.avatar_position, status.avatar_orientation) {
                let (yaw, _, _) = orientation.to_euler(glam::EulerRot::YXZ);
                ui.separator();
                ui.label(RichText::new(format!("Avatar: {}", format_vec(position))).small());
                ui.label(RichText::new(format!("Heading: {:.0}°", yaw.to_degrees())).small());
            }
            ui.separator();
            ui.label(RichText::new("WASD / arrows - Move").small());
            ui.label(RichText::new("Space / Shift - Up / down (fly)").small());
            ui.label(RichText::new("F - Open or close door").small());
            ui.label(RichText::new("Click - Capture mouse, Esc - release").small());
        });
}

fn draw_settings_window(
    ctx: &Context,
    current: NavigationMode,
    navigation: &mut NavigationOptions,
    actions: &mut UiActions,
) {
    egui::Window::new("Navigation")
        .default_pos([ctx.screen_rect().width() - 200.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            let mut mode = current;
            egui::ComboBox::from_label("Mode")
                .selected_text(mode.label())
                .show_ui(ui, |ui| {
                    for candidate in NavigationMode::ALL {
                        ui.selectable_value(&mut mode, candidate, candidate.label());
                    }
                });
            if mode != current {
                actions.requested_mode = Some(mode);
            }

            ui.label(RichText::new("Move speed").small());
            ui.add(egui::Slider::new(&mut navigation.move_speed, 1.0..=60.0).step_by(0.5));
            ui.checkbox(&mut navigation.collision_enabled, "Collision");
            ui.checkbox(&mut navigation.show_collision_mesh, "Show collider");
        });
}

fn draw_prompt(ctx: &Context, prompt: &str) {
    egui::Area::new(egui::Id::new("door_prompt"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -48.0])
        .show(ctx, |ui| {
            egui::Frame::NONE
                .fill(egui::Color32::from_black_alpha(160))
                .corner_radius(4.0)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.label(RichText::new(prompt).color(egui::Color32::WHITE));
                });
        });
}
