//! Wizard progress indicator

use egui::{RichText, Vec2};

use crate::dashboard::theme::ThemeColors;

/// Numbered circles joined by lines; steps before `current` are drawn done.
pub fn render_step_indicator(ui: &mut egui::Ui, steps: &[&str], current: usize) {
    ui.horizontal(|ui| {
        for (index, title) in steps.iter().enumerate() {
            let color = if index < current {
                ThemeColors::VERDICT_GENUINE
            } else if index == current {
                ThemeColors::ACCENT_PRIMARY
            } else {
                ThemeColors::TEXT_MUTED
            };

            let (rect, _) = ui.allocate_exact_size(Vec2::splat(28.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 14.0, color);
            let mark = if index < current {
                "✔".to_string()
            } else {
                (index + 1).to_string()
            };
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                mark,
                egui::FontId::proportional(14.0),
                ThemeColors::BG_DARK,
            );

            ui.label(RichText::new(*title).size(14.0).color(color).strong());

            if index + 1 < steps.len() {
                let (line, _) = ui.allocate_exact_size(Vec2::new(48.0, 28.0), egui::Sense::hover());
                let line_color = if index < current {
                    ThemeColors::VERDICT_GENUINE
                } else {
                    ThemeColors::BORDER
                };
                ui.painter().line_segment(
                    [line.left_center(), line.right_center()],
                    egui::Stroke::new(2.0, line_color),
                );
            }
        }
    });
}
