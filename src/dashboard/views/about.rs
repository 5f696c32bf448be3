//! About view

use egui::RichText;

use crate::dashboard::theme::ThemeColors;

const STAGES: [(&str, &str); 3] = [
    (
        "1. Detection",
        "A YOLO detector finds the card in the photo. The highest scoring region is cropped; \
         without a region the whole image is used.",
    ),
    (
        "2. Classification",
        "A YOLO classifier scores the crop as REAL or FAKE. The higher score wins and ties count as FAKE.",
    ),
    (
        "3. Text extraction",
        "Tesseract reads the original image. The Aadhaar number and date of birth are matched by \
         pattern; the first substantial line is taken as the name.",
    ),
];

/// Render the about view
pub fn render_about_view(ui: &mut egui::Ui) {
    ui.heading(RichText::new("About").size(24.0).strong());
    ui.add_space(8.0);
    ui.label(
        RichText::new(concat!("Aadhaar Shield v", env!("CARGO_PKG_VERSION")))
            .size(14.0)
            .color(ThemeColors::TEXT_SECONDARY),
    );

    ui.add_space(20.0);
    ui.label(
        "Screens Aadhaar card images for tampering and reads the identity fields printed on them. \
         Every document passes through three stages:",
    );
    ui.add_space(12.0);

    for (title, body) in STAGES {
        egui::Frame::none()
            .fill(ThemeColors::BG_MEDIUM)
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(14.0)
            .show(ui, |ui| {
                ui.set_min_width(520.0);
                ui.label(RichText::new(title).size(15.0).color(ThemeColors::ACCENT_PRIMARY).strong());
                ui.add_space(4.0);
                ui.label(RichText::new(body).size(13.0).color(ThemeColors::TEXT_SECONDARY));
            });
        ui.add_space(10.0);
    }

    ui.add_space(12.0);
    ui.label(
        RichText::new(
            "Results are an aid to manual review, not a substitute for it. \
             The same pipeline is available from the command line and over HTTP (POST /predict).",
        )
        .size(13.0)
        .color(ThemeColors::TEXT_MUTED),
    );
}
