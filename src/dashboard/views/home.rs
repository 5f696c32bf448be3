//! Home view - engine status, session counters and feature overview

use egui::RichText;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::dashboard::components::{CardStatus, StatusCard};
use crate::dashboard::state::{DashboardView, HomeViewState};
use crate::dashboard::theme::{color_with_alpha, ThemeColors};
use crate::shared::{EngineStatus, SharedAppState};

const FEATURES: [(&str, &str); 3] = [
    (
        "Document Detection",
        "Locates the card in the photo and crops it before anything else looks at it.",
    ),
    (
        "Fraud Classification",
        "Scores the crop as real or fake and flags low-confidence verdicts for review.",
    ),
    (
        "Field Extraction",
        "Reads the identity fields printed on the card with Tesseract OCR.",
    ),
];

/// Render the home view. Returns a view to navigate to, if any.
pub fn render_home_view(
    ui: &mut egui::Ui,
    state: &mut HomeViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) -> Option<DashboardView> {
    let mut navigate = None;
    let app_state = shared_state.read();

    ui.heading(RichText::new("Aadhaar Fraud Detection").size(24.0).strong());
    ui.add_space(8.0);
    ui.label(
        RichText::new("Verify Aadhaar card images and read their identity fields")
            .size(14.0)
            .color(ThemeColors::TEXT_SECONDARY),
    );

    ui.add_space(24.0);

    ui.horizontal(|ui| {
        let (engine_value, engine_status) = match &app_state.runtime.engine_status {
            EngineStatus::Loading => ("Loading", CardStatus::Warning),
            EngineStatus::Ready => ("Ready", CardStatus::Good),
            EngineStatus::Failed(_) => ("Unavailable", CardStatus::Bad),
        };
        StatusCard::new("Fraud Engine", engine_value, engine_status).show(ui);

        ui.add_space(16.0);

        StatusCard::new(
            "Documents Verified",
            app_state.runtime.documents_verified.to_string(),
            CardStatus::Neutral,
        )
        .with_caption("this session")
        .show(ui);

        ui.add_space(16.0);

        let flagged = app_state.runtime.frauds_flagged;
        StatusCard::new(
            "Potential Fraud",
            flagged.to_string(),
            if flagged > 0 { CardStatus::Bad } else { CardStatus::Good },
        )
        .with_caption("this session")
        .show(ui);
    });

    ui.add_space(32.0);

    ui.horizontal(|ui| {
        if ui
            .add(
                egui::Button::new(
                    RichText::new("Start Verification").color(ThemeColors::BG_DARK).strong(),
                )
                .fill(ThemeColors::ACCENT_PRIMARY)
                .min_size(egui::vec2(160.0, 40.0)),
            )
            .clicked()
        {
            navigate = Some(DashboardView::Verify);
        }

        ui.add_space(12.0);

        if ui
            .add(egui::Button::new("Batch Process").min_size(egui::vec2(140.0, 40.0)))
            .clicked()
        {
            navigate = Some(DashboardView::Batch);
        }
    });

    ui.add_space(32.0);

    let arrow = if state.features_collapsed { ">" } else { "v" };
    if ui
        .add(
            egui::Label::new(RichText::new(format!("{arrow}  How it works")).size(18.0))
                .sense(egui::Sense::click()),
        )
        .clicked()
    {
        state.features_collapsed = !state.features_collapsed;
    }

    if !state.features_collapsed {
        ui.add_space(12.0);
        ui.horizontal_wrapped(|ui| {
            for (title, body) in FEATURES {
                egui::Frame::none()
                    .fill(ThemeColors::BG_MEDIUM)
                    .rounding(egui::Rounding::same(8.0))
                    .inner_margin(16.0)
                    .show(ui, |ui| {
                        ui.set_width(220.0);
                        ui.label(
                            RichText::new(title)
                                .size(15.0)
                                .color(ThemeColors::ACCENT_PRIMARY)
                                .strong(),
                        );
                        ui.add_space(6.0);
                        ui.label(RichText::new(body).size(13.0).color(ThemeColors::TEXT_SECONDARY));
                    });
                ui.add_space(12.0);
            }
        });
    }

    if let Some(error) = &app_state.runtime.last_error {
        ui.add_space(24.0);
        egui::Frame::none()
            .fill(color_with_alpha(ThemeColors::ACCENT_ERROR, 51))
            .rounding(egui::Rounding::same(6.0))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Error:").color(ThemeColors::ACCENT_ERROR).strong());
                    ui.label(RichText::new(error).color(ThemeColors::TEXT_PRIMARY));
                });
            });
    }

    navigate
}
