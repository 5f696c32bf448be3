//! Upload & Verify view - three step wizard for a single document

use egui::RichText;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dashboard::components::render_step_indicator;
use crate::dashboard::state::{VerifyStep, VerifyViewState};
use crate::dashboard::theme::{color_with_alpha, verdict_color, ThemeColors};
use crate::pipeline::CombinedResult;
use crate::shared::{SharedAppState, WorkerJob};

const PREVIEW_SIZE: egui::Vec2 = egui::Vec2::new(420.0, 270.0);

/// Render the verify view
pub fn render_verify_view(
    ui: &mut egui::Ui,
    view_state: &mut VerifyViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    ui.heading(RichText::new("Upload & Verify").size(24.0).strong());
    ui.add_space(8.0);
    ui.label(
        RichText::new("Check a single Aadhaar card image for signs of tampering")
            .size(14.0)
            .color(ThemeColors::TEXT_SECONDARY),
    );

    ui.add_space(20.0);

    let titles = VerifyStep::ALL.map(|step| step.title());
    render_step_indicator(ui, &titles, view_state.step.index());

    ui.add_space(24.0);

    egui::ScrollArea::vertical().show(ui, |ui| match view_state.step {
        VerifyStep::Upload => render_upload_step(ui, view_state, shared_state),
        VerifyStep::Analyze => render_analyze_step(ui, view_state),
        VerifyStep::Results => {
            let threshold = shared_state.read().config.dashboard.confidence_threshold;
            render_results_step(ui, view_state, threshold);
        }
    });
}

fn render_upload_step(
    ui: &mut egui::Ui,
    view_state: &mut VerifyViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    let dropped: Vec<PathBuf> = ui
        .ctx()
        .input(|i| i.raw.dropped_files.iter().filter_map(|f| f.path.clone()).collect());
    if let Some(path) = dropped.into_iter().next() {
        if let Err(e) = view_state.select(path) {
            view_state.error = Some(e);
        }
    }

    egui::Frame::none()
        .fill(ThemeColors::BG_MEDIUM)
        .stroke(egui::Stroke::new(1.0, ThemeColors::BORDER))
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(16.0)
        .show(ui, |ui| {
            ui.set_min_size(PREVIEW_SIZE);
            refresh_preview(ui.ctx(), view_state);

            if let Some(texture) = &view_state.preview_texture {
                let tex_size = texture.size_vec2();
                let scale = (PREVIEW_SIZE.x / tex_size.x).min(PREVIEW_SIZE.y / tex_size.y).min(1.0);
                ui.centered_and_justified(|ui| {
                    ui.image((texture.id(), tex_size * scale));
                });
            } else {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new("Drop an Aadhaar card image here\n(JPG, JPEG or PNG)")
                            .size(14.0)
                            .color(ThemeColors::TEXT_MUTED),
                    );
                });
            }
        });

    ui.add_space(12.0);

    ui.horizontal(|ui| {
        ui.label("Image path:");
        let response = ui.add(
            egui::TextEdit::singleline(&mut view_state.path_input)
                .desired_width(360.0)
                .hint_text("/path/to/aadhaar.jpg"),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Load").clicked() || submitted {
            let path = PathBuf::from(view_state.path_input.trim());
            if let Err(e) = view_state.select(path) {
                view_state.error = Some(e);
            }
        }
    });

    if let Some(error) = &view_state.error {
        ui.add_space(8.0);
        ui.label(RichText::new(error).color(ThemeColors::ACCENT_ERROR).size(14.0));
    }

    ui.add_space(16.0);

    let has_document = view_state.selected.is_some();
    let analyze = ui.add_enabled(
        has_document,
        egui::Button::new(RichText::new("Analyze Document").color(ThemeColors::BG_DARK).strong())
            .fill(ThemeColors::ACCENT_PRIMARY)
            .min_size(egui::vec2(160.0, 40.0)),
    );
    if analyze.clicked() {
        if let Some(path) = view_state.start_analysis() {
            shared_state.write().runtime.queue_job(WorkerJob::Predict(path));
        }
    }
}

fn render_analyze_step(ui: &mut egui::Ui, view_state: &VerifyViewState) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.add_space(8.0);
        ui.label(RichText::new("Analyzing document...").size(16.0));
    });

    if let Some(path) = &view_state.selected {
        ui.add_space(8.0);
        ui.label(
            RichText::new(path.display().to_string())
                .size(12.0)
                .color(ThemeColors::TEXT_MUTED),
        );
    }

    ui.add_space(8.0);
    ui.label(
        RichText::new("This usually takes a few seconds")
            .size(13.0)
            .color(ThemeColors::TEXT_SECONDARY),
    );
}

fn render_results_step(ui: &mut egui::Ui, view_state: &mut VerifyViewState, threshold: f32) {
    let mut restart = false;
    let mut retry = false;

    if let Some(result) = &view_state.result {
        render_verdict_card(ui, result, threshold);
        ui.add_space(16.0);
        render_fields(ui, result);
        ui.add_space(16.0);
        render_details(ui, result);
    } else {
        let message = view_state.error.as_deref().unwrap_or("No result");
        egui::Frame::none()
            .fill(color_with_alpha(ThemeColors::ACCENT_ERROR, 51))
            .rounding(egui::Rounding::same(6.0))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Verification failed:")
                            .color(ThemeColors::ACCENT_ERROR)
                            .strong(),
                    );
                    ui.label(RichText::new(message).color(ThemeColors::TEXT_PRIMARY));
                });
            });
        ui.add_space(12.0);
        retry = ui.button("Try Again").clicked();
    }

    ui.add_space(20.0);
    if ui
        .add(egui::Button::new("Analyze Another").min_size(egui::vec2(150.0, 36.0)))
        .clicked()
    {
        restart = true;
    }

    if restart {
        view_state.reset();
    } else if retry {
        view_state.step = VerifyStep::Upload;
    }
}

fn render_verdict_card(ui: &mut egui::Ui, result: &CombinedResult, threshold: f32) {
    let verdict = &result.fraud;
    let color = verdict_color(verdict.is_genuine());
    let headline = if verdict.is_genuine() {
        "DOCUMENT VERIFIED"
    } else {
        "POTENTIAL FRAUD DETECTED"
    };

    egui::Frame::none()
        .fill(color_with_alpha(color, 40))
        .stroke(egui::Stroke::new(1.5, color))
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(20.0)
        .show(ui, |ui| {
            ui.set_min_width(PREVIEW_SIZE.x);
            ui.label(RichText::new(headline).size(22.0).color(color).strong());
            ui.add_space(4.0);
            ui.label(
                RichText::new(format!("Classified as {}", verdict.label))
                    .size(14.0)
                    .color(ThemeColors::TEXT_SECONDARY),
            );
            ui.add_space(12.0);
            ui.add(
                egui::ProgressBar::new(verdict.confidence)
                    .fill(color)
                    .text(format!("Confidence {:.1}%", verdict.confidence * 100.0)),
            );

            if verdict.needs_review(threshold) {
                ui.add_space(10.0);
                ui.label(
                    RichText::new(format!(
                        "Confidence is below {:.0}%. Manual review recommended.",
                        threshold * 100.0
                    ))
                    .color(ThemeColors::ACCENT_WARNING),
                );
            }
        });
}

fn render_fields(ui: &mut egui::Ui, result: &CombinedResult) {
    ui.heading(RichText::new("Extracted Information").size(18.0));
    ui.add_space(8.0);

    egui::Grid::new("extracted_fields")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            for (label, value) in [
                ("Name", &result.ocr.name),
                ("Date of Birth", &result.ocr.dob),
                ("Aadhaar Number", &result.ocr.aadhaar_number),
            ] {
                ui.label(RichText::new(label).color(ThemeColors::TEXT_MUTED));
                ui.label(RichText::new(value).monospace());
                ui.end_row();
            }
        });

    if !result.ocr.raw_text.trim().is_empty() {
        ui.add_space(8.0);
        egui::CollapsingHeader::new("Recognized text").show(ui, |ui| {
                ui.label(
                    RichText::new(&result.ocr.raw_text)
                        .monospace()
                        .size(12.0)
                        .color(ThemeColors::TEXT_SECONDARY),
                );
            });
    }
}

fn render_details(ui: &mut egui::Ui, result: &CombinedResult) {
    ui.heading(RichText::new("Analysis Details").size(18.0));
    ui.add_space(8.0);

    egui::Grid::new("analysis_details")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label(RichText::new("Real score:").color(ThemeColors::TEXT_MUTED));
            ui.label(format!("{:.3}", result.fraud.real_score));
            ui.end_row();

            ui.label(RichText::new("Fake score:").color(ThemeColors::TEXT_MUTED));
            ui.label(format!("{:.3}", result.fraud.fake_score));
            ui.end_row();

            ui.label(RichText::new("Card region:").color(ThemeColors::TEXT_MUTED));
            match &result.region {
                Some(region) => ui.label(format!(
                    "({:.0}, {:.0}) to ({:.0}, {:.0}), detector {:.0}%",
                    region.x1,
                    region.y1,
                    region.x2,
                    region.y2,
                    region.confidence * 100.0
                )),
                None => ui.label(
                    RichText::new("Not detected, full image analyzed")
                        .color(ThemeColors::ACCENT_WARNING),
                ),
            };
            ui.end_row();

            ui.label(RichText::new("Cropped image:").color(ThemeColors::TEXT_MUTED));
            ui.label(display_name(&result.crop_path));
            ui.end_row();

            ui.label(RichText::new("Processing time:").color(ThemeColors::TEXT_MUTED));
            ui.label(format!("{} ms", result.processing_time_ms));
            ui.end_row();
        });
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load a downscaled preview when the selected document changed
fn refresh_preview(ctx: &egui::Context, view_state: &mut VerifyViewState) {
    if view_state.preview_path == view_state.selected {
        return;
    }

    view_state.preview_path = view_state.selected.clone();
    view_state.preview_texture = view_state.selected.as_deref().and_then(|path| {
        match image::open(path) {
            Ok(img) => {
                let rgba = img.thumbnail(840, 540).to_rgba8();
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [rgba.width() as usize, rgba.height() as usize],
                    rgba.as_raw(),
                );
                Some(ctx.load_texture("verify_preview", color_image, egui::TextureOptions::LINEAR))
            }
            Err(e) => {
                tracing::warn!("Could not load preview for {:?}: {}", path, e);
                None
            }
        }
    });
}
