//! Settings view - thresholds, model locations and OCR tuning

use egui::RichText;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{save_config, AppConfig};
use crate::dashboard::state::{SettingsSection, SettingsViewState};
use crate::dashboard::theme::ThemeColors;
use crate::shared::{SharedAppState, WorkerJob};
use crate::storage;

/// Render the settings view
pub fn render_settings_view(
    ui: &mut egui::Ui,
    view_state: &mut SettingsViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    ui.heading(RichText::new("Settings").size(24.0).strong());
    ui.add_space(8.0);
    ui.label(
        RichText::new("Review thresholds, model files and text recognition")
            .size(14.0)
            .color(ThemeColors::TEXT_SECONDARY),
    );

    ui.add_space(24.0);

    let mut changed = false;

    egui::ScrollArea::vertical().show(ui, |ui| {
        changed |= section(ui, view_state, SettingsSection::General, "General", |ui| {
            let mut state = shared_state.write();
            let config = &mut state.config;
            let mut changed = false;

            ui.horizontal(|ui| {
                ui.label("Confidence threshold:");
                ui.add_space(8.0);
                changed |= ui
                    .add(egui::Slider::new(
                        &mut config.dashboard.confidence_threshold,
                        0.5..=1.0,
                    ))
                    .changed();
            });
            hint(ui, "Verdicts below this confidence are flagged for manual review");

            ui.add_space(8.0);
            changed |= path_field(ui, "Output directory:", &mut config.general.output_dir);
            hint(ui, "Crops, uploads and CSV reports are written here");
            changed
        });

        ui.add_space(16.0);

        changed |= section(ui, view_state, SettingsSection::Models, "Models", |ui| {
            let mut state = shared_state.write();
            let models = &mut state.config.models;
            let mut changed = false;

            changed |= optional_path_field(ui, "Detector model:", &mut models.detector_path);
            changed |= optional_path_field(ui, "Classifier model:", &mut models.classifier_path);
            hint(ui, "Leave empty to use the downloaded models in the data directory");

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label("Use GPU (CUDA):");
                ui.add_space(8.0);
                changed |= ui.checkbox(&mut models.use_gpu, "").changed();
            });
            ui.horizontal(|ui| {
                ui.label("Inference threads:");
                ui.add_space(8.0);
                changed |= ui
                    .add(egui::DragValue::new(&mut models.intra_threads).range(1..=32))
                    .changed();
            });
            changed
        });

        ui.add_space(16.0);

        changed |= section(ui, view_state, SettingsSection::Detection, "Detection", |ui| {
            let mut state = shared_state.write();
            let detection = &mut state.config.detection;
            let mut changed = false;

            ui.horizontal(|ui| {
                ui.label("Minimum confidence:");
                ui.add_space(8.0);
                changed |= ui
                    .add(egui::Slider::new(&mut detection.confidence_threshold, 0.05..=0.95))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Overlap (IoU) threshold:");
                ui.add_space(8.0);
                changed |= ui
                    .add(egui::Slider::new(&mut detection.iou_threshold, 0.1..=0.9))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Max regions:");
                ui.add_space(8.0);
                changed |= ui
                    .add(egui::DragValue::new(&mut detection.max_detections).range(1..=100))
                    .changed();
            });
            changed
        });

        ui.add_space(16.0);

        changed |= section(ui, view_state, SettingsSection::Ocr, "Text Recognition", |ui| {
            let mut state = shared_state.write();
            let ocr = &mut state.config.ocr;
            let mut changed = false;

            ui.horizontal(|ui| {
                ui.label("Language:");
                ui.add_space(8.0);
                changed |= ui
                    .add(egui::TextEdit::singleline(&mut ocr.language).desired_width(120.0))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Page segmentation mode:");
                ui.add_space(8.0);
                changed |= ui
                    .add(egui::DragValue::new(&mut ocr.page_segmentation_mode).range(0..=13))
                    .changed();
            });

            ui.add_space(8.0);
            let pre = &mut ocr.preprocessing;
            ui.horizontal(|ui| {
                ui.label("Clean up scans before OCR:");
                ui.add_space(8.0);
                changed |= ui.checkbox(&mut pre.enabled, "").changed();
            });

            ui.add_enabled_ui(pre.enabled, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Blur sigma:");
                    ui.add_space(8.0);
                    changed |= ui
                        .add(egui::Slider::new(&mut pre.blur_sigma, 0.0..=3.0))
                        .changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Threshold block radius:");
                    ui.add_space(8.0);
                    changed |= ui
                        .add(egui::DragValue::new(&mut pre.block_radius).range(1..=25))
                        .changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Threshold offset:");
                    ui.add_space(8.0);
                    changed |= ui
                        .add(egui::DragValue::new(&mut pre.threshold_offset).range(-20..=20))
                        .changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Opening radius:");
                    ui.add_space(8.0);
                    changed |= ui
                        .add(egui::DragValue::new(&mut pre.open_radius).range(0..=5))
                        .changed();
                });
            });
            changed
        });

        ui.add_space(16.0);

        changed |= section(ui, view_state, SettingsSection::Server, "API Server", |ui| {
            let mut state = shared_state.write();
            let server = &mut state.config.server;
            let mut changed = false;

            ui.horizontal(|ui| {
                ui.label("Host:");
                ui.add_space(8.0);
                changed |= ui
                    .add(egui::TextEdit::singleline(&mut server.host).desired_width(160.0))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Port:");
                ui.add_space(8.0);
                changed |= ui.add(egui::DragValue::new(&mut server.port)).changed();
            });
            hint(ui, "Used by the `serve` command");
            changed
        });

        ui.add_space(24.0);

        ui.horizontal(|ui| {
            let save = ui.add(
                egui::Button::new(
                    RichText::new("Save & Reload Models").color(ThemeColors::BG_DARK).strong(),
                )
                .fill(ThemeColors::ACCENT_PRIMARY)
                .min_size(egui::vec2(180.0, 36.0)),
            );
            if save.clicked() {
                let mut state = shared_state.write();
                view_state.status_message = Some(match persist(&state) {
                    Ok(path) => {
                        view_state.has_unsaved_changes = false;
                        let config = state.config.clone();
                        state.runtime.queue_job(WorkerJob::Reload(config));
                        format!("Saved to {}", path.display())
                    }
                    Err(e) => format!("Save failed: {e:#}"),
                });
            }

            ui.add_space(12.0);

            if ui
                .add(egui::Button::new("Reset to Defaults").min_size(egui::vec2(140.0, 36.0)))
                .clicked()
            {
                let mut state = shared_state.write();
                let last_view = state.config.dashboard.last_view;
                state.config = AppConfig::default();
                state.config.dashboard.last_view = last_view;
                view_state.has_unsaved_changes = true;
            }

            ui.add_space(16.0);

            if view_state.has_unsaved_changes {
                ui.label(
                    RichText::new("Unsaved changes")
                        .size(12.0)
                        .color(ThemeColors::ACCENT_WARNING),
                );
            }
        });

        if let Some(message) = &view_state.status_message {
            ui.add_space(8.0);
            ui.label(RichText::new(message).size(12.0).color(ThemeColors::TEXT_MUTED));
        }
    });

    if changed {
        view_state.has_unsaved_changes = true;
    }
}

/// A collapsible settings card; returns whether its contents changed anything
fn section(
    ui: &mut egui::Ui,
    view_state: &mut SettingsViewState,
    which: SettingsSection,
    title: &str,
    add_contents: impl FnOnce(&mut egui::Ui) -> bool,
) -> bool {
    let is_expanded = view_state.expanded_section == Some(which);
    let mut changed = false;

    egui::Frame::none()
        .fill(ThemeColors::BG_MEDIUM)
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(16.0)
        .show(ui, |ui| {
            let header_response = ui
                .horizontal(|ui| {
                    let arrow = if is_expanded { "v" } else { ">" };
                    ui.label(RichText::new(arrow).size(12.0).color(ThemeColors::TEXT_MUTED));
                    ui.add_space(8.0);
                    ui.heading(RichText::new(title).size(16.0));
                })
                .response;

            if header_response.interact(egui::Sense::click()).clicked() {
                view_state.expanded_section = if is_expanded { None } else { Some(which) };
            }

            if is_expanded {
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);
                changed = add_contents(ui);
            }
        });

    changed
}

fn hint(ui: &mut egui::Ui, text: &str) {
    ui.label(RichText::new(text).size(11.0).color(ThemeColors::TEXT_MUTED));
}

fn path_field(ui: &mut egui::Ui, label: &str, path: &mut PathBuf) -> bool {
    let mut text = path.display().to_string();
    let changed = ui
        .horizontal(|ui| {
            ui.label(label);
            ui.add_space(8.0);
            ui.add(egui::TextEdit::singleline(&mut text).desired_width(320.0))
                .changed()
        })
        .inner;
    if changed {
        *path = PathBuf::from(text);
    }
    changed
}

fn optional_path_field(ui: &mut egui::Ui, label: &str, path: &mut Option<PathBuf>) -> bool {
    let mut text = path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let changed = ui
        .horizontal(|ui| {
            ui.label(label);
            ui.add_space(8.0);
            ui.add(
                egui::TextEdit::singleline(&mut text)
                    .desired_width(320.0)
                    .hint_text("default"),
            )
            .changed()
        })
        .inner;
    if changed {
        let trimmed = text.trim();
        *path = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
    }
    changed
}

/// Save to the file the configuration came from, or the default location
fn persist(state: &SharedAppState) -> anyhow::Result<PathBuf> {
    let path = match &state.config_path {
        Some(path) => path.clone(),
        None => storage::config_file_path()?,
    };
    save_config(&state.config_to_save(), &path)?;
    Ok(path)
}
