//! Batch Process view - verify many documents and export a report

use egui::RichText;
use egui_extras::{Column, TableBuilder};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dashboard::components::{CardStatus, StatusCard};
use crate::dashboard::state::BatchViewState;
use crate::dashboard::theme::{verdict_color, ThemeColors};
use crate::pipeline::batch::{export_csv, BATCH_CSV_NAME};
use crate::pipeline::{BatchRow, BatchStatus};
use crate::shared::{SharedAppState, WorkerJob};
use crate::storage::outputs::list_images;
use crate::storage::OutputDir;

/// Render the batch view
pub fn render_batch_view(
    ui: &mut egui::Ui,
    view_state: &mut BatchViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    ui.heading(RichText::new("Batch Process").size(24.0).strong());
    ui.add_space(8.0);
    ui.label(
        RichText::new("Verify a set of documents and export the results as CSV")
            .size(14.0)
            .color(ThemeColors::TEXT_SECONDARY),
    );

    ui.add_space(20.0);

    if !view_state.running {
        let dropped: Vec<PathBuf> = ui
            .ctx()
            .input(|i| i.raw.dropped_files.iter().filter_map(|f| f.path.clone()).collect());
        for path in dropped {
            add_path(view_state, &path);
        }
    }

    ui.add_enabled_ui(!view_state.running, |ui| {
        ui.horizontal(|ui| {
            ui.label("Image or folder:");
            ui.add(
                egui::TextEdit::singleline(&mut view_state.path_input)
                    .desired_width(340.0)
                    .hint_text("/path/to/scans"),
            );
            if ui.button("Add").clicked() {
                let path = PathBuf::from(view_state.path_input.trim());
                add_path(view_state, &path);
                view_state.path_input.clear();
            }
            if ui.button("Clear").clicked() {
                view_state.clear();
            }
        });
    });

    ui.add_space(4.0);
    ui.label(
        RichText::new(format!(
            "{} document(s) queued. Images can also be dropped onto the window.",
            view_state.files.len()
        ))
        .size(12.0)
        .color(ThemeColors::TEXT_MUTED),
    );

    if let Some(message) = &view_state.message {
        ui.add_space(4.0);
        ui.label(RichText::new(message).size(13.0).color(ThemeColors::ACCENT_SECONDARY));
    }

    ui.add_space(12.0);

    ui.horizontal(|ui| {
        let start = ui.add_enabled(
            !view_state.running && !view_state.files.is_empty(),
            egui::Button::new(RichText::new("Start Batch").color(ThemeColors::BG_DARK).strong())
                .fill(ThemeColors::ACCENT_PRIMARY)
                .min_size(egui::vec2(140.0, 36.0)),
        );
        if start.clicked() {
            if let Some(files) = view_state.start() {
                shared_state.write().runtime.queue_job(WorkerJob::Batch(files));
            }
        }

        ui.add_space(12.0);

        let export = ui.add_enabled(
            !view_state.running && !view_state.items.is_empty(),
            egui::Button::new("Export CSV").min_size(egui::vec2(120.0, 36.0)),
        );
        if export.clicked() {
            let state = shared_state.read();
            let rows = view_state.rows(state.config.dashboard.confidence_threshold);
            view_state.message = Some(
                match write_report(&state.config.general.output_dir, &rows) {
                    Ok(path) => format!("Saved report to {}", path.display()),
                    Err(e) => format!("Export failed: {e:#}"),
                },
            );
        }
    });

    if view_state.running || view_state.progress.1 > 0 {
        ui.add_space(12.0);
        let (done, total) = view_state.progress;
        ui.add(
            egui::ProgressBar::new(view_state.fraction())
                .fill(ThemeColors::ACCENT_PRIMARY)
                .text(format!("{done} / {total}")),
        );
    }

    if view_state.items.is_empty() {
        return;
    }

    let threshold = shared_state.read().config.dashboard.confidence_threshold;
    let rows = view_state.rows(threshold);
    let summary = view_state.summary(threshold);

    ui.add_space(20.0);

    ui.horizontal(|ui| {
        StatusCard::new("Total", summary.total.to_string(), CardStatus::Neutral).show(ui);
        ui.add_space(12.0);
        StatusCard::new("Genuine", summary.genuine.to_string(), CardStatus::Good).show(ui);
        ui.add_space(12.0);
        StatusCard::new("Fraud", summary.fraud.to_string(), CardStatus::Bad).show(ui);
        ui.add_space(12.0);
        let rate_status = if summary.fraud > 0 {
            CardStatus::Warning
        } else {
            CardStatus::Neutral
        };
        let card = StatusCard::new(
            "Fraud Rate",
            format!("{:.1}%", summary.fraud_rate()),
            rate_status,
        );
        if summary.errors > 0 {
            card.with_caption(format!("{} failed", summary.errors)).show(ui);
        } else {
            card.show(ui);
        }
    });

    ui.add_space(16.0);
    render_results_table(ui, &rows);
}

fn render_results_table(ui: &mut egui::Ui, rows: &[BatchRow]) {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::initial(180.0).at_least(100.0))
        .column(Column::initial(80.0))
        .column(Column::initial(90.0))
        .column(Column::initial(150.0))
        .column(Column::initial(100.0))
        .column(Column::initial(140.0))
        .column(Column::remainder())
        .header(24.0, |mut header| {
            for title in [
                "Document",
                "Status",
                "Confidence",
                "Name",
                "DOB",
                "Aadhaar Number",
                "Details",
            ] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in rows {
                body.row(22.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(&row.document);
                    });
                    table_row.col(|ui| {
                        let color = match row.status {
                            BatchStatus::Error => ThemeColors::ACCENT_WARNING,
                            status => verdict_color(status == BatchStatus::Genuine),
                        };
                        ui.label(RichText::new(row.status.as_str()).color(color).strong());
                    });
                    table_row.col(|ui| {
                        ui.label(&row.confidence);
                    });
                    table_row.col(|ui| {
                        ui.label(&row.name);
                    });
                    table_row.col(|ui| {
                        ui.label(&row.dob);
                    });
                    table_row.col(|ui| {
                        ui.monospace(&row.aadhaar_number);
                    });
                    table_row.col(|ui| {
                        ui.label(RichText::new(&row.details).color(ThemeColors::TEXT_SECONDARY));
                    });
                });
            }
        });
}

/// Queue a single image or every image in a folder
fn add_path(view_state: &mut BatchViewState, path: &Path) {
    if path.as_os_str().is_empty() {
        return;
    }

    if path.is_dir() {
        match list_images(path) {
            Ok(images) => {
                let added = images.iter().filter(|p| view_state.add_file(p)).count();
                view_state.message = Some(format!("Added {added} image(s) from {}", path.display()));
            }
            Err(e) => view_state.message = Some(format!("Could not read {}: {e}", path.display())),
        }
    } else if !path.is_file() {
        view_state.message = Some(format!("File not found: {}", path.display()));
    } else if !view_state.add_file(path) {
        view_state.message = Some(format!(
            "Skipped {}: not a JPG/PNG image or already queued",
            path.display()
        ));
    }
}

/// Write the batch report into the output directory
fn write_report(output_dir: &Path, rows: &[BatchRow]) -> anyhow::Result<PathBuf> {
    let outputs = OutputDir::new(output_dir)?;
    let path = outputs.export_path(BATCH_CSV_NAME);
    export_csv(&path, rows)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::write_image;
    use tempfile::tempdir;

    #[test]
    fn test_add_path_directory_and_file() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 4, 4);
        write_image(dir.path(), "b.jpg", 4, 4);
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let mut state = BatchViewState::default();
        add_path(&mut state, dir.path());
        assert_eq!(state.files.len(), 2);
        assert!(state.message.as_deref().unwrap().contains("Added 2"));

        add_path(&mut state, &dir.path().join("a.png"));
        assert_eq!(state.files.len(), 2);
        assert!(state.message.as_deref().unwrap().starts_with("Skipped"));

        add_path(&mut state, &dir.path().join("gone.png"));
        assert!(state.message.as_deref().unwrap().starts_with("File not found"));
    }

    #[test]
    fn test_write_report_creates_csv() {
        let dir = tempdir().unwrap();
        let rows = vec![BatchRow {
            document: "a.png".to_string(),
            status: BatchStatus::Fraud,
            confidence: "91.0%".to_string(),
            name: "Asha".to_string(),
            dob: "01/02/1990".to_string(),
            aadhaar_number: "1234 5678 9012".to_string(),
            details: String::new(),
        }];

        let out = dir.path().join("outputs");
        let path = write_report(&out, &rows).unwrap();
        assert_eq!(path, out.join(BATCH_CSV_NAME));

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("Document,Status,Confidence"));
        assert!(content.contains("a.png,Fraud,91.0%"));
    }
}
