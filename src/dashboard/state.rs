//! Dashboard view state management

use std::path::{Path, PathBuf};

use crate::config::DashboardViewSetting;
use crate::pipeline::{BatchItem, BatchRow, BatchSummary, CombinedResult};
use crate::shared::{EngineStatus, RuntimeState, WorkerEvent};
use crate::storage::outputs::is_image_file;

/// Current view in the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardView {
    #[default]
    Home,
    Verify,
    Batch,
    Settings,
    About,
}

impl DashboardView {
    /// Get the display name for this view
    pub fn name(&self) -> &'static str {
        match self {
            DashboardView::Home => "Home",
            DashboardView::Verify => "Upload & Verify",
            DashboardView::Batch => "Batch Process",
            DashboardView::Settings => "Settings",
            DashboardView::About => "About",
        }
    }

    /// Get the icon character for this view
    pub fn icon(&self) -> &'static str {
        match self {
            DashboardView::Home => "H",
            DashboardView::Verify => "V",
            DashboardView::Batch => "B",
            DashboardView::Settings => "S",
            DashboardView::About => "?",
        }
    }

    /// Convert to persistable setting
    pub fn to_setting(&self) -> DashboardViewSetting {
        match self {
            DashboardView::Home => DashboardViewSetting::Home,
            DashboardView::Verify => DashboardViewSetting::Verify,
            DashboardView::Batch => DashboardViewSetting::Batch,
            DashboardView::Settings => DashboardViewSetting::Settings,
            DashboardView::About => DashboardViewSetting::About,
        }
    }

    /// Convert from persistable setting
    pub fn from_setting(setting: DashboardViewSetting) -> Self {
        match setting {
            DashboardViewSetting::Home => DashboardView::Home,
            DashboardViewSetting::Verify => DashboardView::Verify,
            DashboardViewSetting::Batch => DashboardView::Batch,
            DashboardViewSetting::Settings => DashboardView::Settings,
            DashboardViewSetting::About => DashboardView::About,
        }
    }
}

/// Overall dashboard state
#[derive(Debug, Default)]
pub struct DashboardState {
    /// Current active view
    pub current_view: DashboardView,
    pub home: HomeViewState,
    pub verify: VerifyViewState,
    pub batch: BatchViewState,
    pub settings: SettingsViewState,
}

impl DashboardState {
    pub fn new(initial_view: DashboardView) -> Self {
        Self {
            current_view: initial_view,
            ..Default::default()
        }
    }

    /// Fold a worker event into view and runtime state
    pub fn apply_event(&mut self, event: WorkerEvent, runtime: &mut RuntimeState) {
        match event {
            WorkerEvent::EngineReady => {
                runtime.engine_status = EngineStatus::Ready;
                runtime.clear_error();
            }
            WorkerEvent::EngineFailed(message) => {
                runtime.engine_status = EngineStatus::Failed(message.clone());
                runtime.set_error(message);
            }
            WorkerEvent::Predicted { path, outcome } => {
                runtime.busy = false;
                if let Ok(result) = &outcome {
                    runtime.record_verdict(result.fraud.is_genuine());
                }
                // A result for a document the user has since replaced is dropped
                if self.verify.selected.as_deref() == Some(path.as_path()) {
                    self.verify.finish(outcome);
                }
            }
            WorkerEvent::BatchProgress { index, total, item } => {
                self.batch.progress = (index + 1, total);
                self.batch.items.push(item);
            }
            WorkerEvent::BatchDone => {
                runtime.busy = false;
                self.batch.running = false;
            }
        }
    }
}

/// Home view state
#[derive(Debug, Default)]
pub struct HomeViewState {
    /// Feature cards folded away
    pub features_collapsed: bool,
}

/// Steps of the single-document wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyStep {
    #[default]
    Upload,
    Analyze,
    Results,
}

impl VerifyStep {
    pub const ALL: [VerifyStep; 3] = [VerifyStep::Upload, VerifyStep::Analyze, VerifyStep::Results];

    pub fn title(&self) -> &'static str {
        match self {
            VerifyStep::Upload => "Upload",
            VerifyStep::Analyze => "Analyze",
            VerifyStep::Results => "Results",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            VerifyStep::Upload => 0,
            VerifyStep::Analyze => 1,
            VerifyStep::Results => 2,
        }
    }
}

/// Upload & Verify wizard state
#[derive(Default)]
pub struct VerifyViewState {
    pub step: VerifyStep,
    /// Path typed by the user
    pub path_input: String,
    /// Document chosen for verification
    pub selected: Option<PathBuf>,
    /// Preview of the selected document
    pub preview_texture: Option<egui::TextureHandle>,
    /// Path the preview was loaded from
    pub preview_path: Option<PathBuf>,
    pub result: Option<CombinedResult>,
    pub error: Option<String>,
}

impl std::fmt::Debug for VerifyViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyViewState")
            .field("step", &self.step)
            .field("path_input", &self.path_input)
            .field("selected", &self.selected)
            .field("preview_texture", &self.preview_texture.as_ref().map(|_| "<texture>"))
            .field("result", &self.result)
            .field("error", &self.error)
            .finish()
    }
}

impl VerifyViewState {
    /// Choose a document, discarding any previous result
    pub fn select(&mut self, path: PathBuf) -> Result<(), String> {
        if !path.is_file() {
            return Err(format!("File not found: {}", path.display()));
        }
        if !is_image_file(&path) {
            return Err("Only JPG, JPEG and PNG images are supported".to_string());
        }

        self.path_input = path.display().to_string();
        self.selected = Some(path);
        self.step = VerifyStep::Upload;
        self.result = None;
        self.error = None;
        Ok(())
    }

    /// Move to the analyze step; returns the document to submit
    pub fn start_analysis(&mut self) -> Option<PathBuf> {
        let path = self.selected.clone()?;
        self.step = VerifyStep::Analyze;
        self.result = None;
        self.error = None;
        Some(path)
    }

    fn finish(&mut self, outcome: Result<CombinedResult, String>) {
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.error = None;
            }
            Err(message) => {
                self.result = None;
                self.error = Some(message);
            }
        }
        self.step = VerifyStep::Results;
    }

    /// Back to an empty upload step
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Batch processing state
#[derive(Debug, Default)]
pub struct BatchViewState {
    /// Path typed by the user (file or directory)
    pub path_input: String,
    /// Queued documents, in submission order
    pub files: Vec<PathBuf>,
    /// Finished items of the current run
    pub items: Vec<BatchItem>,
    /// (done, total)
    pub progress: (usize, usize),
    pub running: bool,
    /// Feedback from the last add or export
    pub message: Option<String>,
}

impl BatchViewState {
    /// Queue an image, ignoring duplicates and unsupported files.
    /// Returns whether the file was added.
    pub fn add_file(&mut self, path: &Path) -> bool {
        if !is_image_file(path) || self.files.iter().any(|f| f == path) {
            return false;
        }
        self.files.push(path.to_path_buf());
        true
    }

    /// Clear results and mark a run as started; returns the files to submit
    pub fn start(&mut self) -> Option<Vec<PathBuf>> {
        if self.files.is_empty() || self.running {
            return None;
        }
        self.items.clear();
        self.progress = (0, self.files.len());
        self.running = true;
        self.message = None;
        Some(self.files.clone())
    }

    pub fn clear(&mut self) {
        if !self.running {
            *self = Self::default();
        }
    }

    /// Table rows of the finished items
    pub fn rows(&self, review_threshold: f32) -> Vec<BatchRow> {
        self.items
            .iter()
            .map(|item| item.to_row(review_threshold))
            .collect()
    }

    pub fn summary(&self, review_threshold: f32) -> BatchSummary {
        BatchSummary::from_rows(&self.rows(review_threshold))
    }

    /// Completed fraction for the progress bar
    pub fn fraction(&self) -> f32 {
        let (done, total) = self.progress;
        if total == 0 {
            0.0
        } else {
            done as f32 / total as f32
        }
    }
}

/// Settings sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    General,
    Models,
    Detection,
    Ocr,
    Server,
}

/// Settings view state
#[derive(Debug, Default)]
pub struct SettingsViewState {
    /// Currently expanded section
    pub expanded_section: Option<SettingsSection>,
    /// Whether there are unsaved changes
    pub has_unsaved_changes: bool,
    /// Result of the last save
    pub status_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::write_image;
    use crate::pipeline::{FraudVerdict, Label};
    use crate::vision::{parse_fields, ClassScores};
    use tempfile::tempdir;

    fn sample_result(path: &Path, real: f32) -> CombinedResult {
        CombinedResult {
            image_path: path.to_path_buf(),
            crop_path: path.to_path_buf(),
            fraud: FraudVerdict::from_scores(ClassScores {
                fake: 1.0 - real,
                real,
            }),
            ocr: parse_fields("card.png", "Asha Rao\n01/02/1990\n1234 5678 9012"),
            region: None,
            processing_time_ms: 5,
        }
    }

    #[test]
    fn test_view_setting_roundtrip() {
        for view in [
            DashboardView::Home,
            DashboardView::Verify,
            DashboardView::Batch,
            DashboardView::Settings,
            DashboardView::About,
        ] {
            assert_eq!(DashboardView::from_setting(view.to_setting()), view);
        }
    }

    #[test]
    fn test_select_rejects_missing_and_unsupported() {
        let dir = tempdir().unwrap();
        let mut verify = VerifyViewState::default();

        assert!(verify.select(dir.path().join("nope.png")).is_err());

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "hi").unwrap();
        assert!(verify.select(text).is_err());
        assert!(verify.selected.is_none());

        let image = write_image(dir.path(), "card.png", 4, 4);
        verify.select(image.clone()).unwrap();
        assert_eq!(verify.selected.as_deref(), Some(image.as_path()));
        assert_eq!(verify.step, VerifyStep::Upload);
    }

    #[test]
    fn test_wizard_flow() {
        let dir = tempdir().unwrap();
        let image = write_image(dir.path(), "card.png", 4, 4);

        let mut dashboard = DashboardState::default();
        let mut runtime = RuntimeState::default();

        assert!(dashboard.verify.start_analysis().is_none());

        dashboard.verify.select(image.clone()).unwrap();
        let submitted = dashboard.verify.start_analysis().unwrap();
        assert_eq!(submitted, image);
        assert_eq!(dashboard.verify.step, VerifyStep::Analyze);

        runtime.busy = true;
        dashboard.apply_event(
            WorkerEvent::Predicted {
                path: image.clone(),
                outcome: Ok(sample_result(&image, 0.9)),
            },
            &mut runtime,
        );

        assert_eq!(dashboard.verify.step, VerifyStep::Results);
        let result = dashboard.verify.result.as_ref().unwrap();
        assert_eq!(result.fraud.label, Label::Real);
        assert!(!runtime.busy);
        assert_eq!(runtime.documents_verified, 1);
        assert_eq!(runtime.frauds_flagged, 0);

        dashboard.verify.reset();
        assert_eq!(dashboard.verify.step, VerifyStep::Upload);
        assert!(dashboard.verify.selected.is_none());
    }

    #[test]
    fn test_stale_prediction_is_dropped() {
        let dir = tempdir().unwrap();
        let first = write_image(dir.path(), "first.png", 4, 4);
        let second = write_image(dir.path(), "second.png", 4, 4);

        let mut dashboard = DashboardState::default();
        let mut runtime = RuntimeState::default();
        dashboard.verify.select(second).unwrap();

        dashboard.apply_event(
            WorkerEvent::Predicted {
                path: first.clone(),
                outcome: Ok(sample_result(&first, 0.1)),
            },
            &mut runtime,
        );

        assert!(dashboard.verify.result.is_none());
        assert_eq!(dashboard.verify.step, VerifyStep::Upload);
        assert_eq!(runtime.frauds_flagged, 1);
    }

    #[test]
    fn test_prediction_error_shows_on_results_step() {
        let dir = tempdir().unwrap();
        let image = write_image(dir.path(), "card.png", 4, 4);
        let mut dashboard = DashboardState::default();
        let mut runtime = RuntimeState::default();

        dashboard.verify.select(image.clone()).unwrap();
        dashboard.verify.start_analysis();
        dashboard.apply_event(
            WorkerEvent::Predicted {
                path: image,
                outcome: Err("Could not decode image".to_string()),
            },
            &mut runtime,
        );

        assert_eq!(dashboard.verify.step, VerifyStep::Results);
        assert_eq!(dashboard.verify.error.as_deref(), Some("Could not decode image"));
        assert_eq!(runtime.documents_verified, 0);
    }

    #[test]
    fn test_batch_add_and_run() {
        let dir = tempdir().unwrap();
        let a = write_image(dir.path(), "a.png", 4, 4);
        let b = write_image(dir.path(), "b.jpg", 4, 4);

        let mut dashboard = DashboardState::default();
        let mut runtime = RuntimeState::default();

        assert!(dashboard.batch.start().is_none());
        assert!(dashboard.batch.add_file(&a));
        assert!(!dashboard.batch.add_file(&a));
        assert!(!dashboard.batch.add_file(Path::new("readme.md")));
        assert!(dashboard.batch.add_file(&b));

        let files = dashboard.batch.start().unwrap();
        assert_eq!(files, vec![a.clone(), b.clone()]);
        assert!(dashboard.batch.start().is_none());

        dashboard.apply_event(
            WorkerEvent::BatchProgress {
                index: 0,
                total: 2,
                item: BatchItem::new(&a, Ok(sample_result(&a, 0.2))),
            },
            &mut runtime,
        );
        assert!((dashboard.batch.fraction() - 0.5).abs() < 1e-6);

        dashboard.apply_event(
            WorkerEvent::BatchProgress {
                index: 1,
                total: 2,
                item: BatchItem::new(&b, Err("decode failed".to_string())),
            },
            &mut runtime,
        );
        dashboard.apply_event(WorkerEvent::BatchDone, &mut runtime);

        assert!(!dashboard.batch.running);
        let summary = dashboard.batch.summary(0.8);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.fraud, 1);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_engine_events_update_status() {
        let mut dashboard = DashboardState::default();
        let mut runtime = RuntimeState::default();

        dashboard.apply_event(WorkerEvent::EngineFailed("missing model".into()), &mut runtime);
        assert!(matches!(runtime.engine_status, EngineStatus::Failed(_)));
        assert!(runtime.last_error.is_some());

        dashboard.apply_event(WorkerEvent::EngineReady, &mut runtime);
        assert!(runtime.engine_status.is_ready());
        assert!(runtime.last_error.is_none());
    }
}
