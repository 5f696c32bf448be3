//! Shared application state between the dashboard and the analysis worker

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::shared::WorkerJob;

/// Whether the fraud engine can take work
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EngineStatus {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready)
    }
}

/// Output directory given on the command line for this session only
#[derive(Debug, Clone)]
struct OutputDirOverride {
    session: PathBuf,
    from_file: PathBuf,
}

/// Central shared state
#[derive(Debug, Clone, Default)]
pub struct SharedAppState {
    /// Application configuration
    pub config: AppConfig,
    /// File the configuration was loaded from; saves go back here
    pub config_path: Option<PathBuf>,
    output_dir_override: Option<OutputDirOverride>,
    /// Runtime state (not persisted)
    pub runtime: RuntimeState,
}

impl SharedAppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            config_path: None,
            output_dir_override: None,
            runtime: RuntimeState::default(),
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Use `dir` for outputs without writing it into the saved configuration
    pub fn override_output_dir(&mut self, dir: PathBuf) {
        let from_file = match self.output_dir_override.take() {
            Some(previous) => previous.from_file,
            None => self.config.general.output_dir.clone(),
        };
        self.config.general.output_dir = dir.clone();
        self.output_dir_override = Some(OutputDirOverride {
            session: dir,
            from_file,
        });
    }

    /// Configuration as it should be written to disk.
    ///
    /// A command-line output directory is swapped back for the file's value
    /// unless it was changed in the dashboard since.
    pub fn config_to_save(&self) -> AppConfig {
        let mut config = self.config.clone();
        if let Some(over) = &self.output_dir_override {
            if config.general.output_dir == over.session {
                config.general.output_dir = over.from_file.clone();
            }
        }
        config
    }
}

/// Runtime state that is not persisted
#[derive(Debug, Clone, Default)]
pub struct RuntimeState {
    pub engine_status: EngineStatus,
    /// A job is running on the worker
    pub busy: bool,
    /// Single documents verified this session
    pub documents_verified: usize,
    /// Of which were judged fake
    pub frauds_flagged: usize,
    /// Last error message (if any)
    pub last_error: Option<String>,
    /// Jobs queued by views, forwarded to the worker by the app each frame
    pub pending_jobs: Vec<WorkerJob>,
}

impl RuntimeState {
    /// Clear any error state
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Set an error message
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    /// Queue a job and mark the worker busy
    pub fn queue_job(&mut self, job: WorkerJob) {
        if matches!(job, WorkerJob::Predict(_) | WorkerJob::Batch(_)) {
            self.busy = true;
        }
        self.pending_jobs.push(job);
    }

    /// Take all queued jobs
    pub fn take_jobs(&mut self) -> Vec<WorkerJob> {
        std::mem::take(&mut self.pending_jobs)
    }

    /// Count one finished verification
    pub fn record_verdict(&mut self, genuine: bool) {
        self.documents_verified += 1;
        if !genuine {
            self.frauds_flagged += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_verdict() {
        let mut runtime = RuntimeState::default();
        runtime.record_verdict(true);
        runtime.record_verdict(false);
        runtime.record_verdict(false);

        assert_eq!(runtime.documents_verified, 3);
        assert_eq!(runtime.frauds_flagged, 2);
    }

    #[test]
    fn test_error_state() {
        let mut runtime = RuntimeState::default();
        runtime.set_error("boom");
        assert_eq!(runtime.last_error.as_deref(), Some("boom"));
        runtime.clear_error();
        assert!(runtime.last_error.is_none());
    }

    #[test]
    fn test_job_queue() {
        let mut runtime = RuntimeState::default();
        runtime.queue_job(WorkerJob::Reload(AppConfig::default()));
        assert!(!runtime.busy);

        runtime.queue_job(WorkerJob::Predict("card.jpg".into()));
        assert!(runtime.busy);

        let jobs = runtime.take_jobs();
        assert_eq!(jobs.len(), 2);
        assert!(runtime.take_jobs().is_empty());
    }

    #[test]
    fn test_engine_status_default_is_loading() {
        let state = SharedAppState::new(AppConfig::default());
        assert_eq!(state.runtime.engine_status, EngineStatus::Loading);
        assert!(!state.runtime.engine_status.is_ready());
    }

    #[test]
    fn test_output_dir_override_is_not_saved() {
        let mut config = AppConfig::default();
        config.general.output_dir = PathBuf::from("/srv/reports");

        let mut state = SharedAppState::new(config);
        state.override_output_dir(PathBuf::from("/tmp/session"));
        assert_eq!(state.config.general.output_dir, PathBuf::from("/tmp/session"));
        assert_eq!(
            state.config_to_save().general.output_dir,
            PathBuf::from("/srv/reports")
        );

        // Edited in the dashboard afterwards: that choice is kept
        state.config.general.output_dir = PathBuf::from("/data/out");
        assert_eq!(
            state.config_to_save().general.output_dir,
            PathBuf::from("/data/out")
        );
    }
}
