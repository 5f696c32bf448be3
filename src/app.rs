//! Application Coordinator
//!
//! Owns the background thread that holds the fraud engine, and the channels
//! the dashboard uses to talk to it.

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::thread::JoinHandle;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::pipeline::{BatchItem, FraudEngine};
use crate::shared::{WorkerEvent, WorkerJob};

const NOT_LOADED: &str = "Fraud engine is not loaded";

/// Builds an engine from configuration
pub type EngineFactory = Box<dyn Fn(&AppConfig) -> Result<FraudEngine> + Send>;

/// Handle to the analysis worker thread
pub struct AnalysisWorker {
    to_worker: Sender<WorkerJob>,
    from_worker: Receiver<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Spawn a worker loading the real models
    pub fn spawn(config: AppConfig) -> Result<Self> {
        Self::spawn_with(config, Box::new(FraudEngine::from_config))
    }

    /// Spawn a worker with a custom engine factory
    pub fn spawn_with(config: AppConfig, factory: EngineFactory) -> Result<Self> {
        let (to_worker, jobs) = unbounded();
        let (events, from_worker) = unbounded();

        let handle = std::thread::Builder::new()
            .name("analysis-worker".to_string())
            .spawn(move || {
                info!("Analysis worker starting...");
                worker_loop(config, factory, jobs, events);
                info!("Analysis worker exiting...");
            })?;

        Ok(Self {
            to_worker,
            from_worker,
            handle: Some(handle),
        })
    }

    /// Queue a job; false if the worker is gone
    pub fn submit(&self, job: WorkerJob) -> bool {
        self.to_worker.send(job).is_ok()
    }

    /// Next pending event without blocking
    pub fn try_recv(&self) -> Option<WorkerEvent> {
        self.from_worker.try_recv().ok()
    }

    /// Channel of worker events
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.from_worker
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        let _ = self.to_worker.send(WorkerJob::Shutdown);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn load_engine(
    config: &AppConfig,
    factory: &EngineFactory,
    events: &Sender<WorkerEvent>,
) -> Option<FraudEngine> {
    match factory(config) {
        Ok(engine) => {
            let _ = events.send(WorkerEvent::EngineReady);
            Some(engine)
        }
        Err(e) => {
            error!("Failed to load fraud engine: {:#}", e);
            let _ = events.send(WorkerEvent::EngineFailed(format!("{e:#}")));
            None
        }
    }
}

/// Predict `paths` one by one, reporting each item as it completes.
/// Returns false once nobody is listening for events.
fn run_batch(
    mut engine: Option<&mut FraudEngine>,
    paths: &[PathBuf],
    events: &Sender<WorkerEvent>,
) -> bool {
    let total = paths.len();
    for (index, path) in paths.iter().enumerate() {
        let item = match engine.as_deref_mut() {
            Some(engine) => engine
                .predict_batch(std::slice::from_ref(path))
                .pop()
                .unwrap_or_else(|| BatchItem::new(path, Err(NOT_LOADED.to_string()))),
            None => BatchItem::new(path, Err(NOT_LOADED.to_string())),
        };
        if events
            .send(WorkerEvent::BatchProgress { index, total, item })
            .is_err()
        {
            warn!("Dashboard went away, abandoning batch at {}/{}", index + 1, total);
            return false;
        }
    }
    events.send(WorkerEvent::BatchDone).is_ok()
}

fn worker_loop(
    config: AppConfig,
    factory: EngineFactory,
    jobs: Receiver<WorkerJob>,
    events: Sender<WorkerEvent>,
) {
    let mut engine = load_engine(&config, &factory, &events);

    for job in jobs.iter() {
        match job {
            WorkerJob::Predict(path) => {
                let outcome = match engine.as_mut() {
                    Some(engine) => engine.predict(&path).map_err(|e| e.to_string()),
                    None => Err(NOT_LOADED.to_string()),
                };
                if let Err(e) = &outcome {
                    warn!("Prediction failed for {:?}: {}", path, e);
                }
                if events.send(WorkerEvent::Predicted { path, outcome }).is_err() {
                    break;
                }
            }
            WorkerJob::Batch(paths) => {
                if !run_batch(engine.as_mut(), &paths, &events) {
                    break;
                }
            }
            WorkerJob::Reload(config) => {
                info!("Reloading fraud engine");
                drop(engine.take());
                engine = load_engine(&config, &factory, &events);
            }
            WorkerJob::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{fake_engine, write_image, FixedClassifier, FixedDetector, FixedText};
    use crate::storage::OutputDir;
    use crate::vision::ClassScores;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::tempdir;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn fake_factory(outputs: PathBuf) -> EngineFactory {
        Box::new(move |_config: &AppConfig| -> Result<FraudEngine> {
            Ok(fake_engine(
                &outputs,
                vec![],
                ClassScores {
                    fake: 0.9,
                    real: 0.1,
                },
                "5555 6666 7777",
            ))
        })
    }

    #[test]
    fn test_worker_predicts() {
        let dir = tempdir().unwrap();
        let image = write_image(dir.path(), "card.png", 12, 12);

        let worker =
            AnalysisWorker::spawn_with(AppConfig::default(), fake_factory(dir.path().join("out")))
                .unwrap();

        assert!(matches!(
            worker.events().recv_timeout(TIMEOUT).unwrap(),
            WorkerEvent::EngineReady
        ));

        assert!(worker.submit(WorkerJob::Predict(image.clone())));
        match worker.events().recv_timeout(TIMEOUT).unwrap() {
            WorkerEvent::Predicted { path, outcome } => {
                assert_eq!(path, image);
                let result = outcome.unwrap();
                assert!(!result.fraud.is_genuine());
                assert_eq!(result.ocr.aadhaar_number, "5555 6666 7777");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_worker_batch_reports_every_item() {
        let dir = tempdir().unwrap();
        let paths = vec![
            write_image(dir.path(), "a.png", 8, 8),
            dir.path().join("missing.png"),
        ];

        let worker =
            AnalysisWorker::spawn_with(AppConfig::default(), fake_factory(dir.path().join("out")))
                .unwrap();
        worker.events().recv_timeout(TIMEOUT).unwrap();

        worker.submit(WorkerJob::Batch(paths));

        let mut items = Vec::new();
        loop {
            match worker.events().recv_timeout(TIMEOUT).unwrap() {
                WorkerEvent::BatchProgress { index, total, item } => {
                    assert_eq!(index, items.len());
                    assert_eq!(total, 2);
                    items.push(item);
                }
                WorkerEvent::BatchDone => break,
                other => panic!("unexpected event {other:?}"),
            }
        }

        assert_eq!(items.len(), 2);
        assert!(items[0].outcome.is_ok());
        assert!(items[1].outcome.is_err());
    }

    #[test]
    fn test_failed_engine_reports_errors() {
        let factory: EngineFactory =
            Box::new(|_: &AppConfig| -> Result<FraudEngine> { anyhow::bail!("no models") });
        let worker = AnalysisWorker::spawn_with(AppConfig::default(), factory).unwrap();

        match worker.events().recv_timeout(TIMEOUT).unwrap() {
            WorkerEvent::EngineFailed(message) => assert!(message.contains("no models")),
            other => panic!("unexpected event {other:?}"),
        }

        worker.submit(WorkerJob::Predict(PathBuf::from("x.png")));
        match worker.events().recv_timeout(TIMEOUT).unwrap() {
            WorkerEvent::Predicted { outcome, .. } => assert!(outcome.is_err()),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_batch_stops_when_listener_is_gone() {
        let dir = tempdir().unwrap();
        let paths: Vec<PathBuf> = ["a.png", "b.png", "c.png"]
            .iter()
            .map(|name| write_image(dir.path(), name, 8, 8))
            .collect();

        let classified = Arc::new(Mutex::new(Vec::new()));
        let mut engine = FraudEngine::new(
            Box::new(FixedDetector(vec![])),
            Box::new(FixedClassifier {
                scores: ClassScores {
                    fake: 0.2,
                    real: 0.8,
                },
                seen: classified.clone(),
            }),
            Box::new(FixedText {
                text: String::new(),
                seen: Arc::default(),
            }),
            OutputDir::new(dir.path().join("out")).unwrap(),
        );

        let (events, receiver) = unbounded();
        drop(receiver);

        assert!(!run_batch(Some(&mut engine), &paths, &events));
        assert_eq!(classified.lock().len(), 1);
    }
}
