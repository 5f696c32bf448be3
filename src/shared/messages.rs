//! Message types between the dashboard and the analysis worker

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::pipeline::{BatchItem, CombinedResult};

/// Jobs sent from the dashboard to the worker
#[derive(Debug, Clone)]
pub enum WorkerJob {
    /// Verify a single document
    Predict(PathBuf),
    /// Verify several documents in order
    Batch(Vec<PathBuf>),
    /// Rebuild the engine with new settings
    Reload(AppConfig),
    /// Stop the worker thread
    Shutdown,
}

/// Events sent from the worker back to the dashboard
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    EngineReady,
    EngineFailed(String),
    /// A single verification finished
    Predicted {
        path: PathBuf,
        outcome: Result<CombinedResult, String>,
    },
    /// One batch input finished
    BatchProgress {
        index: usize,
        total: usize,
        item: BatchItem,
    },
    /// All batch inputs finished
    BatchDone,
}
