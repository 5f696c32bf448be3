//! Shared state and messaging between the dashboard and the analysis worker
//!
//! The UI thread never runs inference itself; it queues jobs for the worker
//! and drains its events every frame.

pub mod messages;
pub mod state;

pub use messages::{WorkerEvent, WorkerJob};
pub use state::{EngineStatus, RuntimeState, SharedAppState};
