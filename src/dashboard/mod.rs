//! Dashboard UI Module
//!
//! Desktop front end: a single-document verification wizard, batch
//! processing with CSV export, and settings. Inference runs on the
//! analysis worker, never on the UI thread.

pub mod app;
pub mod components;
pub mod state;
pub mod theme;
pub mod views;

pub use app::{run_dashboard, DashboardApp};
pub use state::{DashboardState, DashboardView};
