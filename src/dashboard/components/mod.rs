//! Reusable UI components for the dashboard

pub mod sidebar;
pub mod status_card;
pub mod step_indicator;

pub use sidebar::render_sidebar;
pub use status_card::{CardStatus, StatusCard};
pub use step_indicator::render_step_indicator;
