//! Dashboard views

pub mod about;
pub mod batch;
pub mod home;
pub mod settings;
pub mod verify;

pub use about::render_about_view;
pub use batch::render_batch_view;
pub use home::render_home_view;
pub use settings::render_settings_view;
pub use verify::render_verify_view;
