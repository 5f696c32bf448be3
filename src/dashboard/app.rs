//! Dashboard application entry point

use eframe::egui;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::app::AnalysisWorker;
use crate::dashboard::components::render_sidebar;
use crate::dashboard::state::{DashboardState, DashboardView};
use crate::dashboard::theme;
use crate::dashboard::views::{
    render_about_view, render_batch_view, render_home_view, render_settings_view,
    render_verify_view,
};
use crate::shared::{EngineStatus, SharedAppState};

/// The main dashboard application
pub struct DashboardApp {
    /// Shared application state
    shared_state: Arc<RwLock<SharedAppState>>,
    /// Dashboard-specific state
    dashboard_state: DashboardState,
    /// Whether theme has been applied
    theme_applied: bool,
    /// Background thread running the fraud engine
    worker: Option<AnalysisWorker>,
}

impl DashboardApp {
    /// Create a new dashboard application
    pub fn new(shared_state: Arc<RwLock<SharedAppState>>, worker: Option<AnalysisWorker>) -> Self {
        let initial_view = DashboardView::from_setting(shared_state.read().config.dashboard.last_view);
        Self {
            shared_state,
            dashboard_state: DashboardState::new(initial_view),
            theme_applied: false,
            worker,
        }
    }

    /// Create eframe options for the dashboard window
    pub fn options() -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1100.0, 720.0])
                .with_min_inner_size([820.0, 520.0])
                .with_drag_and_drop(true)
                .with_title("Aadhaar Shield"),
            ..Default::default()
        }
    }

    /// Forward queued jobs to the worker
    fn dispatch_jobs(&mut self) {
        let jobs = self.shared_state.write().runtime.take_jobs();
        if jobs.is_empty() {
            return;
        }

        let Some(worker) = &self.worker else {
            let mut state = self.shared_state.write();
            state.runtime.busy = false;
            state.runtime.set_error("Analysis worker is not running");
            return;
        };

        for job in jobs {
            if !worker.submit(job) {
                error!("Analysis worker stopped accepting jobs");
                let mut state = self.shared_state.write();
                state.runtime.busy = false;
                state.runtime.set_error("Analysis worker stopped unexpectedly");
                break;
            }
        }
    }

    /// Apply every event the worker produced since the last frame
    fn drain_events(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };

        let mut state = self.shared_state.write();
        while let Some(event) = worker.try_recv() {
            self.dashboard_state.apply_event(event, &mut state.runtime);
        }
    }

    /// Remember the active view so the next start opens on it
    fn sync_last_view(&mut self) {
        self.shared_state.write().config.dashboard.last_view =
            self.dashboard_state.current_view.to_setting();
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply theme once
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        self.dispatch_jobs();
        self.drain_events();

        // Keep polling while the worker has something outstanding
        let (busy, engine_ready, loading) = {
            let state = self.shared_state.read();
            (
                state.runtime.busy,
                state.runtime.engine_status.is_ready(),
                state.runtime.engine_status == EngineStatus::Loading,
            )
        };
        if busy || loading {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // Sidebar panel
        egui::SidePanel::left("sidebar")
            .resizable(false)
            .default_width(190.0)
            .show(ctx, |ui| {
                render_sidebar(ui, &mut self.dashboard_state.current_view, engine_ready);
            });

        // Main content panel
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::none()
                .inner_margin(24.0)
                .show(ui, |ui| match self.dashboard_state.current_view {
                    DashboardView::Home => {
                        if let Some(view) = render_home_view(
                            ui,
                            &mut self.dashboard_state.home,
                            &self.shared_state,
                        ) {
                            self.dashboard_state.current_view = view;
                        }
                    }
                    DashboardView::Verify => {
                        render_verify_view(
                            ui,
                            &mut self.dashboard_state.verify,
                            &self.shared_state,
                        );
                    }
                    DashboardView::Batch => {
                        render_batch_view(
                            ui,
                            &mut self.dashboard_state.batch,
                            &self.shared_state,
                        );
                    }
                    DashboardView::Settings => {
                        render_settings_view(
                            ui,
                            &mut self.dashboard_state.settings,
                            &self.shared_state,
                        );
                    }
                    DashboardView::About => render_about_view(ui),
                });
        });

        self.sync_last_view();
    }
}

/// Run the dashboard application
pub fn run_dashboard(shared_state: Arc<RwLock<SharedAppState>>) -> Result<(), eframe::Error> {
    let config = shared_state.read().config.clone();
    let worker = match AnalysisWorker::spawn(config) {
        Ok(worker) => Some(worker),
        Err(e) => {
            error!("Failed to start analysis worker: {}", e);
            let message = format!("Failed to start analysis worker: {e}");
            let mut state = shared_state.write();
            state.runtime.engine_status = EngineStatus::Failed(message.clone());
            state.runtime.set_error(message);
            None
        }
    };

    info!("Opening dashboard window");
    let app = DashboardApp::new(shared_state, worker);
    eframe::run_native(
        "Aadhaar Shield",
        DashboardApp::options(),
        Box::new(|_cc| Ok(Box::new(app))),
    )
}
