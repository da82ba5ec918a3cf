use culler_application::RetentionSweepService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub retention_service: RetentionSweepService,
}
