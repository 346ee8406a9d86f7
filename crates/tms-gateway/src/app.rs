use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tms_core::config::TmsConfig;
use tms_schedules::{ScheduleHandle, ScheduleStore, StatusReconciler};

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: TmsConfig,
    pub reconciler: StatusReconciler,
    pub schedules: ScheduleHandle,
}

impl AppState {
    /// Wire the reconciler and edit handle around one shared store.
    pub fn new(config: TmsConfig, store: Arc<dyn ScheduleStore>) -> Self {
        let reconciler = StatusReconciler::new(store);
        Self {
            config,
            schedules: ScheduleHandle::new(reconciler.clone()),
            reconciler,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/update-schedule-status",
            post(crate::http::schedule_status::update_schedule_status)
                .get(crate::http::schedule_status::update_schedule_status),
        )
        .route("/schedules", post(crate::http::schedules::create_schedule))
        .route("/schedules/{id}", get(crate::http::schedules::get_schedule))
        .route(
            "/schedules/{id}/dates",
            put(crate::http::schedules::replace_dates),
        )
        .route(
            "/schedules/{id}/cancel",
            post(crate::http::schedules::cancel_schedule),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
