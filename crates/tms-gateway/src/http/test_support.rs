//! Router fixtures for handler tests.

use axum::{body::Body, http::Request, http::StatusCode, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tms_core::config::TmsConfig;
use tms_schedules::SqliteScheduleStore;
use tower::ServiceExt;

use crate::app::{build_router, AppState};

/// Router over a fresh in-memory store, plus the store for seeding and checks.
pub fn router(secret: Option<&str>) -> (Router, Arc<SqliteScheduleStore>) {
    let mut config = TmsConfig::default();
    config.reconcile.secret = secret.map(String::from);
    let store = Arc::new(SqliteScheduleStore::open_in_memory().unwrap());
    let state = Arc::new(AppState::new(config, store.clone()));
    (build_router(state), store)
}

/// Send one request and decode the JSON body (`Value::Null` when empty).
pub async fn send(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
