//! Bulk status trigger — POST /update-schedule-status (GET is an alias).
//!
//! Meant to be hit by a cron job once a day. When `reconcile.secret` is
//! configured the caller must send `Authorization: Bearer <secret>`.
//!
//! Response: `{"success": true, "message": "Updated 1 schedule(s)",
//! "updated": 1, "updates": [...], "failures": [], "timestamp": "..."}`
//! Error:    `{"error": "...", "details": "..."}`

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tms_schedules::local_today;
use tracing::{error, info};

use crate::app::AppState;

/// POST|GET /update-schedule-status — reconcile every non-cancelled schedule.
pub async fn update_schedule_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    crate::auth::require_secret(&state, &headers)?;

    // A bulk pass issues one write per changed schedule; keep it off the
    // async workers.
    let reconciler = state.reconciler.clone();
    let report = tokio::task::spawn_blocking(move || reconciler.reconcile_all(local_today()))
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .map_err(|e| internal_error(e.to_string()))?;

    info!(updated = report.updated, "bulk status update via HTTP");
    Ok(Json(json!({
        "success": true,
        "message": format!("Updated {} schedule(s)", report.updated),
        "updated": report.updated,
        "updates": report.updates,
        "failures": report.failures,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

fn internal_error(details: String) -> (StatusCode, Json<Value>) {
    error!(details = %details, "bulk status update failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error", "details": details})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::{router, send};
    use axum::{body::Body, http::Request};
    use chrono::Duration;
    use tms_schedules::{
        DateRange, Schedule, ScheduleError, ScheduleStatus, ScheduleStore, ScheduleType,
    };

    fn trigger(method: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri("/update-schedule-status");
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {t}"));
        }
        req.body(Body::empty()).unwrap()
    }

    fn seed(store: &dyn ScheduleStore) {
        let today = local_today();
        let range = |from: i64, to: i64| {
            vec![DateRange::new(
                today + Duration::days(from),
                today + Duration::days(to),
            )]
        };
        for (id, status, ranges) in [
            ("past", ScheduleStatus::Ongoing, range(-14, -5)),
            ("future", ScheduleStatus::Planned, range(5, 10)),
            ("cancelled", ScheduleStatus::Cancelled, range(-14, -5)),
        ] {
            store
                .insert_schedule(&Schedule {
                    id: id.into(),
                    status: Some(status),
                    schedule_type: ScheduleType::Regular,
                    ranges,
                    dates: Vec::new(),
                })
                .unwrap();
        }
    }

    #[tokio::test]
    async fn open_trigger_reports_changes() {
        let (app, store) = router(None);
        seed(store.as_ref());

        let (status, body) = send(app, trigger("POST", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["updated"], 1);
        assert_eq!(body["message"], "Updated 1 schedule(s)");
        assert_eq!(body["updates"][0]["id"], "past");
        assert_eq!(body["updates"][0]["oldStatus"], "ongoing");
        assert_eq!(body["updates"][0]["newStatus"], "finished");
        assert_eq!(body["failures"], json!([]));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn get_is_an_alias_and_second_run_is_empty() {
        let (app, store) = router(None);
        seed(store.as_ref());

        let (_, first) = send(app.clone(), trigger("GET", None)).await;
        assert_eq!(first["updated"], 1);
        let (status, second) = send(app, trigger("GET", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["updated"], 0);
        assert_eq!(second["updates"], json!([]));
    }

    #[tokio::test]
    async fn secret_is_enforced_before_any_read() {
        let (app, store) = router(Some("cron-secret"));
        seed(store.as_ref());

        let (status, body) = send(app.clone(), trigger("POST", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let (status, _) = send(app.clone(), trigger("POST", Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            store.fetch_by_id("past").unwrap().unwrap().status,
            Some(ScheduleStatus::Ongoing)
        );

        let (status, body) = send(app, trigger("POST", Some("cron-secret"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], 1);
    }

    /// Store whose reads always fail.
    struct BrokenStore;

    impl ScheduleStore for BrokenStore {
        fn fetch_by_id(&self, _id: &str) -> tms_schedules::Result<Option<Schedule>> {
            Err(ScheduleError::Unavailable("connection reset".into()))
        }
        fn fetch_all_excluding(
            &self,
            _excluded: ScheduleStatus,
        ) -> tms_schedules::Result<Vec<Schedule>> {
            Err(ScheduleError::Unavailable("connection reset".into()))
        }
        fn update_status(&self, _id: &str, _status: ScheduleStatus) -> tms_schedules::Result<()> {
            panic!("no write expected after a failed read");
        }
        fn insert_schedule(&self, _schedule: &Schedule) -> tms_schedules::Result<()> {
            unimplemented!()
        }
        fn replace_dates(
            &self,
            _id: &str,
            _schedule_type: ScheduleType,
            _ranges: &[DateRange],
            _dates: &[chrono::NaiveDate],
        ) -> tms_schedules::Result<()> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn fetch_failure_is_a_500() {
        let state = Arc::new(AppState::new(
            tms_core::config::TmsConfig::default(),
            Arc::new(BrokenStore),
        ));
        let app = crate::app::build_router(state);

        let (status, body) = send(app, trigger("POST", None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("connection reset"));
    }
}
