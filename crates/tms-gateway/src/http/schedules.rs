//! Schedule edit endpoints.
//!
//! Changing a schedule's dates runs a targeted status recalculation right
//! after the write. That recalculation is best-effort: its failures are
//! logged and never turn a successful edit into an error response.
//!
//! Request body for create / replace:
//! `{"schedule_type": "regular", "range": {"start_date": "2025-06-01", "end_date": "2025-06-05"}}`
//! `{"schedule_type": "staggered", "dates": ["2025-06-14", "2025-06-20"]}`

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tms_schedules::{DateRange, Schedule, ScheduleError, ScheduleType};
use tracing::warn;

use crate::app::AppState;

type ApiError = (StatusCode, Json<Value>);

#[derive(Deserialize)]
pub struct DatesRequest {
    pub schedule_type: ScheduleType,
    /// Required for `regular`.
    #[serde(default)]
    pub range: Option<DateRange>,
    /// Required for `staggered`.
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
}

/// GET /schedules/{id}
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Schedule>, ApiError> {
    crate::auth::require_secret(&state, &headers)?;
    state.schedules.get(&id).map(Json).map_err(schedule_error)
}

/// POST /schedules — create a schedule; its status is derived immediately.
pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<DatesRequest>,
) -> Result<(StatusCode, Json<Schedule>), ApiError> {
    crate::auth::require_secret(&state, &headers)?;
    let schedule = state
        .schedules
        .create(req.schedule_type, req.range, &req.dates)
        .map_err(schedule_error)?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

/// PUT /schedules/{id}/dates — replace the temporal definition.
pub async fn replace_dates(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<DatesRequest>,
) -> Result<Json<Schedule>, ApiError> {
    crate::auth::require_secret(&state, &headers)?;
    state
        .schedules
        .replace_dates(&id, req.schedule_type, req.range, &req.dates)
        .map_err(schedule_error)?;
    state.schedules.get(&id).map(Json).map_err(schedule_error)
}

/// POST /schedules/{id}/cancel
pub async fn cancel_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Schedule>, ApiError> {
    crate::auth::require_secret(&state, &headers)?;
    state.schedules.cancel(&id).map_err(schedule_error)?;
    state.schedules.get(&id).map(Json).map_err(schedule_error)
}

fn schedule_error(e: ScheduleError) -> ApiError {
    let status = match &e {
        ScheduleError::NotFound { .. } => StatusCode::NOT_FOUND,
        ScheduleError::InvalidSchedule(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScheduleError::Database(_) | ScheduleError::Unavailable(_) => {
            warn!(error = %e, "schedule request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({"error": e.to_string()})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::{router, send};
    use axum::{body::Body, http::Request};
    use chrono::Duration;
    use tms_schedules::{local_today, ScheduleStatus, ScheduleStore};

    fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn day(offset: i64) -> String {
        (local_today() + Duration::days(offset))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[tokio::test]
    async fn create_then_edit_moves_status() {
        let (app, store) = router(None);

        let (status, created) = send(
            app.clone(),
            json_req(
                "POST",
                "/schedules",
                json!({
                    "schedule_type": "regular",
                    "range": {"start_date": day(3), "end_date": day(5)},
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "planned");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, edited) = send(
            app,
            json_req(
                "PUT",
                &format!("/schedules/{id}/dates"),
                json!({
                    "schedule_type": "staggered",
                    "dates": [day(-1), day(4)],
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["schedule_type"], "staggered");
        assert_eq!(edited["status"], "ongoing");
        assert_eq!(
            store.fetch_by_id(&id).unwrap().unwrap().status,
            Some(ScheduleStatus::Ongoing)
        );
    }

    #[tokio::test]
    async fn invalid_dates_are_rejected() {
        let (app, _) = router(None);
        let (status, body) = send(
            app,
            json_req("POST", "/schedules", json!({"schedule_type": "staggered"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("at least one date"));
    }

    #[tokio::test]
    async fn cancel_then_edit_keeps_cancelled() {
        let (app, _) = router(None);
        let (_, created) = send(
            app.clone(),
            json_req(
                "POST",
                "/schedules",
                json!({"schedule_type": "staggered", "dates": [day(1)]}),
            ),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, cancelled) = send(
            app.clone(),
            json_req("POST", &format!("/schedules/{id}/cancel"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"], "cancelled");

        let (_, edited) = send(
            app,
            json_req(
                "PUT",
                &format!("/schedules/{id}/dates"),
                json!({"schedule_type": "staggered", "dates": [day(-9)]}),
            ),
        )
        .await;
        assert_eq!(edited["status"], "cancelled");
    }

    #[tokio::test]
    async fn unknown_schedule_is_404() {
        let (app, _) = router(None);
        let req = Request::builder()
            .uri("/schedules/ghost")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn edits_require_the_secret_when_configured() {
        let (app, _) = router(Some("s3cret"));
        let (status, _) = send(
            app.clone(),
            json_req(
                "POST",
                "/schedules",
                json!({"schedule_type": "staggered", "dates": [day(1)]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .method("POST")
            .uri("/schedules")
            .header("content-type", "application/json")
            .header("authorization", "Bearer s3cret")
            .body(Body::from(
                json!({"schedule_type": "staggered", "dates": [day(1)]}).to_string(),
            ))
            .unwrap();
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
