use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::AttendanceLog,
    services::attendance::{AttendanceEvent, AttendanceService},
    AppState,
};

pub async fn record_attendance(
    State(state): State<AppState>,
    Json(req): Json<AttendanceEvent>,
) -> AppResult<(StatusCode, Json<AttendanceLog>)> {
    let log = AttendanceService::new(state.db, state.clock)
        .record(req)
        .await?;
    Ok((StatusCode::CREATED, Json(log)))
}
