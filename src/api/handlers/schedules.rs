use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{AttendanceLogWithStudent, Schedule, ScheduleSync, ScheduleWithTeacher},
    services::{
        auth::Claims,
        schedules::{ScheduleInput, SchedulesService},
    },
    AppState,
};

use super::MessageResponse;

/// Public timetable for kiosks.
pub async fn sync_schedules(State(state): State<AppState>) -> AppResult<Json<Vec<ScheduleSync>>> {
    Ok(Json(SchedulesService::new(state.db).sync().await?))
}

pub async fn list_schedules(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<ScheduleWithTeacher>>> {
    let schedules = SchedulesService::new(state.db)
        .list_for(claims.role, claims.account_id()?)
        .await?;
    Ok(Json(schedules))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ScheduleWithTeacher>> {
    Ok(Json(SchedulesService::new(state.db).get(id).await?))
}

pub async fn schedules_by_kiosk(
    State(state): State<AppState>,
    Path(kiosk_id): Path<Uuid>,
) -> AppResult<Json<Vec<ScheduleWithTeacher>>> {
    Ok(Json(SchedulesService::new(state.db).by_kiosk(kiosk_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub schedule_id: Uuid,
    pub kiosk_id: Option<Uuid>,
}

pub async fn assign_schedule(
    State(state): State<AppState>,
    Json(req): Json<AssignRequest>,
) -> AppResult<Json<MessageResponse>> {
    SchedulesService::new(state.db)
        .assign_to_kiosk(req.schedule_id, req.kiosk_id)
        .await?;

    let message = match req.kiosk_id {
        Some(_) => "Schedule assigned to kiosk",
        None => "Schedule unassigned from kiosk",
    };
    Ok(Json(MessageResponse::new(message)))
}

pub async fn create_schedule(
    State(state): State<AppState>,
    Json(req): Json<ScheduleInput>,
) -> AppResult<(StatusCode, Json<Schedule>)> {
    let schedule = SchedulesService::new(state.db).create(req).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ScheduleInput>,
) -> AppResult<Json<Schedule>> {
    Ok(Json(SchedulesService::new(state.db).update(id, req).await?))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    SchedulesService::new(state.db).delete(id).await?;
    Ok(Json(MessageResponse::new("Schedule deleted successfully")))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub date: Option<NaiveDate>,
}

pub async fn schedule_logs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LogsQuery>,
) -> AppResult<Json<Vec<AttendanceLogWithStudent>>> {
    Ok(Json(SchedulesService::new(state.db).logs(id, query.date).await?))
}
