use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    config::LogRetention,
    error::{AppError, AppResult},
    models::{AttendanceLog, Device, DeviceWithPresence},
    services::devices::{DeviceConfigUpdate, DevicesService, NewDevice},
    AppState,
};

use super::SuccessResponse;

/// Kiosk firmware may still send legacy numeric ids; anything that isn't a
/// device uuid cannot name a device.
fn device_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::DeviceNotFound)
}

/// Public: kiosks call this every few seconds.
pub async fn heartbeat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    state.presence.record_heartbeat(device_id(&id)?).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_devices(State(state): State<AppState>) -> AppResult<Json<Vec<DeviceWithPresence>>> {
    let devices = state.presence.list_with_presence().await?;
    Ok(Json(devices))
}

pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeviceWithPresence>> {
    let device = state.presence.get_by_id_with_presence(device_id(&id)?).await?;
    Ok(Json(device))
}

pub async fn create_device(
    State(state): State<AppState>,
    Json(req): Json<NewDevice>,
) -> AppResult<(StatusCode, Json<Device>)> {
    let device = DevicesService::new(state.db).create(req).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DeviceConfigUpdate>,
) -> AppResult<Json<Device>> {
    let device = DevicesService::new(state.db).update_config(device_id(&id)?, req).await?;
    Ok(Json(device))
}

#[derive(Debug, Deserialize)]
pub struct DeleteDeviceQuery {
    pub logs: Option<LogRetention>,
}

pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteDeviceQuery>,
) -> AppResult<Json<SuccessResponse>> {
    let policy = query.logs.unwrap_or(state.config.devices.delete_logs);
    DevicesService::new(state.db).delete(device_id(&id)?, policy).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn device_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<AttendanceLog>>> {
    let logs = DevicesService::new(state.db).logs(device_id(&id)?).await?;
    Ok(Json(logs))
}
