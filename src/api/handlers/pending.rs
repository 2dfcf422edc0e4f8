use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{PendingRegistration, Student},
    services::pending::{PendingService, RegistrationInput},
    AppState,
};

use super::MessageResponse;

/// Public: submitted from the enrollment form.
pub async fn submit_registration(
    State(state): State<AppState>,
    Json(req): Json<RegistrationInput>,
) -> AppResult<(StatusCode, Json<PendingRegistration>)> {
    let pending = PendingService::new(state.db).create(req).await?;
    Ok((StatusCode::CREATED, Json(pending)))
}

pub async fn list_pending(State(state): State<AppState>) -> AppResult<Json<Vec<PendingRegistration>>> {
    Ok(Json(PendingService::new(state.db).list().await?))
}

pub async fn get_pending(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PendingRegistration>> {
    Ok(Json(PendingService::new(state.db).get(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub rfid_uid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub message: String,
    pub student: Student,
}

pub async fn approve_pending(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApproveRequest>,
) -> AppResult<Json<ApproveResponse>> {
    let student = PendingService::new(state.db)
        .approve(id, req.rfid_uid.as_deref())
        .await?;

    Ok(Json(ApproveResponse {
        message: "Student approved successfully".to_string(),
        student,
    }))
}

pub async fn reject_pending(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    PendingService::new(state.db).reject(id).await?;
    Ok(Json(MessageResponse::new("Registration rejected")))
}
