use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Student, StudentSync},
    services::{
        auth::Claims,
        students::{StudentInput, StudentsService},
    },
    AppState,
};

use super::MessageResponse;

/// Public roster for kiosks.
pub async fn sync_students(State(state): State<AppState>) -> AppResult<Json<Vec<StudentSync>>> {
    Ok(Json(StudentsService::new(state.db).sync().await?))
}

pub async fn list_students(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Student>>> {
    let students = StudentsService::new(state.db)
        .list_for(claims.role, claims.account_id()?)
        .await?;
    Ok(Json(students))
}

pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Student>> {
    Ok(Json(StudentsService::new(state.db).get(id).await?))
}

pub async fn create_student(
    State(state): State<AppState>,
    Json(req): Json<StudentInput>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let student = StudentsService::new(state.db).create(req).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StudentInput>,
) -> AppResult<Json<Student>> {
    Ok(Json(StudentsService::new(state.db).update(id, req).await?))
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    StudentsService::new(state.db).delete(id).await?;
    Ok(Json(MessageResponse::new("Student deleted successfully")))
}
