use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Account, Role},
    services::{
        accounts::AccountsService,
        auth::{AuthService, Claims},
        students::non_blank,
    },
    AppState,
};

use super::MessageResponse;

fn accounts(state: AppState) -> AccountsService {
    AccountsService::new(state.db, state.mailer)
}

#[derive(Debug, Deserialize)]
pub struct AccountUpdateRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub rfid_uid: Option<String>,
    pub password: Option<String>,
}

// Teachers

pub async fn list_teachers(State(state): State<AppState>) -> AppResult<Json<Vec<Account>>> {
    Ok(Json(accounts(state).list(Role::Teacher).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateTeacherRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub teacher_id: Option<String>,
    pub rfid_uid: Option<String>,
}

pub async fn create_teacher(
    State(state): State<AppState>,
    Json(req): Json<CreateTeacherRequest>,
) -> AppResult<(StatusCode, Json<Account>)> {
    let (Some(full_name), Some(email), Some(teacher_id)) = (
        non_blank(req.full_name.as_deref()),
        non_blank(req.email.as_deref()),
        non_blank(req.teacher_id.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "Full name, email and teacher ID are required".to_string(),
        ));
    };

    let teacher = accounts(state)
        .create_teacher(full_name, email, teacher_id, non_blank(req.rfid_uid.as_deref()))
        .await?;
    Ok((StatusCode::CREATED, Json(teacher)))
}

pub async fn update_teacher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AccountUpdateRequest>,
) -> AppResult<Json<Account>> {
    update(state, Role::Teacher, id, req).await
}

pub async fn delete_teacher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    accounts(state).delete_teacher(id).await?;
    Ok(Json(MessageResponse::new("Teacher deleted successfully")))
}

// Admins

pub async fn list_admins(State(state): State<AppState>) -> AppResult<Json<Vec<Account>>> {
    Ok(Json(accounts(state).list(Role::Admin).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub current_password: Option<String>,
}

pub async fn create_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAdminRequest>,
) -> AppResult<(StatusCode, Json<Account>)> {
    let current_password = req
        .current_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Current password is required".to_string()))?;

    let (Some(full_name), Some(email), Some(username)) = (
        non_blank(req.full_name.as_deref()),
        non_blank(req.email.as_deref()),
        non_blank(req.username.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "Full name, email and username are required".to_string(),
        ));
    };

    AuthService::new(state.db.clone(), (*state.config).clone())
        .check_password(claims.account_id()?, current_password)
        .await?;

    let admin = accounts(state).create_admin(full_name, email, username).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

pub async fn update_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AccountUpdateRequest>,
) -> AppResult<Json<Account>> {
    update(state, Role::Admin, id, req).await
}

pub async fn delete_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    accounts(state).delete_admin(claims.account_id()?, id).await?;
    Ok(Json(MessageResponse::new("Admin deleted successfully")))
}

async fn update(
    state: AppState,
    role: Role,
    id: Uuid,
    req: AccountUpdateRequest,
) -> AppResult<Json<Account>> {
    let account = accounts(state)
        .update(
            role,
            id,
            non_blank(req.full_name.as_deref()),
            non_blank(req.email.as_deref()),
            non_blank(req.rfid_uid.as_deref()),
            req.password.as_deref(),
        )
        .await?;
    Ok(Json(account))
}
