use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::Profile,
    services::auth::{AuthService, Claims},
    AppState,
};

use super::MessageResponse;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Profile,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let auth_service = AuthService::new(state.db, (*state.config).clone());
    let (token, user) = auth_service.login(req.username.trim(), &req.password).await?;

    Ok(Json(LoginResponse { token, user }))
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: Profile,
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<UserResponse>> {
    let auth_service = AuthService::new(state.db, (*state.config).clone());
    let user = auth_service.profile(claims.account_id()?).await?;

    Ok(Json(UserResponse { user }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: Profile,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let auth_service = AuthService::new(state.db, (*state.config).clone());
    let user = auth_service
        .update_profile(
            claims.account_id()?,
            req.full_name.as_deref(),
            req.email.as_deref(),
            req.password.as_deref(),
            req.avatar_url.as_deref(),
        )
        .await?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar_url: String,
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> AppResult<Json<AvatarResponse>> {
    let account_id = claims.account_id()?;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some("avatar") {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let extension = match content_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => return Err(AppError::BadRequest("Avatar must be an image".to_string())),
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;

        let key = format!("{}/avatar-{}.{}", account_id, chrono::Utc::now().timestamp(), extension);
        let avatar_url = state
            .minio
            .upload_file(state.minio.avatars_bucket(), &key, data, &content_type)
            .await?;

        let auth_service = AuthService::new(state.db, (*state.config).clone());
        auth_service
            .update_profile(account_id, None, None, None, Some(&avatar_url))
            .await?;

        return Ok(Json(AvatarResponse { avatar_url }));
    }

    Err(AppError::BadRequest("Avatar file required".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let auth_service = AuthService::new(state.db, (*state.config).clone());
    auth_service
        .change_password(claims.account_id()?, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}
