use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    services::dashboard::{self, DashboardStats},
    AppState,
};

pub async fn stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(dashboard::stats(&state.db).await?))
}
