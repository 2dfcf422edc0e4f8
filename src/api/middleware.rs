use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use crate::{
    error::AppError,
    services::auth::{AuthService, Claims},
    AppState,
};

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;

    let auth_service = AuthService::new(state.db.clone(), (*state.config).clone());
    let claims = auth_service.validate_token(bearer.token())?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Must sit inside `auth_middleware`.
pub async fn admin_only(
    Extension(claims): Extension<Claims>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !claims.is_admin() {
        return Err(AppError::AdminOnly);
    }

    Ok(next.run(request).await)
}
