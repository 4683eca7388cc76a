//! Authentication handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use shared::validation;

use crate::error::{rpc, AppError, AppResult, RpcResponse};
use crate::middleware::RequestLanguage;
use crate::services::auth::LoginSession;
use crate::services::AuthService;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 128))]
    pub login: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    RequestLanguage(language): RequestLanguage,
    Json(body): Json<LoginRequest>,
) -> Json<RpcResponse<LoginSession>> {
    rpc(language, authenticate(&state, body).await)
}

async fn authenticate(state: &AppState, body: LoginRequest) -> AppResult<LoginSession> {
    body.validate()?;
    validation::validate_login(&body.login).map_err(|msg| {
        AppError::validation("login", msg, "Tên đăng nhập không hợp lệ")
    })?;

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    auth_service.login(&body.login, &body.password).await
}
