// ============================================================================
// CRM API - Auth Handlers
// File: crates/crm-api/src/handlers/auth.rs
// ============================================================================
//! Registration and login

use axum::{extract::State, http::StatusCode, Json};

use crm_core::services::{LoginInput, LoginResult, RegisterInput};
use crm_core::UserProfile;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Register handler - POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let profile = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Login handler - POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<LoginResult>, ApiError> {
    Ok(Json(state.auth.login(input).await?))
}
