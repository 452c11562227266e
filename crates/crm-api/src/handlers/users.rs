use axum::{extract::State, Json};

use crm_core::{ProfileInput, UserProfile};

use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

/// GET /users (admin)
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    Ok(Json(state.users.list_users(&identity).await?))
}

/// GET /users/me
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.users.get_profile(&identity).await?))
}

/// PUT /users/me
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(input): ApiJson<ProfileInput>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.users.update_profile(&identity, input).await?))
}
