//! Lead note handlers. Each returns the whole lead with notes resolved.

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crm_core::{LeadView, NoteInput};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;

/// POST /leads/{id}/notes
pub async fn add_note(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<NoteInput>,
) -> Result<(StatusCode, Json<LeadView>), ApiError> {
    let lead = state.leads.add_note(&identity, &id, input).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// PUT /leads/{id}/notes/{note_id}
pub async fn edit_note(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath((id, note_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(input): ApiJson<NoteInput>,
) -> Result<Json<LeadView>, ApiError> {
    Ok(Json(state.leads.edit_note(&identity, &id, &note_id, input).await?))
}

/// DELETE /leads/{id}/notes/{note_id}
pub async fn delete_note(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath((id, note_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<LeadView>, ApiError> {
    Ok(Json(state.leads.delete_note(&identity, &id, &note_id).await?))
}
