// ============================================================================
// CRM API - Lead Handlers
// File: crates/crm-api/src/handlers/leads.rs
// ============================================================================

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crm_core::{LeadFilterParams, LeadInput, LeadStats, LeadView};
use crm_shared::constants::EXPORT_FILENAME;

use super::MessageResponse;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;

/// POST /leads
pub async fn create_lead(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(input): ApiJson<LeadInput>,
) -> Result<(StatusCode, Json<LeadView>), ApiError> {
    let lead = state.leads.create_lead(&identity, input).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /leads?status=&priority=
pub async fn list_leads(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<LeadFilterParams>,
) -> Result<Json<Vec<LeadView>>, ApiError> {
    let filter = params.into_filter()?;
    Ok(Json(state.leads.list_leads(&identity, filter).await?))
}

/// GET /leads/stats
pub async fn lead_stats(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<LeadStats>, ApiError> {
    Ok(Json(state.leads.lead_stats(&identity).await?))
}

/// GET /leads/{id}
pub async fn get_lead(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<LeadView>, ApiError> {
    Ok(Json(state.leads.get_lead(&identity, &id).await?))
}

/// PUT /leads/{id}
pub async fn update_lead(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<LeadInput>,
) -> Result<Json<LeadView>, ApiError> {
    Ok(Json(state.leads.update_lead(&identity, &id, input).await?))
}

/// DELETE /leads/{id}
pub async fn delete_lead(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.leads.delete_lead(&identity, &id).await?;
    Ok(Json(MessageResponse::new("Lead deleted successfully")))
}

/// GET /leads/export/csv?status=&priority=
pub async fn export_csv(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<LeadFilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = params.into_filter()?;
    let csv = state.leads.export_csv(&identity, filter).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", EXPORT_FILENAME)),
    ];
    Ok((headers, csv))
}
