// ============================================================================
// CRM API - CSV Upload Handler
// File: crates/crm-api/src/handlers/csv.rs
// ============================================================================
//! Multipart CSV upload, answered with the parsed rows.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info};

use crm_core::services::CsvRow;
use crm_core::DomainError;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub total_rows: usize,
    pub data: Vec<CsvRow>,
}

#[derive(Debug, Serialize)]
pub struct UploadFailure {
    pub success: bool,
    pub error: String,
}

/// POST /csv/upload (multipart field `file`)
pub async fn upload_csv(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.csv").to_string();
        let mut upload = state.csv_import.stage().await?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
        {
            upload.write_chunk(&chunk).await?;
        }

        return match state.csv_import.preview(upload).await {
            Ok(preview) => {
                info!("User {} previewed {} ({} rows)", identity.user_id, filename, preview.total_rows);
                Ok(Json(UploadResponse { success: true, total_rows: preview.total_rows, data: preview.rows })
                    .into_response())
            }
            Err(DomainError::CsvParse(msg)) => {
                error!("CSV upload {} could not be parsed: {}", filename, msg);
                Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(UploadFailure { success: false, error: msg }))
                    .into_response())
            }
            Err(e) => Err(e.into()),
        };
    }

    Err(ApiError::BadRequest("CSV file required".to_string()))
}
