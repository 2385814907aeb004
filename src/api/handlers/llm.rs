use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::api::handlers::AppState;
use crate::api::middleware::AppError;

/// Answer a natural-language question about acquisitions
pub async fn execute_natural_language_query(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    tracing::info!("Executing natural language query");

    let response = state.nl_service.handle(&body).await?;
    let status = StatusCode::from_u16(response.status_code).map_err(|e| {
        AppError::Internal(format!("Invalid status code {}: {}", response.status_code, e))
    })?;

    Ok((status, Json(response.body)))
}
