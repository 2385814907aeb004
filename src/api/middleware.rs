use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which of the engine's statements failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Listing,
    Stats,
    Currency,
    CompanyCount,
    Lookup,
}

impl QueryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStage::Listing => "listing",
            QueryStage::Stats => "stats",
            QueryStage::Currency => "currency",
            QueryStage::CompanyCount => "company-count",
            QueryStage::Lookup => "lookup",
        }
    }

    /// Stable, caller-facing message for a failure in this stage
    pub fn failure_message(&self) -> &'static str {
        match self {
            QueryStage::Listing | QueryStage::Lookup => "Error when querying DB",
            QueryStage::Stats => "Error when querying DB for meta",
            QueryStage::Currency => "Error when querying DB for currency meta",
            QueryStage::CompanyCount => "Error when querying DB for company meta",
        }
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error types
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{}", .stage.failure_message())]
    QueryExecution { stage: QueryStage },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("LLM returned empty response")]
    EmptyModelResponse,

    #[error("LLM did not return valid JSON")]
    InvalidLlmOutput,

    #[error("LLM service error: {0}")]
    LlmService(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg),
            ),
            AppError::QueryExecution { stage } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("QUERY_FAILED", stage.failure_message()),
            ),
            // Driver text stays in the logs
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("QUERY_FAILED", "Error when querying DB"),
            ),
            AppError::ConnectionUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new("CONNECTION_UNAVAILABLE", "Database is unavailable"),
            ),
            AppError::EmptyModelResponse => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new("INVALID_MODEL_OUTPUT", "LLM returned empty response"),
            ),
            AppError::InvalidLlmOutput => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new("INVALID_MODEL_OUTPUT", "LLM did not return valid JSON"),
            ),
            AppError::LlmService(_) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new("LLM_SERVICE_ERROR", "Language model request failed"),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "Internal server error"),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_detail,
        });

        (status, body).into_response()
    }
}

/// Convert anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_format() {
        let error = AppError::Validation("Missing id".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_query_execution_message_is_stage_specific() {
        let listing = AppError::QueryExecution { stage: QueryStage::Listing };
        let stats = AppError::QueryExecution { stage: QueryStage::Stats };
        assert_eq!(listing.to_string(), "Error when querying DB");
        assert_eq!(stats.to_string(), "Error when querying DB for meta");
        assert_eq!(
            listing.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_database_error_does_not_leak_driver_text() {
        let error = AppError::Database("relation \"acquisitions\" does not exist".to_string());
        let response = error.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "QUERY_FAILED");
        assert!(!body.error.message.contains("relation"));
    }

    #[test]
    fn test_model_output_errors_are_bad_gateway() {
        assert_eq!(
            AppError::EmptyModelResponse.into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::InvalidLlmOutput.into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
