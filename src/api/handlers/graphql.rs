use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::handlers::AppState;
use crate::services::acquisition_service::AcquisitionService;
use crate::services::database::DeferredStore;

/// Execute a GraphQL request against the acquisitions schema
///
/// Parse, validation, resolver and connection errors are all reported inside
/// the GraphQL response. The data store is only acquired once a resolver runs
/// a statement, so rejected requests never start pool creation.
pub async fn execute_graphql(
    State(state): State<AppState>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    tracing::debug!(
        "Executing GraphQL operation: {}",
        request.operation_name.as_deref().unwrap_or("<anonymous>")
    );

    let store = Arc::new(DeferredStore::new(state.provider.clone()));
    let response = state
        .schema
        .execute(request.data(AcquisitionService::new(store)))
        .await;

    if !response.errors.is_empty() {
        tracing::warn!("GraphQL request returned {} error(s)", response.errors.len());
    }
    Json(response)
}
