use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers::{graphql, llm, AppState};

/// Create router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/acquisitions", post(graphql::execute_graphql))
        .route(
            "/v1/llm/acquisitions",
            post(llm::execute_natural_language_query),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::AppError;
    use crate::services::database::fake::{FakeProvider, FakeStore};
    use crate::services::database::{DataStore, StoreProvider};
    use crate::services::llm_service::LanguageModel;
    use crate::services::nl_query_service::NlQueryService;
    use crate::services::schema::build_schema;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedModel(Option<&'static str>);

    #[async_trait::async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, _: &str, _: &str) -> Result<Option<String>, AppError> {
            Ok(self.0.map(str::to_string))
        }
    }

    /// Provider for a database that is down; counts how often it was asked
    #[derive(Default)]
    struct DownProvider {
        attempts: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl StoreProvider for DownProvider {
        async fn acquire(&self) -> Result<Arc<dyn DataStore>, AppError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(AppError::ConnectionUnavailable("refused".to_string()))
        }
    }

    fn router(model: Option<&'static str>, provider: Arc<dyn StoreProvider>) -> Router {
        let schema = build_schema();
        let nl_service = Arc::new(NlQueryService::new(
            Arc::new(FixedModel(model)),
            provider.clone(),
            schema.clone(),
        ));
        create_router(AppState::new(schema, provider, nl_service))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = router(None, Arc::new(FakeProvider::new(FakeStore::new())));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_graphql_endpoint_executes_query() {
        let store = FakeStore::new();
        store.reply(
            "WHERE a.id = $1",
            vec![json!({ "id": 1000, "acquisition_id": 1, "term_code": "cash" })],
        );
        let app = router(None, Arc::new(FakeProvider::new(store)));

        let response = app
            .oneshot(post_json(
                "/v1/acquisitions",
                json!({
                    "query": "query($id: ID!) { acquisition(id: $id) { id term_code } }",
                    "variables": { "id": "1000" }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "data": { "acquisition": { "id": "1000", "term_code": "cash" } } })
        );
    }

    #[tokio::test]
    async fn test_graphql_endpoint_reports_unavailable_database() {
        let provider = Arc::new(DownProvider::default());
        let app = router(None, provider.clone());
        let response = app
            .oneshot(post_json(
                "/v1/acquisitions",
                json!({ "query": "{ acquisitions { rows { id } } }" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["errors"][0]["message"]
            .as_str()
            .unwrap()
            .starts_with("Connection unavailable"));
        // The failed listing ends the request before the aggregates ask again
        assert_eq!(provider.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_graphql_request_never_touches_the_database() {
        let provider = Arc::new(DownProvider::default());
        let app = router(None, provider.clone());

        for query in [
            "{ acquisitions { rows { id }",
            "{ acquisitions { rows { password } } }",
            "{ __schema { queryType { name } } }",
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/v1/acquisitions", json!({ "query": query })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(provider.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_llm_endpoint_missing_prompt() {
        let app = router(None, Arc::new(FakeProvider::new(FakeStore::new())));
        let response = app
            .oneshot(post_json("/v1/llm/acquisitions", json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "Missing prompt" }));
    }

    #[tokio::test]
    async fn test_llm_endpoint_empty_model_response() {
        let app = router(None, Arc::new(FakeProvider::new(FakeStore::new())));
        let response = app
            .oneshot(post_json(
                "/v1/llm/acquisitions",
                json!({ "prompt": "largest deals" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "LLM returned empty response"
        );
    }

    #[tokio::test]
    async fn test_llm_endpoint_returns_generated_query() {
        let reply = r#"{"queryText": "query($id: ID!) { acquisition(id: $id) { id } }", "variables": {"id": "5"}}"#;
        let store = FakeStore::new();
        store.reply("WHERE a.id = $1", vec![json!({ "id": 5 })]);
        let app = router(Some(reply), Arc::new(FakeProvider::new(store)));

        let response = app
            .oneshot(post_json(
                "/v1/llm/acquisitions",
                json!({ "prompt": "acquisition 5" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["llmGeneratedQuery"]["variables"], json!({ "id": "5" }));
        assert_eq!(
            body["response"],
            json!({ "data": { "acquisition": { "id": "5" } } })
        );
    }
}
