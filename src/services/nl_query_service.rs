use std::sync::Arc;

use async_graphql::{Request, Variables};
use serde_json::{json, Value};
use tracing::Instrument;

use crate::api::middleware::AppError;
use crate::models::{HandlerResponse, PromptRequest, StructuredQuery};
use crate::services::acquisition_service::AcquisitionService;
use crate::services::database::StoreProvider;
use crate::services::llm_service::LanguageModel;
use crate::services::prompts::SYSTEM_PROMPT;
use crate::services::schema::AcquisitionSchema;
use crate::validation::StructuredQueryValidator;

/// Natural-language question → model-written query → executed result
pub struct NlQueryService {
    model: Arc<dyn LanguageModel>,
    provider: Arc<dyn StoreProvider>,
    schema: AcquisitionSchema,
}

impl NlQueryService {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        provider: Arc<dyn StoreProvider>,
        schema: AcquisitionSchema,
    ) -> Self {
        Self {
            model,
            provider,
            schema,
        }
    }

    /// Entry point for a raw `{"prompt": ...}` request body
    ///
    /// A body that does not parse is treated like one without a prompt.
    pub async fn handle(&self, body: &[u8]) -> Result<HandlerResponse, AppError> {
        let request: PromptRequest = serde_json::from_slice(body).unwrap_or_else(|e| {
            tracing::debug!("Unreadable prompt body: {}", e);
            PromptRequest::default()
        });
        self.answer_prompt(request.prompt.as_deref()).await
    }

    pub async fn answer_prompt(&self, prompt: Option<&str>) -> Result<HandlerResponse, AppError> {
        let prompt = match prompt.map(str::trim) {
            Some(prompt) if !prompt.is_empty() => prompt,
            _ => return Ok(HandlerResponse::bad_request("Missing prompt")),
        };

        let span = tracing::info_span!("nl_query", request_id = %uuid::Uuid::new_v4());
        self.run(prompt).instrument(span).await
    }

    async fn run(&self, prompt: &str) -> Result<HandlerResponse, AppError> {
        tracing::debug!("userPrompt: {}", prompt);

        let raw = self
            .model
            .complete(SYSTEM_PROMPT, prompt)
            .await?
            .ok_or(AppError::EmptyModelResponse)?;
        tracing::info!("LLM response: {}", raw);

        let query = StructuredQueryValidator::parse_structured_query(&raw)?;
        tracing::info!(
            "Parsed LLM response: {} with {} variable(s)",
            query.query_text,
            query.variables.len()
        );

        let store = self.provider.acquire().await?;
        let response = self
            .schema
            .execute(
                Request::new(query.query_text.as_str())
                    .variables(Variables::from_json(Value::Object(query.variables.clone())))
                    .data(AcquisitionService::new(store)),
            )
            .await;
        if !response.errors.is_empty() {
            tracing::warn!("Generated query returned {} error(s)", response.errors.len());
        }

        let response = serde_json::to_value(&response)
            .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))?;
        tracing::debug!("DB response: {}", response);

        Ok(HandlerResponse::new(200, audit_body(&query, response)))
    }
}

/// Success body: the generated query next to what it returned
fn audit_body(query: &StructuredQuery, response: Value) -> Value {
    json!({
        "llmGeneratedQuery": query,
        "response": response,
    })
}
