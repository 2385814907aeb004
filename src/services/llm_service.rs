use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

use crate::api::middleware::AppError;
use crate::config::Config;

/// Text-completion collaborator used by the natural-language pipeline
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `user_prompt` under `system_prompt`; `None` when the model
    /// produced no text
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Option<String>, AppError>;
}

/// OpenAI Responses API client
pub struct OpenAiModel {
    api_url: String,
    api_key: Option<String>,
    model: String,
    http_client: HttpClient,
}

impl OpenAiModel {
    pub fn new(config: &Config) -> Self {
        Self {
            api_url: config.llm.api_url.trim_end_matches('/').to_string(),
            api_key: config.llm.api_key.clone().filter(|key| !key.is_empty()),
            model: config.llm.model.clone(),
            http_client: HttpClient::new(),
        }
    }

    fn request_body(&self, system_prompt: &str, user_prompt: &str) -> Value {
        json!({
            "model": self.model,
            "input": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Option<String>, AppError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AppError::LlmService("Missing OPENAI_API_KEY".to_string()))?;

        let response = self
            .http_client
            .post(format!("{}/responses", self.api_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&self.request_body(system_prompt, user_prompt))
            .send()
            .await
            .map_err(|e| AppError::LlmService(format!("Failed to call LLM service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("LLM service returned error {}: {}", status, error_text);
            return Err(AppError::LlmService(format!(
                "LLM service returned error {}",
                status
            )));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| AppError::LlmService(format!("Failed to parse LLM response: {}", e)))?;

        let text = output_text(&result);
        match &text {
            Some(text) => tracing::debug!("LLM raw response: {}", text),
            None => tracing::warn!("No response from LLM"),
        }
        Ok(text)
    }
}

/// Text of a Responses API payload
///
/// Prefers the aggregated `output_text` field and otherwise joins every
/// `output_text` content item. Whitespace-only text counts as no text.
fn output_text(result: &Value) -> Option<String> {
    let text = match result.get("output_text").and_then(Value::as_str) {
        Some(text) => text.to_string(),
        None => result
            .get("output")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("content").and_then(Value::as_array))
            .flatten()
            .filter(|content| content.get("type").and_then(Value::as_str) == Some("output_text"))
            .filter_map(|content| content.get("text").and_then(Value::as_str))
            .collect::<String>(),
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
