use serde_json::Value;

use crate::api::middleware::AppError;
use crate::models::StructuredQuery;

/// Validation for query documents produced by the language model
///
/// Model output is untrusted. Anything that is not a JSON object with a
/// non-empty `queryText` string and an object of `variables` is rejected with
/// the same `InvalidLlmOutput` error, whatever the reason.
pub struct StructuredQueryValidator;

impl StructuredQueryValidator {
    /// Remove an optional leading ```` ```json ```` and trailing ```` ``` ````
    ///
    /// Only these two markers are removed; a bare leading fence stays in place
    /// and fails the JSON parse.
    pub fn strip_code_fence(raw: &str) -> &str {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("```json").unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
        trimmed.trim()
    }

    /// Parse raw model text into a [`StructuredQuery`]
    pub fn parse_structured_query(raw: &str) -> Result<StructuredQuery, AppError> {
        let text = Self::strip_code_fence(raw);

        let parsed: Value = serde_json::from_str(text).map_err(|e| {
            tracing::error!("LLM did not return valid JSON: {}", e);
            AppError::InvalidLlmOutput
        })?;

        let query_text = parsed
            .get("queryText")
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty());
        let variables = parsed.get("variables").and_then(Value::as_object);

        match (query_text, variables) {
            (Some(query_text), Some(variables)) => Ok(StructuredQuery {
                query_text: query_text.to_string(),
                variables: variables.clone(),
            }),
            _ => {
                tracing::error!("Invalid structure from LLM: {}", parsed);
                Err(AppError::InvalidLlmOutput)
            }
        }
    }
}
