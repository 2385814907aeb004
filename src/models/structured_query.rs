use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query document produced by the language model: query text plus its variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub query_text: String,
    pub variables: Map<String, Value>,
}

/// Body of a natural-language request
#[derive(Debug, Default, Deserialize)]
pub struct PromptRequest {
    pub prompt: Option<String>,
}

/// HTTP-style outcome of the natural-language pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: Value,
}

impl HandlerResponse {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(400, serde_json::json!({ "error": message }))
    }
}
