use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{read_body, require_key, Provider};
use crate::cli::ProviderKind;
use crate::errors::ProviderError;
use crate::wire::LlmRequest;

const DEFAULT_BASE: &str = "https://api.openai.com/v1";

/// Chat-completions adapter. Declared schemas go out as `json_schema`
/// response formats.
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    api_base: String,
}

impl OpenAIProvider {
    pub fn new(
        api_key: Option<String>,
        api_base: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_BASE.to_string()),
        })
    }
}

/// Structured outputs must be object-rooted, so arrays travel under `items`;
/// `wire::decode_questions` accepts that wrapping.
fn object_rooted(schema: &Value) -> Value {
    if schema.get("type").and_then(Value::as_str) == Some("array") {
        json!({
            "type": "object",
            "properties": { "items": schema },
            "required": ["items"]
        })
    } else {
        schema.clone()
    }
}

fn request_body(req: &LlmRequest) -> Value {
    let mut body = json!({
        "model": req.model,
        "messages": [
            { "role": "system", "content": req.system },
            { "role": "user", "content": req.user }
        ],
        "temperature": 0.7
    });
    if let Some(schema) = &req.schema {
        body["response_format"] = json!({
            "type": "json_schema",
            "json_schema": {
                "name": format!("{}_response", req.stage.slug()),
                "schema": object_rooted(schema),
                "strict": false
            }
        });
    }
    body
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn send(&self, req: &LlmRequest) -> Result<String, ProviderError> {
        let key = require_key(&self.api_key, ProviderKind::OpenAI)?;
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let body = request_body(req);

        tracing::debug!(stage = %req.stage, model = %req.model, "openai: POST {}", url);

        let resp = self.client.post(&url).bearer_auth(key).json(&body).send().await?;
        let text = read_body(resp).await?;

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::debug!(error = %e, raw = %text, "openai: unexpected envelope");
            ProviderError::EmptyResponse
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or(ProviderError::EmptyResponse)
    }
}
