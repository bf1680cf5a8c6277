use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{read_body, Provider};
use crate::errors::ProviderError;
use crate::wire::LlmRequest;

const DEFAULT_URL: &str = "http://localhost:11434";

pub struct Ollama {
    client: Client,
    url: String,
}

impl Ollama {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Value>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl Provider for Ollama {
    async fn send(&self, req: &LlmRequest) -> Result<String, ProviderError> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &req.model,
            messages: vec![
                Msg { role: "system", content: &req.system },
                Msg { role: "user", content: &req.user },
            ],
            stream: false,
            format: req.schema.as_ref(),
            options: OllamaOptions { temperature: 0.2 },
        };

        tracing::debug!(stage = %req.stage, model = %req.model, "ollama: POST {}", url);

        let resp = self.client.post(&url).json(&body).send().await?;
        let text = read_body(resp).await?;

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::debug!(error = %e, raw = %text, "ollama: unexpected envelope");
            ProviderError::EmptyResponse
        })?;
        Ok(parsed.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{schema, Stage};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn schema_goes_out_as_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama3.1",
                "stream": false,
                "format": { "type": "array" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.1",
                "message": { "role": "assistant", "content": "[]" },
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ollama = Ollama::new(Some(server.uri()), Duration::from_secs(5)).unwrap();
        let req = LlmRequest {
            stage: Stage::Clarify,
            model: "llama3.1".into(),
            system: "sys".into(),
            user: "Explain blockchain.".into(),
            schema: Some(schema::clarification_questions()),
        };
        assert_eq!(ollama.send(&req).await.unwrap(), "[]");
    }
}
