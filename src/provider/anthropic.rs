use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{read_body, require_key, Provider};
use crate::cli::ProviderKind;
use crate::errors::ProviderError;
use crate::wire::LlmRequest;

const DEFAULT_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct Anthropic {
    client: Client,
    api_key: Option<String>,
    api_base: String,
}

impl Anthropic {
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

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: String,
    messages: Vec<Msg<'a>>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

/// No native structured output here, so the schema rides in the system text.
fn system_with_contract(req: &LlmRequest) -> String {
    let mut system = req.system.clone();
    if let Some(schema) = &req.schema {
        system.push_str("\n\nRespond with ONLY a JSON document (no prose, no code fences) matching this JSON Schema:\n");
        system.push_str(&schema.to_string());
    }
    system
}

#[async_trait]
impl Provider for Anthropic {
    async fn send(&self, req: &LlmRequest) -> Result<String, ProviderError> {
        let key = require_key(&self.api_key, ProviderKind::Anthropic)?;
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let body = MsgRequest {
            model: &req.model,
            max_tokens: 4096,
            system: system_with_contract(req),
            messages: vec![Msg { role: "user", content: &req.user }],
        };

        tracing::debug!(stage = %req.stage, model = %req.model, "anthropic: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;
        let text = read_body(resp).await?;

        let parsed: MsgResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::debug!(error = %e, raw = %text, "anthropic: unexpected envelope");
            ProviderError::EmptyResponse
        })?;

        parsed
            .content
            .into_iter()
            .find(|b| b.r#type == "text")
            .map(|b| b.text)
            .ok_or(ProviderError::EmptyResponse)
    }
}
