use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{read_body, require_key, Provider};
use crate::cli::ProviderKind;
use crate::errors::ProviderError;
use crate::wire::LlmRequest;

const DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct Gemini {
    client: Client,
    api_key: Option<String>,
    api_base: String,
}

impl Gemini {
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
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<PartIn<'a>>,
}

#[derive(Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    #[serde(default)]
    text: String,
}

/// Gemini's schema dialect spells types in upper case (`OBJECT`, `STRING`).
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let converted = match (k.as_str(), v) {
                    ("type", Value::String(t)) => Value::String(t.to_uppercase()),
                    // property names are user keys, not schema keywords
                    ("properties", Value::Object(props)) => Value::Object(
                        props.iter().map(|(name, s)| (name.clone(), to_gemini_schema(s))).collect(),
                    ),
                    _ => to_gemini_schema(v),
                };
                out.insert(k.clone(), converted);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

#[async_trait]
impl Provider for Gemini {
    async fn send(&self, req: &LlmRequest) -> Result<String, ProviderError> {
        let key = require_key(&self.api_key, ProviderKind::Gemini)?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            req.model
        );
        let body = GenerateRequest {
            system_instruction: Content { role: None, parts: vec![PartIn { text: &req.system }] },
            contents: vec![Content { role: Some("user"), parts: vec![PartIn { text: &req.user }] }],
            generation_config: req.schema.as_ref().map(|s| GenerationConfig {
                response_mime_type: "application/json",
                response_schema: to_gemini_schema(s),
            }),
        };

        tracing::debug!(stage = %req.stage, model = %req.model, "gemini: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;
        let text = read_body(resp).await?;

        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::debug!(error = %e, raw = %text, "gemini: unexpected envelope");
            ProviderError::EmptyResponse
        })?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }
}
