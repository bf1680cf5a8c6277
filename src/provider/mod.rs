use std::time::Duration;

use async_trait::async_trait;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::ProviderError;
use crate::wire::LlmRequest;

pub mod anthropic;
pub mod gemini;
pub mod ollama;
pub mod openai;

/// One request, one raw model reply. No retries at this layer.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn send(&self, req: &LlmRequest) -> Result<String, ProviderError>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(cfg: &Config) -> Result<DynProvider, ProviderError> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let key = cfg.resolve_api_key();
    let base = cfg.api_base.clone();
    Ok(match cfg.provider {
        ProviderKind::Gemini => Box::new(gemini::Gemini::new(key, base, timeout)?),
        ProviderKind::OpenAI => Box::new(openai::OpenAIProvider::new(key, base, timeout)?),
        ProviderKind::Anthropic => Box::new(anthropic::Anthropic::new(key, base, timeout)?),
        ProviderKind::Ollama => Box::new(ollama::Ollama::new(base, timeout)?),
    })
}

pub(crate) fn require_key(key: &Option<String>, kind: ProviderKind) -> Result<&str, ProviderError> {
    key.as_deref()
        .ok_or_else(|| ProviderError::MissingApiKey(kind.api_key_vars().join(" or ")))
}

/// Non-success statuses carry the body so the log shows what the API said.
pub(crate) async fn read_body(resp: reqwest::Response) -> Result<String, ProviderError> {
    let status = resp.status();
    let text = resp.text().await?;
    tracing::debug!(%status, bytes = text.len(), "provider response");
    if !status.is_success() {
        return Err(ProviderError::Api { status: status.as_u16(), body: text });
    }
    Ok(text)
}
