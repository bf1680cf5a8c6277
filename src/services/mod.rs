use async_trait::async_trait;

use crate::errors::{CopilotError, ProviderError};
use crate::provider::DynProvider;
use crate::transcript::Transcript;
use crate::wire::{EnhancedPromptResponse, LlmRequest, PromptFeedback, QuestionDraft};

pub mod advisor;
pub mod corrector;
pub mod enhancer;
pub mod questions;

/// Everything the session needs from the model, one method per service.
#[async_trait]
pub trait PromptServices: Send + Sync {
    async fn auto_correct(&self, text: &str) -> Result<String, CopilotError>;
    async fn clarification_questions(&self, prompt: &str) -> Result<Vec<QuestionDraft>, CopilotError>;
    async fn enhance(&self, prompt: &str) -> Result<EnhancedPromptResponse, CopilotError>;
    async fn assess(&self, draft: &str) -> Result<PromptFeedback, CopilotError>;
}

pub struct LlmServices {
    provider: DynProvider,
    transcript: Transcript,
    model: String,
    analysis_model: String,
}

impl LlmServices {
    pub fn new(provider: DynProvider, transcript: Transcript, model: String, analysis_model: String) -> Self {
        Self { provider, transcript, model, analysis_model }
    }

    async fn call(&self, req: LlmRequest) -> Result<String, CopilotError> {
        tracing::info!(stage = %req.stage, model = %req.model, "calling model");
        match self.provider.send(&req).await {
            Ok(raw) => {
                self.transcript.record(&req, &raw);
                Ok(raw)
            }
            Err(e) => {
                self.transcript.record(&req, &format!("error: {e}"));
                Err(CopilotError::upstream(req.stage, e))
            }
        }
    }
}

#[async_trait]
impl PromptServices for LlmServices {
    async fn auto_correct(&self, text: &str) -> Result<String, CopilotError> {
        let raw = self.call(corrector::request(&self.model, text)).await?;
        corrector::parse(&raw)
    }

    async fn clarification_questions(&self, prompt: &str) -> Result<Vec<QuestionDraft>, CopilotError> {
        let raw = self.call(questions::request(&self.analysis_model, prompt)).await?;
        questions::parse(&raw)
    }

    async fn enhance(&self, prompt: &str) -> Result<EnhancedPromptResponse, CopilotError> {
        let raw = self.call(enhancer::request(&self.model, prompt)).await?;
        enhancer::parse(&raw, prompt)
    }

    async fn assess(&self, draft: &str) -> Result<PromptFeedback, CopilotError> {
        let raw = self.call(advisor::request(&self.model, draft)).await?;
        advisor::parse(&raw)
    }
}

pub(crate) fn empty_reply(stage: crate::wire::Stage) -> CopilotError {
    CopilotError::upstream(stage, ProviderError::EmptyResponse)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use crate::wire::Stage;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays canned replies and remembers what was asked.
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        seen: std::sync::Arc<Mutex<Vec<LlmRequest>>>,
    }

    #[async_trait]
    impl Provider for Scripted {
        async fn send(&self, req: &LlmRequest) -> Result<String, ProviderError> {
            self.seen.lock().push(req.clone());
            self.replies.lock().pop_front().unwrap_or(Err(ProviderError::EmptyResponse))
        }
    }

    fn services(
        replies: Vec<Result<String, ProviderError>>,
    ) -> (LlmServices, std::sync::Arc<Mutex<Vec<LlmRequest>>>) {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let provider = Scripted { replies: Mutex::new(replies.into()), seen: seen.clone() };
        let svc = LlmServices::new(
            Box::new(provider),
            Transcript::disabled(),
            "fast".into(),
            "deep".into(),
        );
        (svc, seen)
    }

    const REPLY: &str = r#"{"overallTitle":"T","variants":{
        "directorsCut":{"variantTitle":"a","variantDescription":"b","enhancedPrompt":"c"},
        "maverick":{"variantTitle":"a","variantDescription":"b","enhancedPrompt":"c"},
        "catalyst":{"variantTitle":"a","variantDescription":"b","enhancedPrompt":"c"}},
        "enhancementLog":{"userInput":"something else"}}"#;

    #[tokio::test]
    async fn enhance_echoes_the_real_input() {
        let (svc, seen) = services(vec![Ok(REPLY.into())]);
        let out = svc.enhance("Explain blockchain.").await.unwrap();
        assert_eq!(out.enhancement_log.user_input, "Explain blockchain.");

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].stage, Stage::Enhance);
        assert_eq!(seen[0].model, "fast");
        assert!(seen[0].schema.is_some());
    }

    #[tokio::test]
    async fn questions_use_the_analysis_model() {
        let (svc, seen) = services(vec![Ok(String::new())]);
        assert!(svc.clarification_questions("Explain blockchain.").await.unwrap().is_empty());
        assert_eq!(seen.lock()[0].model, "deep");
    }

    #[tokio::test]
    async fn transport_failures_carry_the_stage() {
        let (svc, _) = services(vec![Err(ProviderError::Api { status: 503, body: "down".into() })]);
        match svc.enhance("x").await {
            Err(CopilotError::Upstream { stage: Stage::Enhance, .. }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn corrector_sends_plain_text_request() {
        let (svc, seen) = services(vec![Ok("  Explain blockchain.\n".into())]);
        assert_eq!(svc.auto_correct("explain blokchain").await.unwrap(), "Explain blockchain.");
        assert!(seen.lock()[0].schema.is_none());
    }
}
