use thiserror::Error;

use crate::wire::Stage;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("missing API key: set {0} or `api_key` in the config file")] MissingApiKey(String),
    #[error("http error: {0}")] Http(#[from] reqwest::Error),
    #[error("api error ({status}): {body}")] Api { status: u16, body: String },
    #[error("model returned no content")] EmptyResponse,
}

#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("prompt required")]
    EmptyPrompt,

    #[error("questionnaire incomplete: {answered} of {total} answered")]
    IncompleteAnswers { answered: usize, total: usize },

    #[error("no questionnaire is active")]
    NoQuestionnaire,

    #[error("{stage} returned malformed JSON: {source}")]
    MalformedResponse {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage} request failed: {source}")]
    Upstream {
        stage: Stage,
        #[source]
        source: ProviderError,
    },
}

impl CopilotError {
    pub fn malformed(stage: Stage, source: serde_json::Error) -> Self {
        Self::MalformedResponse { stage, source }
    }

    pub fn upstream(stage: Stage, source: ProviderError) -> Self {
        Self::Upstream { stage, source }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }

    /// Text shown in the error panel. Parse failures and transport failures
    /// read differently so the user knows whether rephrasing can help.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyPrompt => "Please enter a prompt to enhance.".into(),
            Self::IncompleteAnswers { .. } => {
                "Please answer every question before generating the final prompt.".into()
            }
            Self::NoQuestionnaire => "There is no questionnaire waiting for answers.".into(),
            Self::MalformedResponse { stage: Stage::Clarify, .. } => {
                "The AI failed to generate a valid questionnaire. Please try refining your prompt.".into()
            }
            Self::MalformedResponse { .. } => {
                "Failed to get a valid JSON response from the AI. Please try again.".into()
            }
            Self::Upstream { stage: Stage::Clarify, .. } => {
                "An error occurred while communicating with the AI service for Guided Mode analysis.".into()
            }
            Self::Upstream { .. } => "An error occurred while communicating with the AI service.".into(),
        }
    }
}
