use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod schema;

/// ========================================
/// Request/Response wire protocol
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    AutoCorrect,
    Clarify,
    Enhance,
    Feedback,
}

impl Stage {
    pub fn slug(self) -> &'static str {
        match self {
            Stage::AutoCorrect => "autocorrect",
            Stage::Clarify => "clarify",
            Stage::Enhance => "enhance",
            Stage::Feedback => "feedback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::AutoCorrect => "auto-correction",
            Stage::Clarify => "clarification",
            Stage::Enhance => "enhancement",
            Stage::Feedback => "feedback",
        };
        f.write_str(name)
    }
}

/// Provider-neutral request. `schema` absent means plain-text output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub stage: Stage,
    pub model: String,
    pub system: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptVariant {
    pub variant_title: String,
    pub variant_description: String,
    pub enhanced_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicVariants {
    pub directors_cut: PromptVariant,
    pub maverick: PromptVariant,
    pub catalyst: PromptVariant,
}

impl StrategicVariants {
    /// Display label and variant, in presentation order.
    pub fn labelled(&self) -> [(&'static str, &PromptVariant); 3] {
        [
            ("Director's Cut", &self.directors_cut),
            ("Maverick", &self.maverick),
            ("Catalyst", &self.catalyst),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementLog {
    pub user_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_corrected_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarifications: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_details: Option<Vec<String>>,
}

impl EnhancementLog {
    pub fn has_correction(&self) -> bool {
        self.auto_corrected_input
            .as_deref()
            .is_some_and(|c| c != self.user_input)
    }

    pub fn has_clarifications(&self) -> bool {
        self.clarifications.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn has_added_details(&self) -> bool {
        self.added_details.as_ref().is_some_and(|d| !d.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_correction() && !self.has_clarifications() && !self.has_added_details()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedPromptResponse {
    pub overall_title: String,
    pub variants: StrategicVariants,
    pub enhancement_log: EnhancementLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Text,
    Select,
}

/// A question as produced by the generator, before the session numbers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Poor,
    Average,
    Good,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rating::Poor => "Poor",
            Rating::Average => "Average",
            Rating::Good => "Good",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub overall_rating: Rating,
    pub strengths: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionsPayload {
    Bare(Vec<QuestionDraft>),
    Wrapped {
        #[serde(alias = "items")]
        questions: Vec<QuestionDraft>,
    },
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\s*```$").expect("static fence regex")
    })
}

/// Trims the body and removes one surrounding markdown code fence, if any.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    match fence_re().captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Strict parse of a model body into a typed entity.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_fences(raw))
}

/// Question lists may come back empty, bare, or wrapped in an object.
pub fn decode_questions(raw: &str) -> Result<Vec<QuestionDraft>, serde_json::Error> {
    let body = strip_fences(raw);
    if body.is_empty() {
        return Ok(Vec::new());
    }
    Ok(match serde_json::from_str::<QuestionsPayload>(body)? {
        QuestionsPayload::Bare(q) => q,
        QuestionsPayload::Wrapped { questions } => questions,
    })
}
