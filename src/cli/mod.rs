use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    /// (enhancement model, analysis model) used when nothing is configured.
    pub fn default_models(self) -> (&'static str, &'static str) {
        match self {
            ProviderKind::Gemini => ("gemini-2.5-flash", "gemini-2.5-pro"),
            ProviderKind::OpenAI => ("gpt-4.1-mini", "gpt-4.1"),
            ProviderKind::Anthropic => ("claude-3-5-haiku-latest", "claude-sonnet-4-0"),
            ProviderKind::Ollama => ("llama3.1", "llama3.1"),
        }
    }

    pub fn api_key_vars(self) -> &'static [&'static str] {
        match self {
            ProviderKind::Gemini => &["GEMINI_API_KEY", "API_KEY"],
            ProviderKind::OpenAI => &["OPENAI_API_KEY"],
            ProviderKind::Anthropic => &["ANTHROPIC_API_KEY"],
            ProviderKind::Ollama => &[],
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowMode {
    /// Enhance the prompt as typed.
    #[default]
    Direct,
    /// Auto-correct, ask clarifying questions, then enhance.
    #[value(alias = "pro")]
    Guided,
}

#[derive(Parser, Debug)]
#[command(
    name = "prompt-copilot",
    version,
    about = "Turns a short prompt into three polished prompt variants"
)]
pub struct Args {
    /// Prompt to enhance once; starts an interactive session when omitted.
    #[arg(long, short)]
    pub prompt: Option<String>,

    #[arg(long, value_enum, default_value_t = WorkflowMode::Direct)]
    pub mode: WorkflowMode,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Model for enhancement, auto-correction and feedback.
    #[arg(long)]
    pub model: Option<String>,

    /// Model for clarification questions.
    #[arg(long)]
    pub analysis_model: Option<String>,

    #[arg(long)]
    pub api_base: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, default_value_t = false)]
    pub save_transcript: bool,

    /// Print the result as JSON instead of the formatted view.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Disable live prompt feedback in interactive sessions.
    #[arg(long, default_value_t = false)]
    pub no_feedback: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
