//! Spelling and grammar pass run before guided-mode analysis.

use super::empty_reply;
use crate::errors::CopilotError;
use crate::prompt;
use crate::wire::{strip_fences, LlmRequest, Stage};

pub fn request(model: &str, text: &str) -> LlmRequest {
    LlmRequest {
        stage: Stage::AutoCorrect,
        model: model.to_string(),
        system: prompt::system_prompt_autocorrect(),
        user: prompt::user_prompt_autocorrect(text),
        schema: None,
    }
}

/// A blank correction is treated as a failure so callers fall back to the
/// original text.
pub fn parse(raw: &str) -> Result<String, CopilotError> {
    let corrected = strip_fences(raw).trim_matches('"').trim();
    if corrected.is_empty() {
        return Err(empty_reply(Stage::AutoCorrect));
    }
    Ok(corrected.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_quotes_and_whitespace() {
        assert_eq!(parse("\"Write a story about a cat.\"\n").unwrap(), "Write a story about a cat.");
    }

    #[test]
    fn blank_reply_is_an_error() {
        assert!(parse("  \n ").is_err());
    }
}
