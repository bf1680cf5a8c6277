//! Live quality feedback on a draft prompt.

use crate::errors::CopilotError;
use crate::prompt;
use crate::wire::{decode, schema, LlmRequest, PromptFeedback, Stage};

pub fn request(model: &str, draft: &str) -> LlmRequest {
    LlmRequest {
        stage: Stage::Feedback,
        model: model.to_string(),
        system: prompt::system_prompt_feedback(),
        user: prompt::user_prompt_feedback(draft),
        schema: Some(schema::prompt_feedback()),
    }
}

pub fn parse(raw: &str) -> Result<PromptFeedback, CopilotError> {
    decode(raw).map_err(|e| CopilotError::malformed(Stage::Feedback, e))
}

/// Only drafts longer than `min_chars` (after trimming) are worth rating.
pub fn worth_assessing(draft: &str, min_chars: usize) -> bool {
    draft.trim().chars().count() > min_chars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Rating;

    #[test]
    fn threshold_is_exclusive_and_ignores_padding() {
        assert!(!worth_assessing("   write a poem      ", 15));
        assert!(!worth_assessing("exactly fifteen", 15));
        assert!(worth_assessing("exactly sixteen!", 15));
    }

    #[test]
    fn parses_rating() {
        let fb = parse(r#"{"overallRating":"Poor","strengths":[],"suggestions":["Say who the audience is"]}"#).unwrap();
        assert_eq!(fb.overall_rating, Rating::Poor);
        assert_eq!(fb.suggestions.len(), 1);
    }
}
