//! Clarification-question generation for guided mode.

use crate::errors::CopilotError;
use crate::prompt;
use crate::wire::{decode_questions, schema, LlmRequest, QuestionDraft, Stage};

pub fn request(model: &str, prompt_text: &str) -> LlmRequest {
    LlmRequest {
        stage: Stage::Clarify,
        model: model.to_string(),
        system: prompt::system_prompt_clarify(),
        user: prompt::user_prompt_clarify(prompt_text),
        schema: Some(schema::clarification_questions()),
    }
}

/// An empty sequence means the prompt needs no clarification.
pub fn parse(raw: &str) -> Result<Vec<QuestionDraft>, CopilotError> {
    let drafts = decode_questions(raw).map_err(|e| CopilotError::malformed(Stage::Clarify, e))?;
    Ok(drafts
        .into_iter()
        .filter(|q| !q.question.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::QuestionKind;

    #[test]
    fn keeps_generator_order() {
        let raw = r#"[{"question":"Platform?","type":"select","suggestions":["iOS","Android","Both"]},
                      {"question":"Budget?","type":"text"}]"#;
        let qs = parse(raw).unwrap();
        assert_eq!(qs[0].question, "Platform?");
        assert_eq!(qs[0].kind, QuestionKind::Select);
        assert_eq!(qs[1].question, "Budget?");
    }

    #[test]
    fn malformed_reply_is_reported_not_swallowed() {
        let err = parse("Sure! Here are some questions: ...").unwrap_err();
        assert!(err.is_malformed());
    }
}
