//! Prompt enhancement into three strategic variants.

use crate::errors::CopilotError;
use crate::prompt;
use crate::wire::{decode, schema, EnhancedPromptResponse, LlmRequest, Stage};

pub fn request(model: &str, prompt_text: &str) -> LlmRequest {
    LlmRequest {
        stage: Stage::Enhance,
        model: model.to_string(),
        system: prompt::system_prompt_enhance(),
        user: prompt::user_prompt_enhance(prompt_text),
        schema: Some(schema::enhanced_prompt()),
    }
}

/// `input` is what was actually sent; the log always echoes it.
pub fn parse(raw: &str, input: &str) -> Result<EnhancedPromptResponse, CopilotError> {
    let mut resp: EnhancedPromptResponse =
        decode(raw).map_err(|e| CopilotError::malformed(Stage::Enhance, e))?;
    for (label, v) in resp.variants.labelled() {
        if v.variant_title.trim().is_empty() || v.enhanced_prompt.trim().is_empty() {
            let e = <serde_json::Error as serde::de::Error>::custom(format!("{label} variant is empty"));
            return Err(CopilotError::malformed(Stage::Enhance, e));
        }
    }
    // corrections are reported by the session, never by the model
    resp.enhancement_log.auto_corrected_input = None;
    if resp.enhancement_log.user_input != input {
        tracing::debug!("model paraphrased userInput; restoring the original");
        resp.enhancement_log.user_input = input.to_string();
    }
    for list in [&mut resp.enhancement_log.clarifications, &mut resp.enhancement_log.added_details] {
        if list.as_ref().is_some_and(|l| l.is_empty()) {
            *list = None;
        }
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(log: &str) -> String {
        format!(
            r#"{{"overallTitle":"Marketing Email for a SaaS Launch","variants":{{
                "directorsCut":{{"variantTitle":"Copywriter","variantDescription":"Classic direct response.","enhancedPrompt":"You are an expert copywriter..."}},
                "maverick":{{"variantTitle":"Story","variantDescription":"Founder story.","enhancedPrompt":"Write as the founder..."}},
                "catalyst":{{"variantTitle":"Sprint","variantDescription":"Ship today.","enhancedPrompt":"Draft three subject lines..."}}}},
                "enhancementLog":{log}}}"#
        )
    }

    #[test]
    fn empty_note_lists_become_absent() {
        let r = parse(&reply(r#"{"userInput":"write a marketing email","clarifications":[],"addedDetails":["Named the product"]}"#),
            "write a marketing email").unwrap();
        assert!(r.enhancement_log.clarifications.is_none());
        assert_eq!(r.enhancement_log.added_details.as_deref(), Some(&["Named the product".to_string()][..]));
    }

    #[test]
    fn blank_variant_is_malformed() {
        let raw = reply(r#"{"userInput":"x"}"#).replace("Draft three subject lines...", " ");
        let err = parse(&raw, "x").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn model_supplied_correction_is_dropped() {
        let r = parse(&reply(r#"{"userInput":"x","autoCorrectedInput":"Totally different text"}"#), "x").unwrap();
        assert!(r.enhancement_log.auto_corrected_input.is_none());
        assert!(r.enhancement_log.is_empty());
    }

    #[test]
    fn missing_log_is_malformed() {
        let raw = reply("null");
        let err = parse(&raw, "x").unwrap_err();
        assert!(err.is_malformed());
        assert!(err.user_message().contains("valid JSON"));
    }
}
