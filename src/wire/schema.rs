//! Declared output shapes, in plain JSON-Schema vocabulary. Provider
//! adapters translate these into whatever dialect their API expects.

use serde_json::{json, Value};

fn variant() -> Value {
    json!({
        "type": "object",
        "properties": {
            "variantTitle": { "type": "string", "description": "Short name for this strategic angle." },
            "variantDescription": { "type": "string", "description": "One line describing the angle." },
            "enhancedPrompt": { "type": "string", "description": "The full enhanced prompt text." }
        },
        "required": ["variantTitle", "variantDescription", "enhancedPrompt"]
    })
}

pub fn enhanced_prompt() -> Value {
    json!({
        "type": "object",
        "properties": {
            "overallTitle": { "type": "string", "description": "A concise, descriptive title for the enhancement." },
            "variants": {
                "type": "object",
                "properties": {
                    "directorsCut": variant(),
                    "maverick": variant(),
                    "catalyst": variant()
                },
                "required": ["directorsCut", "maverick", "catalyst"]
            },
            "enhancementLog": {
                "type": "object",
                "properties": {
                    "userInput": { "type": "string" },
                    "autoCorrectedInput": { "type": "string" },
                    "clarifications": { "type": "array", "items": { "type": "string" } },
                    "addedDetails": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["userInput"]
            }
        },
        "required": ["overallTitle", "variants", "enhancementLog"]
    })
}

pub fn clarification_questions() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "question": { "type": "string" },
                "type": { "type": "string", "enum": ["text", "select"] },
                "suggestions": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["question", "type"]
        }
    })
}

pub fn prompt_feedback() -> Value {
    json!({
        "type": "object",
        "properties": {
            "overallRating": { "type": "string", "enum": ["Poor", "Average", "Good"] },
            "strengths": { "type": "array", "items": { "type": "string" } },
            "suggestions": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["overallRating", "strengths", "suggestions"]
    })
}
