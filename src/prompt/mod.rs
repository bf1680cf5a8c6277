use crate::session::Question;

fn clarification_framework() -> &'static str {
r#"Questioning framework (consider each aspect, ask only where the answer is genuinely missing):
- Core objective & purpose: what outcome is wanted, what problem is being solved?
- Scope & scale: a small component or a complete system?
- Platform & medium: website, mobile app, document, service, image, ...?
- Key features & functionality: which capabilities are essential?
- Target audience: who are the primary users or readers?
- Constraints & resources: budget, timeline, technology stack, regulations?
- Desired output: code, design brief, strategy document, list of ideas, ...?"#
}

fn clarification_example() -> &'static str {
r#"Example:
- User prompt: "build me a ride hailing app"
- Inferred context: a plan for a mobile ride-hailing application.
- Output:
[
  {"question": "What is the primary business objective for this ride-hailing service?", "type": "select",
   "suggestions": ["Disrupt the market with a unique feature", "Serve a niche, underserved community", "Offer a low-cost alternative"]},
  {"question": "Besides booking and tracking, which unique feature must be included?", "type": "text"},
  {"question": "Who is the primary target audience?", "type": "select",
   "suggestions": ["General public in urban areas", "Corporate travellers", "University students on a budget"]},
  {"question": "Are there timeline or budget constraints that affect the scope?", "type": "text"}
]"#
}

pub fn system_prompt_autocorrect() -> String {
r#"You are a meticulous copy editor.
Fix spelling, grammar and punctuation in the text the user gives you.
Do NOT add, remove or reinterpret content; keep the wording, tone and language as close to the original as possible.
Return ONLY the corrected text: no quotes, no explanations, no markdown."#
        .to_string()
}

pub fn user_prompt_autocorrect(text: &str) -> String {
    format!("Correct this text:\n{text}")
}

pub fn system_prompt_clarify() -> String {
    format!(
r#"You are a project scope clarification specialist. Prompts you receive are often broad or ambiguous.
Your job is to find the critical information gaps and ask the few precise questions that close them.

Guiding principles:
1. Analyze & infer first. Infer everything that can reasonably be inferred (e.g. "KOT system" means "Kitchen Order Ticket system") and never ask about it.
2. Ask only what is necessary: a question is worth asking only if its answer materially changes the result.
3. If the prompt is already specific enough, return an empty array.

{framework}

{example}

Output format: ONLY a raw JSON array of question objects, never wrapped in markdown or accompanied by prose.
Each object has:
- "question": the question text.
- "type": "text" or "select".
- "suggestions": for "select" questions, 3-5 relevant, smart options."#,
        framework = clarification_framework(),
        example = clarification_example(),
    )
}

pub fn user_prompt_clarify(prompt: &str) -> String {
    format!("Here is the user's prompt to analyze: \"{prompt}\"")
}

pub fn system_prompt_enhance() -> String {
r#"You are an expert AI prompt engineer. Systematically improve the prompt you are given so that a Large Language Model can act on it with maximum clarity, specificity and effectiveness.
The input is either a raw user prompt or a brief that combines a base idea with details the user supplied; synthesize every supplied detail into the result.

Produce THREE strategic variants of the enhanced prompt:
- "directorsCut": the most complete, structured and professional rendition (role, context, step-by-step instructions, constraints, output format).
- "maverick": an unconventional, creative angle that reframes the task to unlock more original output.
- "catalyst": an action-oriented rendition that drives the model toward a concrete, immediately usable deliverable.
Each variant has a short "variantTitle", a one-line "variantDescription" of its strategic angle, and the full "enhancedPrompt".

Also return an "overallTitle" and an "enhancementLog" for transparency:
- "userInput": the exact input you were given.
- "clarifications": one short note per user-supplied detail you incorporated (omit when there were none).
- "addedDetails": short notes on important details you added on your own (omit when there were none).

Return ONLY the JSON object."#
        .to_string()
}

pub fn user_prompt_enhance(prompt: &str) -> String {
    format!("Here is the prompt to enhance: \"{prompt}\"")
}

pub fn system_prompt_feedback() -> String {
r#"You are a prompt quality reviewer. Judge how well the draft prompt would work as an instruction for a Large Language Model.
Rate it "Poor", "Average" or "Good" as "overallRating".
List what already works in "strengths" and the most valuable concrete improvements in "suggestions" (at most three each, one short sentence per item).
Return ONLY the JSON object."#
        .to_string()
}

pub fn user_prompt_feedback(draft: &str) -> String {
    format!("Draft prompt:\n{draft}")
}

/// The brief handed to the enhancer once the questionnaire is answered.
pub fn synthesized_brief(prompt: &str, answered: &[Question]) -> String {
    let mut brief = format!(
        "Base Prompt Idea: \"{prompt}\"\n\nKey Details & Specifications provided by the user:\n"
    );
    for q in answered {
        let label = q.question.trim_end().trim_end_matches('?');
        brief.push_str(&format!(
            "*   **{}:** {}\n",
            label,
            q.answer.as_deref().unwrap_or_default()
        ));
    }
    brief
}

pub fn clarification_note(question: &str, answer: &str) -> String {
    format!("Clarified \"{question}\" with the answer: \"{answer}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::QuestionKind;

    fn answered(id: usize, question: &str, answer: &str) -> Question {
        Question {
            id,
            question: question.into(),
            kind: QuestionKind::Text,
            suggestions: Vec::new(),
            answer: Some(answer.into()),
        }
    }

    #[test]
    fn brief_lists_every_answer_without_question_marks() {
        let qs = vec![
            answered(0, "What is the primary business objective?", "Serve a niche community"),
            answered(1, "Which unique feature must be included?", "Women-only drivers"),
            answered(2, "Who is the primary target audience?", "University students"),
            answered(3, "Are there timeline constraints?", "Launch in 6 months"),
        ];
        let brief = synthesized_brief("build me a ride hailing app", &qs);
        assert!(brief.starts_with("Base Prompt Idea: \"build me a ride hailing app\"\n\n"));
        let lines: Vec<&str> = brief.lines().filter(|l| l.starts_with("*   **")).collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "*   **What is the primary business objective:** Serve a niche community");
        assert!(!brief.contains('?'));
    }

    #[test]
    fn only_trailing_question_marks_are_stripped() {
        let qs = vec![answered(0, "Mobile? Or web??", "Both")];
        let brief = synthesized_brief("app", &qs);
        assert!(brief.contains("*   **Mobile? Or web:** Both\n"));
    }

    #[test]
    fn clarification_note_quotes_both_sides() {
        assert_eq!(
            clarification_note("Who is it for?", "Kids"),
            "Clarified \"Who is it for?\" with the answer: \"Kids\""
        );
    }

    #[test]
    fn enhance_instruction_names_all_variants() {
        let s = system_prompt_enhance();
        for key in ["directorsCut", "maverick", "catalyst", "enhancementLog"] {
            assert!(s.contains(key), "missing {key}");
        }
    }
}
