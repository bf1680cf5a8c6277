//! The enhancement workflow: one state object, changed only through
//! `submit`, `submit_answers` and `switch_mode`.

use std::sync::Arc;

use serde::Serialize;

use crate::cli::WorkflowMode;
use crate::errors::CopilotError;
use crate::prompt;
use crate::services::PromptServices;
use crate::wire::{EnhancedPromptResponse, QuestionDraft, QuestionKind};

pub const MSG_DIRECT: &str = "Our AI is working its magic to enhance your prompt...";
pub const MSG_CORRECTING: &str = "Correcting spelling and grammar...";
pub const MSG_ANALYZING: &str = "AI is analyzing your prompt and generating clarifying questions...";
pub const MSG_NO_CLARIFICATION: &str = "No clarifications needed. Proceeding to enhance...";
pub const MSG_SYNTHESIZING: &str = "Synthesizing your answers and crafting the final prompt...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Position in the questionnaire, assigned when it was created.
    pub id: usize,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub suggestions: Vec<String>,
    pub answer: Option<String>,
}

impl Question {
    fn numbered(id: usize, draft: QuestionDraft) -> Self {
        Self {
            id,
            question: draft.question,
            kind: draft.kind,
            suggestions: draft.suggestions.unwrap_or_default(),
            answer: None,
        }
    }

    /// Select questions without suggestions are asked as free text.
    pub fn is_choice(&self) -> bool {
        self.kind == QuestionKind::Select && !self.suggestions.is_empty()
    }

    /// Pre-filled answer: the first suggestion of a choice question.
    pub fn default_answer(&self) -> Option<&str> {
        self.is_choice().then(|| self.suggestions[0].as_str())
    }

    pub fn is_answered(&self) -> bool {
        self.answer.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

/// Receives loading transitions, e.g. to drive a spinner.
pub trait SessionObserver: Send {
    fn loading(&self, _message: &str) {}
    fn idle(&self) {}
}

pub struct Quiet;

impl SessionObserver for Quiet {}

enum Step {
    Enhanced(EnhancedPromptResponse),
    Questionnaire(Vec<Question>),
}

pub struct Session {
    services: Arc<dyn PromptServices>,
    observer: Box<dyn SessionObserver>,
    mode: WorkflowMode,
    prompt: String,
    corrected: Option<String>,
    result: Option<EnhancedPromptResponse>,
    loading: bool,
    loading_message: String,
    error: Option<String>,
    questions: Option<Vec<Question>>,
}

impl Session {
    pub fn new(services: Arc<dyn PromptServices>, mode: WorkflowMode) -> Self {
        Self {
            services,
            observer: Box::new(Quiet),
            mode,
            prompt: String::new(),
            corrected: None,
            result: None,
            loading: false,
            loading_message: String::new(),
            error: None,
            questions: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn mode(&self) -> WorkflowMode {
        self.mode
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn result(&self) -> Option<&EnhancedPromptResponse> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Empty whenever the session is idle.
    pub fn loading_message(&self) -> &str {
        &self.loading_message
    }

    pub fn questions(&self) -> Option<&[Question]> {
        self.questions.as_deref()
    }

    pub fn questionnaire_active(&self) -> bool {
        self.mode == WorkflowMode::Guided && self.questions.as_ref().is_some_and(|q| !q.is_empty())
    }

    /// The draft is read-only while a questionnaire waits for answers.
    pub fn edit_prompt(&mut self, text: impl Into<String>) -> bool {
        if self.questionnaire_active() {
            return false;
        }
        self.prompt = text.into();
        true
    }

    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.questionnaire_active() && !self.prompt.trim().is_empty()
    }

    /// True when every active question carries a non-empty answer.
    pub fn answers_complete(answered: &[Question], expected: usize) -> bool {
        answered.len() == expected && answered.iter().filter(|q| q.is_answered()).count() == expected
    }

    pub async fn submit(&mut self, text: &str) {
        if self.loading || self.questionnaire_active() {
            tracing::warn!("submit ignored: session is busy or waiting for answers");
            return;
        }
        if text.trim().is_empty() {
            self.fail(CopilotError::EmptyPrompt);
            return;
        }

        self.error = None;
        self.result = None;
        self.questions = None;
        self.corrected = None;
        self.prompt = text.to_string();

        let outcome = match self.mode {
            WorkflowMode::Direct => self.run_direct(text).await,
            WorkflowMode::Guided => self.run_guided(text).await,
        };
        self.finish_loading();

        match outcome {
            Ok(Step::Enhanced(resp)) => self.result = Some(resp),
            Ok(Step::Questionnaire(questions)) => {
                tracing::info!(count = questions.len(), "questionnaire active");
                self.questions = Some(questions);
            }
            Err(e) => self.fail(e),
        }
    }

    async fn run_direct(&mut self, text: &str) -> Result<Step, CopilotError> {
        let services = Arc::clone(&self.services);
        self.start_loading(MSG_DIRECT);
        Ok(Step::Enhanced(services.enhance(text).await?))
    }

    async fn run_guided(&mut self, text: &str) -> Result<Step, CopilotError> {
        let services = Arc::clone(&self.services);

        self.start_loading(MSG_CORRECTING);
        let corrected = match services.auto_correct(text).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "auto-correction failed, using the prompt as typed");
                text.to_string()
            }
        };
        if corrected != text {
            self.corrected = Some(corrected.clone());
        }

        self.set_loading_message(MSG_ANALYZING);
        let drafts = services.clarification_questions(&corrected).await?;
        if drafts.is_empty() {
            self.set_loading_message(MSG_NO_CLARIFICATION);
            let resp = services.enhance(&corrected).await?;
            return Ok(Step::Enhanced(self.annotate(resp)));
        }

        Ok(Step::Questionnaire(
            drafts
                .into_iter()
                .enumerate()
                .map(|(id, d)| Question::numbered(id, d))
                .collect(),
        ))
    }

    pub async fn submit_answers(&mut self, mut answered: Vec<Question>) {
        if self.loading {
            tracing::warn!("answers ignored: session is busy");
            return;
        }
        let total = match self.questions.as_ref() {
            Some(q) if self.questionnaire_active() => q.len(),
            _ => {
                self.fail(CopilotError::NoQuestionnaire);
                return;
            }
        };
        if !Self::answers_complete(&answered, total) {
            let done = answered.iter().filter(|q| q.is_answered()).count();
            self.error = Some(CopilotError::IncompleteAnswers { answered: done, total }.user_message());
            return;
        }
        answered.sort_by_key(|q| q.id);

        let services = Arc::clone(&self.services);
        self.error = None;
        self.questions = None;
        self.start_loading(MSG_SYNTHESIZING);

        let brief = prompt::synthesized_brief(&self.prompt, &answered);
        let outcome = services.enhance(&brief).await;
        self.finish_loading();

        match outcome {
            Ok(mut resp) => {
                if self.mode == WorkflowMode::Guided && !resp.enhancement_log.has_clarifications() {
                    resp.enhancement_log.clarifications = Some(
                        answered
                            .iter()
                            .map(|q| prompt::clarification_note(&q.question, q.answer.as_deref().unwrap_or_default()))
                            .collect(),
                    );
                }
                self.result = Some(self.annotate(resp));
            }
            Err(e) => self.fail(e),
        }
    }

    /// Any switch discards in-progress work.
    pub fn switch_mode(&mut self, mode: WorkflowMode) {
        self.mode = mode;
        self.prompt.clear();
        self.corrected = None;
        self.result = None;
        self.error = None;
        self.questions = None;
        self.finish_loading();
    }

    /// Closes a questionnaire the user walked away from. The typed prompt
    /// stays so it can be resubmitted.
    pub fn abandon_questionnaire(&mut self) {
        if self.questions.take().is_some() {
            tracing::info!("questionnaire abandoned");
        }
        self.corrected = None;
        self.finish_loading();
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            WorkflowMode::Direct => WorkflowMode::Guided,
            WorkflowMode::Guided => WorkflowMode::Direct,
        };
        self.switch_mode(next);
    }

    /// Guided results show what the user typed and what the corrector made of it.
    fn annotate(&self, mut resp: EnhancedPromptResponse) -> EnhancedPromptResponse {
        let log = &mut resp.enhancement_log;
        log.user_input = self.prompt.clone();
        // only a correction that changed the text is reported
        log.auto_corrected_input = self.corrected.clone();
        resp
    }

    fn fail(&mut self, err: CopilotError) {
        tracing::error!(error = %err, malformed = err.is_malformed(), "workflow step failed");
        self.result = None;
        self.error = Some(err.user_message());
    }

    fn start_loading(&mut self, message: &str) {
        self.loading = true;
        self.set_loading_message(message);
    }

    fn set_loading_message(&mut self, message: &str) {
        self.loading_message = message.to_string();
        self.observer.loading(message);
    }

    fn finish_loading(&mut self) {
        let was_loading = self.loading;
        self.loading = false;
        self.loading_message.clear();
        if was_loading {
            self.observer.idle();
        }
    }
}
