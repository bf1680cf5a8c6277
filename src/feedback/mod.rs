//! Debounced live feedback while the user is drafting.
//!
//! At most one assessment is pending at a time. Every edit aborts the
//! pending task and bumps a generation counter; replies carry the
//! generation they were scheduled under, so anything that lands after a
//! newer edit (or after a questionnaire opened) can be recognised and
//! dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::services::{advisor, PromptServices};
use crate::wire::PromptFeedback;

#[derive(Debug, Clone)]
pub struct FeedbackUpdate {
    pub generation: u64,
    pub draft: String,
    /// `None` when the advisor failed; the view shows nothing then.
    pub feedback: Option<PromptFeedback>,
}

pub struct LiveFeedback {
    services: Arc<dyn PromptServices>,
    delay: Duration,
    min_chars: usize,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<FeedbackUpdate>,
}

impl LiveFeedback {
    pub fn new(
        services: Arc<dyn PromptServices>,
        delay: Duration,
        min_chars: usize,
    ) -> (Self, mpsc::UnboundedReceiver<FeedbackUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let live = Self {
            services,
            delay,
            min_chars,
            generation: 0,
            pending: None,
            tx,
        };
        (live, rx)
    }

    /// Restart the timer for `draft`. Returns whether an assessment was
    /// scheduled; short drafts and active questionnaires schedule nothing.
    pub fn on_input(&mut self, draft: &str, questionnaire_active: bool) -> bool {
        self.cancel();
        if questionnaire_active || !advisor::worth_assessing(draft, self.min_chars) {
            return false;
        }

        let generation = self.generation;
        let services = Arc::clone(&self.services);
        let tx = self.tx.clone();
        let delay = self.delay;
        let draft = draft.to_string();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let feedback = match services.assess(&draft).await {
                Ok(fb) => Some(fb),
                Err(e) => {
                    tracing::warn!(error = %e, "prompt feedback unavailable");
                    None
                }
            };
            // receiver gone means the session ended
            let _ = tx.send(FeedbackUpdate { generation, draft, feedback });
        }));
        true
    }

    /// Drops pending and in-flight work, e.g. when a questionnaire opens.
    pub fn suspend(&mut self) {
        if self.has_pending() {
            tracing::debug!(generation = self.generation, "dropping pending feedback");
        }
        self.cancel();
    }

    /// Only the newest reply, outside a questionnaire, may be shown.
    pub fn is_fresh(&self, update: &FeedbackUpdate, questionnaire_active: bool) -> bool {
        !questionnaire_active && update.generation == self.generation
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
    }
}

impl Drop for LiveFeedback {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Failure, FakeServices};
    use crate::wire::Stage;

    fn live(fake: &Arc<FakeServices>) -> (LiveFeedback, mpsc::UnboundedReceiver<FeedbackUpdate>) {
        LiveFeedback::new(fake.clone(), Duration::from_millis(1000), 15)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_into_one_call() {
        let fake = Arc::new(FakeServices::default());
        let (mut live, mut rx) = live(&fake);

        for draft in ["write a story ab", "write a story abo", "write a story about a cat"] {
            assert!(live.on_input(draft, false));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert!(fake.calls_to(Stage::Feedback).is_empty());

        let update = rx.recv().await.unwrap();
        assert!(live.is_fresh(&update, false));
        assert_eq!(update.draft, "write a story about a cat");
        assert!(update.feedback.is_some());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(fake.calls_to(Stage::Feedback), vec!["write a story about a cat"]);
    }

    #[tokio::test(start_paused = true)]
    async fn short_drafts_are_not_assessed() {
        let fake = Arc::new(FakeServices::default());
        let (mut live, mut rx) = live(&fake);

        assert!(!live.on_input("   write a poem   ", false));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
        assert!(fake.calls.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shortening_the_draft_cancels_the_pending_call() {
        let fake = Arc::new(FakeServices::default());
        let (mut live, mut rx) = live(&fake);

        assert!(live.on_input("write a story about a cat", false));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!live.on_input("write", false));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
        assert!(!live.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_after_questionnaire_opened_is_stale() {
        let fake = Arc::new(FakeServices::default());
        let (mut live, mut rx) = live(&fake);

        live.on_input("build me a ride hailing app", false);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        live.suspend();

        let update = rx.recv().await.unwrap();
        assert!(!live.is_fresh(&update, false));
        assert!(!live.is_fresh(&update, true));
    }

    #[tokio::test(start_paused = true)]
    async fn questionnaire_blocks_scheduling() {
        let fake = Arc::new(FakeServices::default());
        let (mut live, _rx) = live(&fake);
        assert!(!live.on_input("build me a ride hailing app", true));
        assert!(!live.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn advisor_failure_yields_empty_feedback() {
        let fake = Arc::new(FakeServices { feedback: Err(Failure::Unreachable), ..Default::default() });
        let (mut live, mut rx) = live(&fake);

        live.on_input("write a marketing email for my app", false);
        let update = rx.recv().await.unwrap();
        assert!(update.feedback.is_none());
        assert!(live.is_fresh(&update, false));
    }
}
