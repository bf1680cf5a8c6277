use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use uuid::Uuid;

use crate::wire::LlmRequest;

/// Per-session record of every request sent and raw reply received.
pub struct Transcript {
    dir: Option<PathBuf>,
    session: Uuid,
    seq: AtomicUsize,
}

#[derive(Serialize)]
struct Envelope<'a> {
    session: Uuid,
    timestamp: DateTime<Utc>,
    request: &'a LlmRequest,
}

pub struct SavedPaths {
    pub request: PathBuf,
    pub response: PathBuf,
}

impl Transcript {
    pub fn disabled() -> Self {
        Self { dir: None, session: Uuid::nil(), seq: AtomicUsize::new(0) }
    }

    pub fn new(root: &Path, session: Uuid) -> Self {
        Self {
            dir: Some(root.join(session.to_string())),
            session,
            seq: AtomicUsize::new(0),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Never fails the caller: IO problems are logged and dropped.
    pub fn record(&self, req: &LlmRequest, reply: &str) -> Option<SavedPaths> {
        let dir = self.dir.as_ref()?;
        let n = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        match save(dir, self.session, n, req, reply) {
            Ok(saved) => {
                tracing::debug!(stage = %req.stage, path = %saved.request.display(), "transcript saved");
                Some(saved)
            }
            Err(e) => {
                tracing::warn!(stage = %req.stage, error = %e, "could not write transcript");
                None
            }
        }
    }
}

fn save(dir: &Path, session: Uuid, n: usize, req: &LlmRequest, reply: &str) -> anyhow::Result<SavedPaths> {
    fs::create_dir_all(dir)?;
    let stem = format!("{:02}-{}", n, req.stage.slug());

    let request = dir.join(format!("{stem}.request.json"));
    let envelope = Envelope { session, timestamp: Utc::now(), request: req };
    fs::write(&request, to_string_pretty(&envelope)?)?;

    let response = dir.join(format!("{stem}.response.txt"));
    fs::write(&response, reply)?;

    Ok(SavedPaths { request, response })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Stage;

    fn req(stage: Stage) -> LlmRequest {
        LlmRequest {
            stage,
            model: "m".into(),
            system: "s".into(),
            user: "u".into(),
            schema: None,
        }
    }

    #[test]
    fn numbers_files_per_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let t = Transcript::new(tmp.path(), id);

        let first = t.record(&req(Stage::AutoCorrect), "fixed text").unwrap();
        let second = t.record(&req(Stage::Clarify), "[]").unwrap();

        assert!(first.request.ends_with("01-autocorrect.request.json"));
        assert!(second.response.ends_with("02-clarify.response.txt"));
        assert_eq!(fs::read_to_string(&second.response).unwrap(), "[]");

        let envelope: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&first.request).unwrap()).unwrap();
        assert_eq!(envelope["session"], id.to_string());
        assert_eq!(envelope["request"]["stage"], "auto-correct");
    }

    #[test]
    fn envelope_carries_the_session_id_under_any_root() {
        let tmp = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let t = Transcript::new(&tmp.path().join("not-a-uuid"), id);

        let saved = t.record(&req(Stage::Feedback), "{}").unwrap();
        let envelope: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&saved.request).unwrap()).unwrap();
        assert_eq!(envelope["session"], id.to_string());
        assert!(saved.request.starts_with(tmp.path().join("not-a-uuid").join(id.to_string())));
    }

    #[test]
    fn disabled_writes_nothing() {
        let t = Transcript::disabled();
        assert!(t.record(&req(Stage::Enhance), "{}").is_none());
        assert!(t.dir().is_none());
    }
}
