use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::metrics::{ANSWERS_RECORDED_TOTAL, SESSIONS_ACTIVE, SESSIONS_TOTAL};
use crate::models::{
    CreateSessionRequest, ExamSession, SessionSnapshot, UsageDelta, ViewState,
};
use crate::services::generation_service::{GenerationError, GenerationService};
use crate::services::{timer_service, usage_service, AppState, SessionEntry};

/// Drives the practice-attempt lifecycle against the in-memory session
/// registry. A session is exclusively owned by its attempt and lives until
/// the caller discards it; nothing here persists beyond the process.
pub struct SessionService {
    state: Arc<AppState>,
}

impl SessionService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<SessionSnapshot, GenerationError> {
        // Counters are normalized before any entitlement math reads them.
        let mut account = request.account.clone();
        account.usage.roll_over_if_new_period(Utc::now());

        let generation = GenerationService::new(self.state.source.clone());
        let questions = generation.request_questions(&request, &account).await?;

        let session_id = Uuid::new_v4().to_string();
        let session = ExamSession::new(
            session_id.clone(),
            request.subject,
            request.topic,
            request.mode,
            request.medium,
            request.timed,
            account,
            questions,
            seconds_per_question(),
            full_paper_threshold(),
        );
        let timed = session.timed;
        let snapshot = session.snapshot();

        {
            let mut sessions = self.state.sessions.write().await;
            let timer = timed
                .then(|| timer_service::spawn_countdown(self.state.clone(), session_id.clone()));
            sessions.insert(session_id.clone(), SessionEntry { session, timer });
        }

        SESSIONS_TOTAL.with_label_values(&["created"]).inc();
        SESSIONS_ACTIVE.inc();
        tracing::info!(session_id = %session_id, timed, "Session created");

        Ok(snapshot)
    }

    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let sessions = self.state.sessions.read().await;
        sessions.get(session_id).map(|entry| entry.session.snapshot())
    }

    pub async fn record_answer(
        &self,
        session_id: &str,
        option_index: usize,
    ) -> Option<SessionSnapshot> {
        let mut sessions = self.state.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        entry.session.record_answer(option_index);
        ANSWERS_RECORDED_TOTAL.inc();
        Some(entry.session.snapshot())
    }

    pub async fn advance(&self, session_id: &str) -> Option<SessionSnapshot> {
        let mut sessions = self.state.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        if let Some(delta) = entry.session.advance() {
            settle_locked(entry, delta);
        }
        Some(entry.session.snapshot())
    }

    pub async fn previous(&self, session_id: &str) -> Option<SessionSnapshot> {
        let mut sessions = self.state.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        entry.session.previous();
        Some(entry.session.snapshot())
    }

    pub async fn submit(&self, session_id: &str) -> Option<SessionSnapshot> {
        let mut sessions = self.state.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        if let Some(delta) = entry.session.submit() {
            settle_locked(entry, delta);
        }
        Some(entry.session.snapshot())
    }

    pub async fn open_review(&self, session_id: &str) -> Option<SessionSnapshot> {
        let mut sessions = self.state.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        entry.session.open_review();
        Some(entry.session.snapshot())
    }

    /// Removes the session from the registry, stopping its timer. Valid from
    /// any state.
    pub async fn discard(&self, session_id: &str) -> bool {
        let mut sessions = self.state.sessions.write().await;
        let Some(mut entry) = sessions.remove(session_id) else {
            return false;
        };
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }
        if entry.session.view() == ViewState::Testing {
            SESSIONS_TOTAL.with_label_values(&["abandoned"]).inc();
        }
        SESSIONS_ACTIVE.dec();
        tracing::info!(session_id = %session_id, "Session discarded");
        true
    }
}

/// Applies the settlement for a session that just left Testing: usage is
/// recorded exactly once (submit idempotence upstream guarantees a single
/// delta) and the countdown is stopped on this exit path.
pub(crate) fn settle_locked(entry: &mut SessionEntry, delta: UsageDelta) {
    usage_service::apply_usage(&mut entry.session.account.usage, delta, Utc::now());
    if let Some(timer) = entry.timer.take() {
        timer.abort();
    }
    let status = if entry.session.is_timeout() {
        "expired"
    } else {
        "completed"
    };
    SESSIONS_TOTAL.with_label_values(&[status]).inc();
    tracing::info!(
        session_id = %entry.session.id,
        score = entry.session.score(),
        status,
        "Session settled"
    );
}

fn seconds_per_question() -> u32 {
    std::env::var("SECONDS_PER_QUESTION")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(72) // reference full paper: 60 minutes / 50 questions
}

fn full_paper_threshold() -> u32 {
    std::env::var("FULL_PAPER_THRESHOLD")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(25)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn policy_constants_default_sanely() {
        std::env::remove_var("SECONDS_PER_QUESTION");
        std::env::remove_var("FULL_PAPER_THRESHOLD");
        assert_eq!(seconds_per_question(), 72);
        assert_eq!(full_paper_threshold(), 25);
    }

    #[test]
    #[serial]
    fn policy_constants_are_env_tunable() {
        std::env::set_var("SECONDS_PER_QUESTION", "90");
        std::env::set_var("FULL_PAPER_THRESHOLD", "50");
        assert_eq!(seconds_per_question(), 90);
        assert_eq!(full_paper_threshold(), 50);
        std::env::remove_var("SECONDS_PER_QUESTION");
        std::env::remove_var("FULL_PAPER_THRESHOLD");
    }
}
