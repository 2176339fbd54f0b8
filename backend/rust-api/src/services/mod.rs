use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::models::ExamSession;
use crate::services::question_source::{GeminiClient, QuestionSource};

/// One registry slot: the session plus the handle of its countdown task, if
/// any. The handle is taken and aborted on every exit path from Testing.
pub struct SessionEntry {
    pub session: ExamSession,
    pub timer: Option<JoinHandle<()>>,
}

/// Sessions are ephemeral process state: one attempt, one entry, gone on
/// discard. Nothing is persisted.
pub type SessionRegistry = RwLock<HashMap<String, SessionEntry>>;

pub struct AppState {
    pub config: Config,
    pub source: Arc<dyn QuestionSource>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let source = Arc::new(GeminiClient::new(&config));
        Self::with_source(config, source)
    }

    /// Build state around an alternative question source (used by tests).
    pub fn with_source(config: Config, source: Arc<dyn QuestionSource>) -> Self {
        Self {
            config,
            source,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

pub mod generation_service;
pub mod question_source;
pub mod question_validator;
pub mod response_extractor;
pub mod session_service;
pub mod timer_service;
pub mod usage_service;
