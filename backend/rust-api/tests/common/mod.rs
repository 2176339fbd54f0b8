#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use examforge_api::config::Config;
use examforge_api::create_router;
use examforge_api::services::generation_service::GenerationError;
use examforge_api::services::question_source::{GenerationRequest, QuestionSource};
use examforge_api::services::AppState;

/// Question source that replays a scripted sequence of responses and records
/// every request it receives.
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedSource {
    pub fn with_responses(responses: Vec<Result<String, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_payload(payload: String) -> Arc<Self> {
        Self::with_responses(vec![Ok(payload)])
    }

    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionSource for ScriptedSource {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationError::EmptyResponse))
    }

    fn is_configured(&self) -> bool {
        true
    }
}

pub fn test_config() -> Config {
    Config {
        generation_api_url: "http://127.0.0.1:0".to_string(),
        generation_api_key: Some("test-key".to_string()),
        generation_model: "test-model".to_string(),
        generation_timeout_secs: 5,
    }
}

pub fn create_test_app(source: Arc<ScriptedSource>) -> Router {
    create_router(Arc::new(AppState::with_source(test_config(), source)))
}

/// A well-formed record in the collaborator's wire shape.
pub fn question_record(index: usize, correct: usize) -> Value {
    json!({
        "question": format!("Question number {}?", index + 1),
        "options": ["Option A", "Option B", "Option C", "Option D", "Option E"],
        "correctAnswerIndex": correct,
        "explanation": format!("Explanation for question {}.", index + 1),
    })
}

/// JSON array payload with the given correct-answer indices.
pub fn questions_payload(correct: &[usize]) -> String {
    let records: Vec<Value> = correct
        .iter()
        .enumerate()
        .map(|(index, c)| question_record(index, *c))
        .collect();
    serde_json::to_string(&records).unwrap()
}

pub fn create_session_body(mode: &str, timed: bool, plan: &str, questions_used: u32) -> Value {
    json!({
        "subject": "Physics",
        "topic": "Mechanics",
        "medium": "english",
        "mode": mode,
        "timed": timed,
        "account": {
            "plan": plan,
            "usage": {
                "questions_answered_this_period": questions_used,
                "papers_answered_this_period": 0,
            }
        }
    })
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn create_session(app: &Router, body: Value) -> (StatusCode, Value) {
    send_json(app, "POST", "/api/v1/sessions/", Some(body)).await
}
