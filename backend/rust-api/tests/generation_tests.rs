use axum::http::StatusCode;

mod common;

use common::{
    create_session, create_session_body, create_test_app, question_record, questions_payload,
    ScriptedSource,
};
use examforge_api::services::generation_service::GenerationError;

#[tokio::test]
async fn prose_wrapped_payload_produces_a_session() {
    let payload = format!(
        "Here are your questions: ```json\n[{}]\n``` Good luck!",
        question_record(0, 2)
    );
    let source = ScriptedSource::with_payload(payload);
    let app = create_test_app(source);

    let (status, body) = create_session(&app, create_session_body("quick", false, "free", 0)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["question_count"], 1);
    assert_eq!(body["view"], "testing");
}

#[tokio::test]
async fn truncated_payload_is_a_parse_error() {
    let source = ScriptedSource::with_payload("[{\"question\": \"cut off".to_string());
    let app = create_test_app(source);

    let (status, body) = create_session(&app, create_session_body("quick", false, "free", 0)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "parse_error");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn payload_with_only_malformed_records_is_a_validation_error() {
    // one record with four options: parses fine, survives nothing
    let mut record = question_record(0, 1);
    record["options"] = serde_json::json!(["a", "b", "c", "d"]);
    let source = ScriptedSource::with_payload(format!("[{}]", record));
    let app = create_test_app(source);

    let (status, body) = create_session(&app, create_session_body("quick", false, "free", 0)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn malformed_records_are_dropped_but_good_ones_survive() {
    let mut bad = question_record(1, 0);
    bad["correctAnswerIndex"] = serde_json::json!(9);
    let payload = format!("[{},{}]", question_record(0, 0), bad);
    let source = ScriptedSource::with_payload(payload);
    let app = create_test_app(source);

    let (status, body) = create_session(&app, create_session_body("quick", false, "free", 0)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["question_count"], 1);
}

#[tokio::test]
async fn free_tier_request_is_capped_to_remaining_allowance() {
    let source = ScriptedSource::with_payload(questions_payload(&[0, 1]));
    let app = create_test_app(source.clone());

    let (status, body) =
        create_session(&app, create_session_body("quick", false, "free", 18)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["question_count"], 2);

    let requests = source.recorded_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].count, 2);
    assert!(requests[0].prompt.contains("2 MCQ questions"));
}

#[tokio::test]
async fn exhausted_free_allowance_is_plan_restricted() {
    let source = ScriptedSource::with_payload(questions_payload(&[0]));
    let app = create_test_app(source.clone());

    let (status, body) =
        create_session(&app, create_session_body("quick", false, "free", 20)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "plan_restricted");
    assert_eq!(body["retryable"], false);
    // the collaborator is never invoked
    assert!(source.recorded_requests().is_empty());
}

#[tokio::test]
async fn free_tier_cannot_start_past_paper_sessions() {
    let source = ScriptedSource::with_payload(questions_payload(&[0]));
    let app = create_test_app(source.clone());

    let (status, body) = create_session(&app, create_session_body("past", false, "free", 0)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "plan_restricted");
    assert!(source.recorded_requests().is_empty());
}

#[tokio::test]
async fn past_mode_requests_a_full_paper_count() {
    let source = ScriptedSource::with_payload(questions_payload(&[0, 1, 2]));
    let app = create_test_app(source.clone());

    let (status, _) = create_session(&app, create_session_body("past", false, "plus", 0)).await;

    assert_eq!(status, StatusCode::CREATED);
    let requests = source.recorded_requests();
    assert_eq!(requests[0].count, 50);
    assert!(requests[0].system_directive.contains("past papers"));
}

#[tokio::test]
async fn topic_mode_pins_the_directive_to_the_topic() {
    let source = ScriptedSource::with_payload(questions_payload(&[0]));
    let app = create_test_app(source.clone());

    let (status, _) = create_session(&app, create_session_body("topic", false, "pro", 0)).await;

    assert_eq!(status, StatusCode::CREATED);
    let requests = source.recorded_requests();
    assert!(requests[0].system_directive.contains("\"Mechanics\""));
}

#[tokio::test]
async fn network_failure_is_surfaced_with_the_collaborator_message() {
    let source = ScriptedSource::with_responses(vec![Err(GenerationError::Network(
        "upstream returned 503".to_string(),
    ))]);
    let app = create_test_app(source);

    let (status, body) = create_session(&app, create_session_body("quick", false, "free", 0)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "network_error");
    assert_eq!(body["retryable"], true);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("upstream returned 503"));
}

#[tokio::test]
async fn empty_response_is_retryable() {
    let source = ScriptedSource::with_responses(vec![Err(GenerationError::EmptyResponse)]);
    let app = create_test_app(source);

    let (status, body) = create_session(&app, create_session_body("quick", false, "free", 0)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "empty_response");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn unconfigured_backend_is_service_unavailable() {
    let source = ScriptedSource::with_responses(vec![Err(GenerationError::Configuration(
        "generation API key is not set".to_string(),
    ))]);
    let app = create_test_app(source);

    let (status, body) = create_session(&app, create_session_body("quick", false, "free", 0)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "configuration_error");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn blank_subject_is_rejected_before_generation() {
    let source = ScriptedSource::with_payload(questions_payload(&[0]));
    let app = create_test_app(source.clone());

    let mut body = create_session_body("quick", false, "free", 0);
    body["subject"] = serde_json::json!("");
    let (status, _) = create_session(&app, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(source.recorded_requests().is_empty());
}
