//! End-to-end interview flow over file-backed storage.

use std::sync::Arc;

use chatform::adapters::ai::MockAIProvider;
use chatform::adapters::storage::{FileSessionRepository, InMemoryFormRepository, JsonlRecordSink};
use chatform::application::{InterviewError, Interviewer};
use chatform::domain::form::FieldSpec;
use chatform::domain::interview::{
    ElicitationConfig, ElicitationEngine, ExtractionConfig, ExtractionEngine, FieldValue,
    SessionStatus, COMPLETION_SENTENCE,
};
use chatform::ports::{AIProvider, SessionRepository};
use tempfile::TempDir;

fn interviewer(
    provider: MockAIProvider,
    sessions: Arc<FileSessionRepository>,
    records: Arc<JsonlRecordSink>,
) -> Interviewer {
    let provider: Arc<dyn AIProvider> = Arc::new(provider);
    Interviewer::new(
        Arc::new(InMemoryFormRepository::new()),
        sessions,
        records,
        ElicitationEngine::new(provider.clone(), ElicitationConfig::default()),
        ExtractionEngine::new(provider, ExtractionConfig::default()),
    )
}

fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::choice("Mood", "How the user feels today", ["Low", "Fine", "Great"]),
        FieldSpec::number("HoursSlept", "Hours slept last night"),
        FieldSpec::text("Notes", "Anything else worth mentioning"),
    ]
}

#[tokio::test]
async fn interview_runs_to_a_stored_record() {
    let dir = TempDir::new().unwrap();
    let sessions = Arc::new(FileSessionRepository::new(dir.path().join("sessions")));
    let records = Arc::new(JsonlRecordSink::new(dir.path().join("records.jsonl")));

    let provider = MockAIProvider::new()
        .with_response("Hi! How are you feeling today?")
        .with_response("Glad to hear. Roughly how many hours did you sleep?")
        .with_response(format!("Got it, thank you. {}", COMPLETION_SENTENCE))
        .with_response(r#"{"Mood": "Fine", "HoursSlept": "7", "Notes": ["coffee", "late dinner"]}"#);
    let interviewer = interviewer(provider.clone(), sessions.clone(), records.clone());

    let form = interviewer.register_form("Sleep diary", fields()).await.unwrap();
    let opening = interviewer.start_session(form.id()).await.unwrap();
    assert_eq!(opening.status, SessionStatus::Collecting);
    let id = opening.session_id;

    let turn = interviewer.submit_message(id, "Pretty fine").await.unwrap();
    assert!(!turn.is_complete());

    let turn = interviewer
        .submit_message(id, "About seven, had coffee and a late dinner")
        .await
        .unwrap();
    assert!(turn.is_complete());
    assert!(turn.extraction_error.is_none());

    let result = turn.result.unwrap();
    assert_eq!(result.get("Mood"), Some(&FieldValue::text("Fine")));
    assert_eq!(result.get("HoursSlept"), Some(&FieldValue::from(7_i64)));
    assert_eq!(
        result.get("Notes"),
        Some(&FieldValue::text(r#"["coffee","late dinner"]"#))
    );

    // The extraction call sees only the transcript, not the interviewer directive.
    let calls = provider.get_calls();
    assert_eq!(calls.len(), 4);
    let extraction_call = &calls[3];
    assert_eq!(extraction_call.messages.len(), 1);
    assert!(extraction_call.messages[0].content.contains("User: Pretty fine"));

    let stored = records.read_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].session_id, id);
    assert_eq!(stored[0].values, result);

    let reloaded = sessions.find(id).await.unwrap().unwrap();
    assert_eq!(reloaded.status(), SessionStatus::Complete);
    assert_eq!(reloaded.conversation().len(), 5);
    assert_eq!(reloaded.result(), Some(&result));
}

#[tokio::test]
async fn sessions_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let sessions = Arc::new(FileSessionRepository::new(dir.path().join("sessions")));
    let records = Arc::new(JsonlRecordSink::new(dir.path().join("records.jsonl")));

    let first = interviewer(
        MockAIProvider::new().with_response("How are you feeling today?"),
        sessions.clone(),
        records.clone(),
    );
    let form = first.register_form("Sleep diary", fields()).await.unwrap();
    let id = first.start_session(form.id()).await.unwrap().session_id;
    drop(first);

    let second = interviewer(
        MockAIProvider::new()
            .with_response(COMPLETION_SENTENCE)
            .with_response(r#"{"Mood": "Great", "HoursSlept": 9, "Notes": ""}"#),
        Arc::new(FileSessionRepository::new(dir.path().join("sessions"))),
        records.clone(),
    );

    let turn = second
        .submit_message(id, "Great, nine hours, nothing else")
        .await
        .unwrap();
    assert!(turn.is_complete());
    assert_eq!(records.read_all().await.unwrap().len(), 1);

    second.delete_session(id).await.unwrap();
    assert!(records.read_all().await.unwrap().is_empty());
    assert!(matches!(
        second.get_session(id).await,
        Err(InterviewError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn failed_extraction_can_be_retried() {
    let dir = TempDir::new().unwrap();
    let sessions = Arc::new(FileSessionRepository::new(dir.path().join("sessions")));
    let records = Arc::new(JsonlRecordSink::new(dir.path().join("records.jsonl")));

    let interviewer = interviewer(
        MockAIProvider::new()
            .with_response("How are you feeling today?")
            .with_response(COMPLETION_SENTENCE)
            .with_response("```json\n{\"Mood\": \"Low\"}\n```")
            .with_response(r#"{"Mood": "Low", "HoursSlept": 4.5}"#),
        sessions,
        records.clone(),
    );
    let form = interviewer.register_form("Sleep diary", fields()).await.unwrap();
    let id = interviewer.start_session(form.id()).await.unwrap().session_id;

    let turn = interviewer.submit_message(id, "Low, 4.5 hours").await.unwrap();
    assert!(turn.is_complete());
    assert!(turn.result.is_none());
    assert!(turn.extraction_error.is_some());
    assert!(records.read_all().await.unwrap().is_empty());

    let result = interviewer.retry_extraction(id).await.unwrap();
    assert_eq!(result.get("Mood"), Some(&FieldValue::text("Low")));
    assert_eq!(result.get("HoursSlept").and_then(FieldValue::as_f64), Some(4.5));
    // Absent fields come back as the empty value.
    assert_eq!(result.get("Notes"), Some(&FieldValue::empty()));
    assert_eq!(records.read_all().await.unwrap().len(), 1);
}
