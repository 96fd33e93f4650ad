use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;
use tower::ServiceExt;

use adabot::config::AppConfig;
use adabot::services::ai::{LlmProvider, Message};
use adabot::state::AppState;
use adabot::store::CsvStore;

// ── Mock Providers ──

struct MockLlm {
    calls: Arc<AtomicUsize>,
}

impl MockLlm {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { calls: Arc::clone(&calls) }, calls)
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(&self, _system_prompt: &str, _messages: &[Message]) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Here is some general guidance on insurance coverage.".to_string())
    }
}

struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn chat(&self, _system_prompt: &str, _messages: &[Message]) -> anyhow::Result<String> {
        anyhow::bail!("quota exceeded")
    }
}

// ── Helpers ──

fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        port: 5005,
        llm_provider: "groq".to_string(),
        groq_api_key: "test-key".to_string(),
        groq_model: "test-model".to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        ollama_model: "llama3.2".to_string(),
        interactions_path: dir
            .path()
            .join("chatbot_data.csv")
            .to_string_lossy()
            .to_string(),
        appointments_path: dir
            .path()
            .join("appointments.csv")
            .to_string_lossy()
            .to_string(),
        max_response_tokens: 300,
        max_session_tokens: 2000,
    }
}

fn test_state(llm: Box<dyn LlmProvider>, dir: &TempDir) -> Arc<AppState> {
    let config = test_config(dir);
    let store = CsvStore::new(&config.interactions_path, &config.appointments_path);
    Arc::new(AppState {
        config,
        llm,
        store,
        sessions: Mutex::new(HashMap::new()),
        rng: Mutex::new(StdRng::seed_from_u64(42)),
    })
}

fn app(state: Arc<AppState>) -> Router {
    adabot::router(state)
}

async fn post_chat(
    router: Router,
    payload: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let res = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

async fn chat_turn(state: &Arc<AppState>, session_id: &str, message: &str) -> serde_json::Value {
    let (status, json) = post_chat(
        app(Arc::clone(state)),
        serde_json::json!({ "message": message, "session_id": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "turn failed: {json}");
    json
}

// ── Chat action ──

#[tokio::test]
async fn test_missing_message_is_400() {
    let dir = TempDir::new().unwrap();
    let (llm, _) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    let (status, json) = post_chat(app(state), serde_json::json!({ "action": "chat" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No message provided");
}

#[tokio::test]
async fn test_introduction_and_insurance_selection() {
    let dir = TempDir::new().unwrap();
    let (llm, calls) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    let json = chat_turn(&state, "s1", "Hi, I'm Kofi").await;
    assert_eq!(json["intent"], "greeting");
    assert_eq!(json["state"], "understanding_need");
    assert!(json["response"].as_str().unwrap().contains("Kofi"));

    let json = chat_turn(&state, "s1", "I want Health Insurance").await;
    assert_eq!(json["state"], "insurance_discussion");
    assert!(json["response"].as_str().unwrap().contains("Health Insurance"));

    // Both turns were rule-handled; the LLM was never consulted.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_farewell_is_canned_and_terminal() {
    let dir = TempDir::new().unwrap();
    let (llm, calls) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    let json = chat_turn(&state, "s1", "bye").await;
    assert_eq!(json["intent"], "farewell");
    assert_eq!(json["state"], "farewell");

    let farewell_lines = [
        "Goodbye! Thank you for choosing Wing Heights Ghana for your insurance needs.",
        "Have a great day! Feel free to return if you have more questions about our insurance services.",
        "Take care! Don't hesitate to reach out if you need anything else regarding our insurance offerings.",
    ];
    let response = json["response"].as_str().unwrap();
    assert!(farewell_lines.contains(&response), "unexpected line: {response}");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // The session stays terminal until reset.
    let json = chat_turn(&state, "s1", "hello?").await;
    assert_eq!(json["state"], "farewell");
    assert!(json["response"].as_str().unwrap().contains("reset"));
}

#[tokio::test]
async fn test_reset_action_reinitializes_session() {
    let dir = TempDir::new().unwrap();
    let (llm, _) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    chat_turn(&state, "s1", "Hi, I'm Kofi").await;
    chat_turn(&state, "s1", "bye").await;

    let (status, json) = post_chat(
        app(Arc::clone(&state)),
        serde_json::json!({ "action": "reset", "session_id": "s1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "greeting");
    assert_eq!(json["response"], "Conversation reset successfully");

    // Fresh conversation proceeds normally.
    let json = chat_turn(&state, "s1", "Hi, I'm Ama").await;
    assert_eq!(json["state"], "understanding_need");
    assert!(json["response"].as_str().unwrap().contains("Ama"));
}

#[tokio::test]
async fn test_relevant_query_delegates_and_offers_appointment() {
    let dir = TempDir::new().unwrap();
    let (llm, calls) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    let json = chat_turn(&state, "s1", "I have a problem with my policy and need help").await;
    assert_eq!(json["intent"], "problem_description");
    let response = json["response"].as_str().unwrap();
    assert!(response.contains("general guidance"));
    assert!(response.contains("Would you like to schedule an appointment?"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_irrelevant_query_is_declined_without_llm() {
    let dir = TempDir::new().unwrap();
    let (llm, calls) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    let json = chat_turn(&state, "s1", "do you like football").await;
    assert!(json["response"]
        .as_str()
        .unwrap()
        .contains("only assist with insurance-related queries"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_llm_failure_returns_apology_and_session_survives() {
    let dir = TempDir::new().unwrap();
    let state = test_state(Box::new(FailingLlm), &dir);

    let json = chat_turn(&state, "s1", "explain premium coverage options").await;
    let response = json["response"].as_str().unwrap();
    assert!(response.contains("I apologize, but I encountered an error"));
    assert!(response.contains("quota exceeded"));

    // The session is still usable for rule-handled turns.
    let json = chat_turn(&state, "s1", "Hi, I'm Kofi").await;
    assert_eq!(json["state"], "understanding_need");
}

#[tokio::test]
async fn test_conversational_booking_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (llm, _) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    let json = chat_turn(&state, "s1", "I have a problem with my policy and need help").await;
    assert!(json["response"]
        .as_str()
        .unwrap()
        .contains("Would you like to schedule an appointment?"));

    let json = chat_turn(&state, "s1", "yes").await;
    assert_eq!(json["state"], "scheduling_appointment");
    assert!(json["response"].as_str().unwrap().contains("Full Name"));

    let json = chat_turn(&state, "s1", "Kofi Mensah").await;
    assert!(json["response"].as_str().unwrap().contains("Email"));

    let json = chat_turn(&state, "s1", "skip").await;
    assert!(json["response"].as_str().unwrap().contains("Mobile Number"));

    // 11 digits rejected, the flow re-prompts the same field
    let json = chat_turn(&state, "s1", "02441234567").await;
    assert!(json["response"].as_str().unwrap().contains("Invalid mobile number"));

    let json = chat_turn(&state, "s1", "0244123456").await;
    assert!(json["response"].as_str().unwrap().contains("Select Insurance Type"));

    let json = chat_turn(&state, "s1", "1").await;
    assert!(json["response"].as_str().unwrap().contains("Preferred Date"));

    let json = chat_turn(&state, "s1", "2024-03-15").await;
    assert!(json["response"].as_str().unwrap().contains("Preferred Time"));

    let json = chat_turn(&state, "s1", "10:00").await;
    assert_eq!(json["appointmentScheduled"], true);
    assert_eq!(json["state"], "insurance_discussion");
    assert!(json["response"].as_str().unwrap().contains("2024-03-15"));

    let contents =
        std::fs::read_to_string(dir.path().join("appointments.csv")).unwrap();
    assert!(contents.lines().next().unwrap().contains("preferred_date"));
    assert!(contents.contains("Kofi Mensah"));
    assert!(contents.contains("Health Insurance"));
}

// ── Schedule action ──

#[tokio::test]
async fn test_schedule_action_persists_immediately() {
    let dir = TempDir::new().unwrap();
    let (llm, _) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    let (status, json) = post_chat(
        app(Arc::clone(&state)),
        serde_json::json!({
            "action": "schedule",
            "session_id": "s1",
            "name": "Ama Mensah",
            "mobile": "0244123456",
            "insuranceType": "Auto Insurance",
            "preferredDate": "2024-03-15",
            "preferredTime": "14:00",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["appointmentScheduled"], true);
    assert_eq!(json["response"], "Appointment scheduled for 2024-03-15 at 14:00");

    let contents =
        std::fs::read_to_string(dir.path().join("appointments.csv")).unwrap();
    assert!(contents.contains("Ama Mensah"));
    assert!(contents.contains("Not Provided"));
}

#[tokio::test]
async fn test_schedule_action_validates_fields() {
    let dir = TempDir::new().unwrap();
    let (llm, _) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    let (status, json) = post_chat(
        app(Arc::clone(&state)),
        serde_json::json!({
            "action": "schedule",
            "name": "Ama Mensah",
            "mobile": "12345",
            "insuranceType": "Auto Insurance",
            "preferredDate": "2024-03-15",
            "preferredTime": "14:00",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid mobile number"));
}

// ── Sentiment endpoint ──

#[tokio::test]
async fn test_sentiment_analysis_aggregates_session_turns() {
    let dir = TempDir::new().unwrap();
    let (llm, _) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    chat_turn(&state, "s1", "hello").await;
    chat_turn(&state, "s1", "Thanks, that is great news about my policy").await;

    let res = app(Arc::clone(&state))
        .oneshot(
            Request::builder()
                .uri("/sentiment_analysis?session_id=s1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let counts = &json["counts"];
    let total = counts["positive"].as_u64().unwrap()
        + counts["neutral"].as_u64().unwrap()
        + counts["negative"].as_u64().unwrap();
    assert_eq!(total, 2);
    assert!(counts["positive"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_sentiment_analysis_unknown_session_is_empty() {
    let dir = TempDir::new().unwrap();
    let (llm, _) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    let res = app(state)
        .oneshot(
            Request::builder()
                .uri("/sentiment_analysis?session_id=nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["counts"]["positive"], 0);
    assert_eq!(json["percentages"]["positive"], 0.0);
}

// ── Interaction log ──

#[tokio::test]
async fn test_interactions_are_logged_with_header() {
    let dir = TempDir::new().unwrap();
    let (llm, _) = MockLlm::new();
    let state = test_state(Box::new(llm), &dir);

    chat_turn(&state, "s1", "Hi, I'm Kofi").await;
    chat_turn(&state, "s1", "I want Health Insurance").await;

    let contents =
        std::fs::read_to_string(dir.path().join("chatbot_data.csv")).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("timestamp,name,insurance_type,query,response"));
    assert!(lines[2].contains("Kofi"));
    assert!(lines[2].contains("insurance_discussion"));
}
