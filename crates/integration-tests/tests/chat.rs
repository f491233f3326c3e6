//! Integration tests for the chat widget API.

use std::sync::atomic::Ordering;

use petsgo_integration_tests::{HISTORY_DEBOUNCE, MODEL_REPLY, PASSWORD, TestApp};
use petsgo_storefront::services::FALLBACK_REPLY;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn send(app: &TestApp, client: &Client, message: &str) -> reqwest::Response {
    client
        .post(app.at("/api/chat"))
        .json(&json!({ "message": message }))
        .send()
        .await
        .expect("Request failed")
}

async fn bootstrap(app: &TestApp, client: &Client) -> Value {
    client
        .get(app.at("/api/chat"))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid JSON")
}

// =============================================================================
// Guest Tests
// =============================================================================

#[tokio::test]
async fn test_bootstrap_uses_backend_settings() {
    let app = TestApp::spawn().await;
    let body = bootstrap(&app, &app.client()).await;

    assert_eq!(body["enabled"], true);
    assert_eq!(body["bot_name"], "PetBot");
    assert_eq!(body["greeting"], "¡Hola! ¿En qué te ayudo?");
    assert_eq!(body["messages"], json!([]));
}

#[tokio::test]
async fn test_guest_conversation_is_kept_in_session() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = send(&app, &client, "  ¿Qué alimento recomiendas?  ").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["reply"], MODEL_REPLY);

    let body = bootstrap(&app, &client).await;
    assert_eq!(
        body["messages"],
        json!([
            {"role": "user", "content": "¿Qué alimento recomiendas?"},
            {"role": "assistant", "content": MODEL_REPLY},
        ])
    );

    let other = bootstrap(&app, &app.client()).await;
    assert_eq!(other["messages"], json!([]));

    // Guests never reach the backend history
    assert!(app.backend.history_writes().is_empty());
}

#[tokio::test]
async fn test_model_receives_system_prompt_and_history() {
    let app = TestApp::spawn().await;
    let client = app.client();

    send(&app, &client, "Hola").await;
    send(&app, &client, "¿Tienen arena para gatos?").await;

    let requests = app.model.requests();
    assert_eq!(requests.len(), 2);
    let last = &requests[1];
    assert_eq!(last["model"], "claude-test");
    assert_eq!(last["system"], "Eres PetBot de pruebas.");
    let messages = last["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[2]["content"], "¿Tienen arena para gatos?");
}

#[tokio::test]
async fn test_blank_message_is_rejected() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = send(&app, &client, "   ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Invalid JSON");
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    assert!(app.model.requests().is_empty());
    assert_eq!(bootstrap(&app, &client).await["messages"], json!([]));
}

#[tokio::test]
async fn test_oversized_message_is_rejected() {
    let app = TestApp::spawn().await;
    let response = send(&app, &app.client(), &"a".repeat(2001)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_model_failure_answers_with_fallback() {
    let app = TestApp::spawn().await;
    app.model.failing.store(true, Ordering::SeqCst);
    let client = app.client();

    let response = send(&app, &client, "Hola").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["reply"], FALLBACK_REPLY);

    let messages = bootstrap(&app, &client).await["messages"].clone();
    assert_eq!(messages.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_guest_clear_forgets_transcript() {
    let app = TestApp::spawn().await;
    let client = app.client();
    send(&app, &client, "Hola").await;

    let response = client
        .delete(app.at("/api/chat"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(bootstrap(&app, &client).await["messages"], json!([]));
    assert_eq!(app.backend.history_clears.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Signed-in Tests
// =============================================================================

#[tokio::test]
async fn test_account_history_is_loaded_from_backend() {
    let app = TestApp::spawn().await;
    app.backend.set_history("ana", vec![
        json!({"role": "user", "content": "Pregunta anterior"}),
        json!({"role": "assistant", "content": "Respuesta anterior"}),
    ]);
    let client = app.signed_in("ana").await;

    let body = bootstrap(&app, &client).await;
    assert_eq!(body["messages"][0]["content"], "Pregunta anterior");
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_account_writes_are_debounced() {
    let app = TestApp::spawn().await;
    let client = app.signed_in("ana").await;

    send(&app, &client, "Primera").await;
    send(&app, &client, "Segunda").await;
    send(&app, &client, "Tercera").await;

    tokio::time::sleep(HISTORY_DEBOUNCE * 4).await;

    let writes = app.backend.history_writes();
    assert_eq!(writes.len(), 1);
    let turns = writes[0].as_array().expect("messages array");
    assert_eq!(turns.len(), 6);
    assert_eq!(turns[4]["content"], "Tercera");
}

#[tokio::test]
async fn test_account_clear_cancels_pending_write() {
    let app = TestApp::spawn().await;
    let client = app.signed_in("ana").await;

    send(&app, &client, "Hola").await;
    let response = client
        .delete(app.at("/api/chat"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    tokio::time::sleep(HISTORY_DEBOUNCE * 4).await;

    assert!(app.backend.history_writes().is_empty());
    assert_eq!(app.backend.history_clears.load(Ordering::SeqCst), 1);
    assert_eq!(bootstrap(&app, &client).await["messages"], json!([]));
}

#[tokio::test]
async fn test_next_account_on_same_browser_starts_fresh() {
    let app = TestApp::spawn().await;
    let client = app.signed_in("ana").await;

    send(&app, &client, "Secreto de Ana").await;
    assert_eq!(bootstrap(&app, &client).await["messages"].as_array().map(Vec::len), Some(2));
    tokio::time::sleep(HISTORY_DEBOUNCE * 4).await;

    let response = client
        .post(app.at("/login"))
        .form(&[("username", "bruno"), ("password", PASSWORD)])
        .send()
        .await
        .expect("Request failed");
    assert!(response.status().is_redirection());

    assert_eq!(bootstrap(&app, &client).await["messages"], json!([]));

    send(&app, &client, "Hola, soy Bruno").await;
    tokio::time::sleep(HISTORY_DEBOUNCE * 4).await;

    let bruno = app.backend.history_of("bruno");
    assert_eq!(bruno.len(), 2);
    assert_eq!(bruno[0]["content"], "Hola, soy Bruno");
    assert!(bruno.iter().all(|turn| turn["content"] != "Secreto de Ana"));
    assert_eq!(app.backend.history_of("ana")[0]["content"], "Secreto de Ana");
}
