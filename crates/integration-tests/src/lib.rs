//! Integration tests for the PetsGo storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p petsgo-integration-tests
//! ```
//!
//! Nothing external is needed: [`TestApp::spawn`] starts, on ephemeral
//! ports, a fake PetsGo backend, a fake Messages API and the real storefront
//! router wired to both. Tests drive the storefront over HTTP with a
//! cookie-keeping `reqwest` client that does not follow redirects.
//!
//! # Fake accounts
//!
//! | Username | Role     |
//! |----------|----------|
//! | `ana`    | customer |
//! | `bruno`  | customer |
//! | `tienda` | vendor   |
//! | `admin`  | admin    |
//! | `rider`  | rider    |
//!
//! Every account uses [`PASSWORD`].

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use reqwest::{Client, redirect};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use petsgo_storefront::config::{BackendConfig, ChatModelConfig, StorefrontConfig};
use petsgo_storefront::state::AppState;

/// Password of every fake account.
pub const PASSWORD: &str = "secreto123";

/// Text the fake language model answers with.
pub const MODEL_REPLY: &str = "¡Claro! Te recomiendo el alimento para perro adulto.";

/// Quiet period of the chat history writer in tests.
pub const HISTORY_DEBOUNCE: Duration = Duration::from_millis(500);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Test server failed");
    });
    format!("http://{addr}")
}

// =============================================================================
// Fake backend
// =============================================================================

/// What the fake backend has been asked to do.
#[derive(Default)]
pub struct BackendState {
    /// When set, catalog endpoints answer 503.
    pub catalog_down: AtomicBool,
    /// Order request bodies received.
    pub orders: Mutex<Vec<Value>>,
    /// Ticket status changes received: (ticket id, status).
    pub ticket_updates: Mutex<Vec<(i64, String)>>,
    /// Delivery status changes received: (order id, status).
    pub delivery_updates: Mutex<Vec<(i64, String)>>,
    /// Chat history writes received (`messages` arrays).
    pub history_writes: Mutex<Vec<Value>>,
    /// Chat history deletes received.
    pub history_clears: AtomicUsize,
    /// Stored chat history per username.
    pub history: Mutex<HashMap<String, Vec<Value>>>,
    /// Ticket replies received.
    pub replies: Mutex<Vec<String>>,
}

impl BackendState {
    /// Order request bodies received so far.
    pub fn orders(&self) -> Vec<Value> {
        lock(&self.orders).clone()
    }

    /// Ticket status changes received so far.
    pub fn ticket_updates(&self) -> Vec<(i64, String)> {
        lock(&self.ticket_updates).clone()
    }

    /// Delivery status changes received so far.
    pub fn delivery_updates(&self) -> Vec<(i64, String)> {
        lock(&self.delivery_updates).clone()
    }

    /// Chat history writes received so far.
    pub fn history_writes(&self) -> Vec<Value> {
        lock(&self.history_writes).clone()
    }

    /// Stored chat history of `username`.
    pub fn history_of(&self, username: &str) -> Vec<Value> {
        lock(&self.history).get(username).cloned().unwrap_or_default()
    }

    /// Replace the stored chat history of `username`.
    pub fn set_history(&self, username: &str, messages: Vec<Value>) {
        lock(&self.history).insert(username.to_string(), messages);
    }
}

type Backend = Arc<BackendState>;

fn role_of(username: &str) -> &'static str {
    match username {
        "tienda" => "vendor",
        "admin" => "admin",
        "rider" => "rider",
        _ => "customer",
    }
}

fn user_id(username: &str) -> i64 {
    match username {
        "ana" => 1,
        "tienda" => 2,
        "admin" => 3,
        "rider" => 4,
        "bruno" => 5,
        _ => 50,
    }
}

fn user_json(username: &str) -> Value {
    json!({
        "id": user_id(username),
        "username": username,
        "email": format!("{username}@petsgo.cl"),
        "display_name": username.to_uppercase(),
        "role": role_of(username),
    })
}

/// Username behind a `Bearer token-<username>` header.
fn bearer_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer token-")
        .map(String::from)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Token inválido"})),
    )
        .into_response()
}

fn catalog_unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response()
}

fn products() -> Vec<Value> {
    vec![
        json!({"id": 101, "name": "Alimento Premium Perro", "description": "Croquetas de cordero",
               "price": 18990, "stock": 12, "category": "perros", "vendor_id": 1,
               "vendor_name": "Patitas Test"}),
        json!({"id": 102, "name": "Arena Aglomerante", "description": "Arena para gatos",
               "price": "7990", "stock": 4, "category": "gatos", "vendor_id": 1,
               "vendor_name": "Patitas Test"}),
        json!({"id": 103, "name": "Pecera Agotada", "price": 45990, "stock": 0,
               "category": "peces", "vendor_id": 2, "vendor_name": "Acuario Test"}),
    ]
}

fn vendors() -> Vec<Value> {
    vec![
        json!({"id": 1, "store_name": "Patitas Test", "description": "Tienda de prueba",
               "email": "patitas@petsgo.cl", "status": "active"}),
        json!({"id": 2, "store_name": "Acuario Test", "status": "active"}),
    ]
}

fn deliveries() -> Vec<Value> {
    vec![
        json!({"id": 10, "status": "ready", "total": 12990, "store_name": "Patitas Test",
               "shipping_address": "Av. Prueba 123"}),
        json!({"id": 11, "status": "in_transit", "total": 7990, "store_name": "Acuario Test",
               "shipping_address": "Calle Falsa 456"}),
    ]
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    if body.password != PASSWORD {
        return unauthorized();
    }
    Json(json!({"data": {
        "token": format!("token-{}", body.username),
        "user": user_json(&body.username),
    }}))
    .into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    if username == "repetido" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "El usuario ya existe"})),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({"token": format!("token-{username}"), "user": user_json(username)})),
    )
        .into_response()
}

#[derive(Deserialize)]
struct ProductFilter {
    category: Option<String>,
    search: Option<String>,
    vendor_id: Option<i64>,
}

async fn list_products(State(state): State<Backend>, Query(filter): Query<ProductFilter>) -> Response {
    if state.catalog_down.load(Ordering::SeqCst) {
        return catalog_unavailable();
    }
    let found: Vec<Value> = products()
        .into_iter()
        .filter(|p| {
            filter
                .category
                .as_deref()
                .is_none_or(|c| p["category"].as_str() == Some(c))
        })
        .filter(|p| filter.vendor_id.is_none_or(|v| p["vendor_id"].as_i64() == Some(v)))
        .filter(|p| {
            filter.search.as_deref().is_none_or(|s| {
                p["name"]
                    .as_str()
                    .is_some_and(|n| n.to_lowercase().contains(&s.to_lowercase()))
            })
        })
        .collect();
    Json(json!({"data": found})).into_response()
}

async fn show_product(State(state): State<Backend>, Path(id): Path<i64>) -> Response {
    if state.catalog_down.load(Ordering::SeqCst) {
        return catalog_unavailable();
    }
    products()
        .into_iter()
        .find(|p| p["id"].as_i64() == Some(id))
        .map_or_else(
            || StatusCode::NOT_FOUND.into_response(),
            |p| Json(json!({"data": p})).into_response(),
        )
}

async fn list_vendors(State(state): State<Backend>) -> Response {
    if state.catalog_down.load(Ordering::SeqCst) {
        return catalog_unavailable();
    }
    // Bare payload, no envelope
    Json(vendors()).into_response()
}

async fn show_vendor(State(state): State<Backend>, Path(id): Path<i64>) -> Response {
    if state.catalog_down.load(Ordering::SeqCst) {
        return catalog_unavailable();
    }
    vendors()
        .into_iter()
        .find(|v| v["id"].as_i64() == Some(id))
        .map_or_else(
            || StatusCode::NOT_FOUND.into_response(),
            |v| Json(v).into_response(),
        )
}

async fn categories(State(state): State<Backend>) -> Response {
    if state.catalog_down.load(Ordering::SeqCst) {
        return catalog_unavailable();
    }
    Json(json!({"data": [
        {"id": 1, "name": "Perros", "slug": "perros", "emoji": "🐶"},
        {"id": 2, "name": "Gatos", "slug": "gatos", "emoji": "🐱"},
    ]}))
    .into_response()
}

async fn chatbot_config() -> Json<Value> {
    Json(json!({"data": {
        "enabled": true,
        "bot_name": "PetBot",
        "greeting": "¡Hola! ¿En qué te ayudo?",
        "system_prompt": "Eres PetBot de pruebas.",
    }}))
}

async fn create_order(
    State(state): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    lock(&state.orders).push(body);
    (
        StatusCode::CREATED,
        Json(json!({"data": {"id": 77, "status": "pending", "total": 37980}})),
    )
        .into_response()
}

async fn my_orders(State(state): State<Backend>, headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    let orders: Vec<Value> = lock(&state.orders)
        .iter()
        .map(|_| {
            json!({"id": 77, "status": "preparing", "total": 37980, "store_name": "Patitas Test",
                   "created_at": "2025-03-01T12:00:00Z"})
        })
        .collect();
    Json(json!({"data": orders})).into_response()
}

async fn vendor_dashboard(headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({"data": {
        "vendor": vendors().into_iter().next(),
        "stats": {"total_sales": 125000, "order_count": 9, "product_count": 2, "pending_orders": 1},
        "recent_orders": [{"id": 70, "status": "pending", "total": 18990, "customer_name": "Ana"}],
    }}))
    .into_response()
}

async fn vendor_orders(headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    Json(json!([{"id": 70, "status": "pending", "total": 18990, "customer_name": "Ana",
                 "items": [{"product_id": 101, "product_name": "Alimento Premium Perro", "quantity": 1}]}]))
    .into_response()
}

async fn vendor_products(headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    let own: Vec<Value> = products().into_iter().take(2).collect();
    Json(json!({"data": own})).into_response()
}

async fn admin_dashboard(headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({"total_users": 321, "total_vendors": 2, "total_orders": 45,
                "total_revenue": 990000, "commission_revenue": 99000, "open_tickets": 3}))
    .into_response()
}

async fn admin_vendors(headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({"data": vendors()})).into_response()
}

async fn admin_vendor_dashboard(headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    let Some(vendor) = vendors().into_iter().find(|v| v["id"].as_i64() == Some(id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    Json(json!({"vendor": vendor, "stats": {"order_count": 4}, "recent_orders": []})).into_response()
}

fn tickets() -> Vec<Value> {
    vec![json!({"id": 5, "ticket_number": "TK-0005", "subject": "Pedido atrasado",
                "category": "pedido", "priority": "high", "status": "open",
                "user_name": "ana", "created_at": "2025-03-02T09:30:00Z"})]
}

async fn admin_tickets(headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({"data": tickets()})).into_response()
}

async fn update_ticket_status(
    State(state): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    let status = body["status"].as_str().unwrap_or_default().to_string();
    lock(&state.ticket_updates).push((id, status));
    StatusCode::NO_CONTENT.into_response()
}

async fn rider_deliveries(headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({"data": deliveries()})).into_response()
}

async fn rider_stats(headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({"pending_deliveries": 2, "completed_today": 3, "total_completed": 40,
                "earnings": 84000}))
    .into_response()
}

async fn update_delivery_status(
    State(state): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    let status = body["status"].as_str().unwrap_or_default().to_string();
    lock(&state.delivery_updates).push((id, status));
    Json(json!({"ok": true})).into_response()
}

async fn list_tickets(headers: HeaderMap) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({"data": tickets()})).into_response()
}

async fn create_ticket(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    (
        StatusCode::CREATED,
        Json(json!({"data": {"id": 5, "subject": body["subject"], "priority": body["priority"],
                             "status": "open"}})),
    )
        .into_response()
}

async fn show_ticket(State(state): State<Backend>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    if id != 5 {
        return StatusCode::NOT_FOUND.into_response();
    }
    let mut replies = vec![json!({"author_name": "Soporte PetsGo", "is_staff": true,
                                  "message": "Estamos revisando tu pedido."})];
    replies.extend(
        lock(&state.replies)
            .iter()
            .map(|m| json!({"author_name": "ana", "is_staff": false, "message": m})),
    );
    let mut detail = tickets().remove(0);
    detail["replies"] = Value::Array(replies);
    Json(json!({"data": detail})).into_response()
}

async fn reply_ticket(
    State(state): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if bearer_user(&headers).is_none() {
        return unauthorized();
    }
    if id != 5 {
        return StatusCode::NOT_FOUND.into_response();
    }
    let message = body["message"].as_str().unwrap_or_default().to_string();
    lock(&state.replies).push(message.clone());
    (
        StatusCode::CREATED,
        Json(json!({"message": message, "is_staff": false})),
    )
        .into_response()
}

async fn get_history(State(state): State<Backend>, headers: HeaderMap) -> Response {
    let Some(username) = bearer_user(&headers) else {
        return unauthorized();
    };
    // Enveloped bare list of turns
    Json(json!({"data": state.history_of(&username)})).into_response()
}

async fn put_history(
    State(state): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(username) = bearer_user(&headers) else {
        return unauthorized();
    };
    let messages = body["messages"].clone();
    if let Value::Array(turns) = &messages {
        state.set_history(&username, turns.clone());
    }
    lock(&state.history_writes).push(messages);
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_history(State(state): State<Backend>, headers: HeaderMap) -> Response {
    let Some(username) = bearer_user(&headers) else {
        return unauthorized();
    };
    state.history_clears.fetch_add(1, Ordering::SeqCst);
    lock(&state.history).remove(&username);
    StatusCode::NO_CONTENT.into_response()
}

fn backend_router(state: Backend) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/products", get(list_products))
        .route("/products/{id}", get(show_product))
        .route("/vendors", get(list_vendors))
        .route("/vendors/{id}", get(show_vendor))
        .route("/categories", get(categories))
        .route("/chatbot-config", get(chatbot_config))
        .route("/orders", post(create_order))
        .route("/orders/mine", get(my_orders))
        .route("/vendor/dashboard", get(vendor_dashboard))
        .route("/vendor/orders", get(vendor_orders))
        .route("/vendor/products", get(vendor_products))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/admin/vendors", get(admin_vendors))
        .route("/admin/vendors/{id}/dashboard", get(admin_vendor_dashboard))
        .route("/admin/tickets", get(admin_tickets))
        .route("/admin/tickets/{id}/status", put(update_ticket_status))
        .route("/rider/deliveries", get(rider_deliveries))
        .route("/rider/stats", get(rider_stats))
        .route("/rider/deliveries/{id}/status", put(update_delivery_status))
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route("/tickets/{id}", get(show_ticket))
        .route("/tickets/{id}/replies", post(reply_ticket))
        .route(
            "/chat-history",
            get(get_history).put(put_history).delete(delete_history),
        )
        .with_state(state)
}

// =============================================================================
// Fake Messages API
// =============================================================================

/// What the fake language model has received.
#[derive(Default)]
pub struct ModelState {
    /// When set, every call answers 500.
    pub failing: AtomicBool,
    /// Request bodies received.
    pub requests: Mutex<Vec<Value>>,
}

impl ModelState {
    /// Request bodies received so far.
    pub fn requests(&self) -> Vec<Value> {
        lock(&self.requests).clone()
    }
}

async fn messages(State(state): State<Arc<ModelState>>, Json(body): Json<Value>) -> Response {
    lock(&state.requests).push(body);
    if state.failing.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"type": "error", "error": {"type": "api_error", "message": "boom"}})),
        )
            .into_response();
    }
    Json(json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "stop_reason": "end_turn",
        "content": [{"type": "text", "text": MODEL_REPLY}],
        "usage": {"input_tokens": 12, "output_tokens": 9},
    }))
    .into_response()
}

// =============================================================================
// Test application
// =============================================================================

/// A running storefront with its fakes.
pub struct TestApp {
    /// Storefront base URL.
    pub url: String,
    /// Fake backend recordings and switches.
    pub backend: Arc<BackendState>,
    /// Fake language model recordings and switches.
    pub model: Arc<ModelState>,
}

impl TestApp {
    /// Start the fakes and a storefront wired to them.
    pub async fn spawn() -> Self {
        let backend = Arc::new(BackendState::default());
        let backend_url = serve(backend_router(Arc::clone(&backend))).await;

        let model = Arc::new(ModelState::default());
        let model_url = serve(
            Router::new()
                .route("/v1/messages", post(messages))
                .with_state(Arc::clone(&model)),
        )
        .await;

        let config = StorefrontConfig {
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            base_url: "http://localhost".to_string(),
            api: BackendConfig {
                base_url: backend_url,
                timeout: Duration::from_secs(5),
            },
            chat: Some(ChatModelConfig {
                api_key: SecretString::from("sk-ant-test-4f9c2b7e1d8a".to_string()),
                model: "claude-test".to_string(),
                api_url: format!("{model_url}/v1/messages"),
            }),
            chat_history_debounce: HISTORY_DEBOUNCE,
            static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static")),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let state = AppState::new(config).expect("Failed to build app state");
        let url = serve(petsgo_storefront::app(state)).await;

        Self {
            url,
            backend,
            model,
        }
    }

    /// A fresh browser: own cookie jar, redirects not followed.
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Absolute URL of a storefront path.
    pub fn at(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    /// A browser signed in as `username`.
    pub async fn signed_in(&self, username: &str) -> Client {
        let client = self.client();
        let response = client
            .post(self.at("/login"))
            .form(&[("username", username), ("password", PASSWORD)])
            .send()
            .await
            .expect("Login request failed");
        assert!(
            response.status().is_redirection(),
            "login as {username} answered {}",
            response.status()
        );
        client
    }
}

/// `Location` header of a response.
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)?
        .to_str()
        .ok()
}
