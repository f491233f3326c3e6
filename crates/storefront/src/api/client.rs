//! Backend API client implementation.
//!
//! Uses `reqwest` for HTTP. Caches catalog reads using `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use petsgo_core::{
    BearerToken, ChatTurn, OrderId, OrderStatus, ProductId, TicketId, TicketStatus, VendorId,
};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    AdminStats, AuthResponse, Category, ChatHistory, ChatHistoryPayload, ChatbotConfig,
    LoginRequest, NewTicket, Order, OrderRequest, Product, ProductQuery, RegisterRequest,
    ReplyRequest, RiderStats, StatusUpdate, Ticket, TicketDetail, TicketReply, Vendor,
    VendorDashboard,
};
use super::{ApiError, Envelope, ErrorBody};
use crate::config::BackendConfig;

const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_CAPACITY: u64 = 1000;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the PetsGo REST backend.
///
/// Cheaply cloneable. Catalog reads (products, vendors, categories and the
/// chatbot configuration) are cached for 5 minutes; everything done on
/// behalf of a signed-in visitor goes straight to the backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    fn request(&self, method: Method, path: &str, token: Option<&BearerToken>) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Send a request and decode its (possibly enveloped) JSON payload.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let retry_after = retry_after(response.headers());
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, retry_after, &body));
        }

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope.into_inner()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse backend response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    /// Send a request whose response body is irrelevant.
    async fn send_unit(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let retry_after = retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, retry_after, &body))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&BearerToken>,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path, token)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&BearerToken>,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path, token).json(body))
            .await
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.post("/auth/login", None, &LoginRequest { username, password })
            .await
    }

    /// Register a customer account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns the backend's validation error (e.g. username taken).
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post("/auth/register", None, request).await
    }

    // -------------------------------------------------------------------------
    // Catalog (cached)
    // -------------------------------------------------------------------------

    /// List products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            tracing::debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .send(self.request(Method::GET, "/products", None).query(query))
            .await?;
        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            return Ok(*product);
        }

        let product: Product = self.get(&format!("/products/{id}"), None).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// List every store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self))]
    pub async fn vendors(&self) -> Result<Vec<Vendor>, ApiError> {
        if let Some(CacheValue::Vendors(vendors)) = self.inner.cache.get(&CacheKey::Vendors).await
        {
            return Ok(vendors);
        }

        let vendors: Vec<Vendor> = self.get("/vendors", None).await?;
        self.inner
            .cache
            .insert(CacheKey::Vendors, CacheValue::Vendors(vendors.clone()))
            .await;
        Ok(vendors)
    }

    /// Fetch one store.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids.
    #[instrument(skip(self), fields(vendor_id = %id))]
    pub async fn vendor(&self, id: VendorId) -> Result<Vendor, ApiError> {
        let key = CacheKey::Vendor(id);
        if let Some(CacheValue::Vendor(vendor)) = self.inner.cache.get(&key).await {
            return Ok(*vendor);
        }

        let vendor: Vendor = self.get(&format!("/vendors/{id}"), None).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Vendor(Box::new(vendor.clone())))
            .await;
        Ok(vendor)
    }

    /// List product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get("/categories", None).await?;
        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;
        Ok(categories)
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Place an order for the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns the backend's validation error (stock, address) as
    /// `ApiError::Status`.
    #[instrument(skip(self, token, request), fields(lines = request.items.len()))]
    pub async fn create_order(
        &self,
        token: &BearerToken,
        request: &OrderRequest,
    ) -> Result<Order, ApiError> {
        self.post("/orders", Some(token), request).await
    }

    /// Orders of the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &BearerToken) -> Result<Vec<Order>, ApiError> {
        self.get("/orders/mine", Some(token)).await
    }

    // -------------------------------------------------------------------------
    // Vendor
    // -------------------------------------------------------------------------

    /// Dashboard of the signed-in vendor.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn vendor_dashboard(&self, token: &BearerToken) -> Result<VendorDashboard, ApiError> {
        self.get("/vendor/dashboard", Some(token)).await
    }

    /// Orders received by the signed-in vendor.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn vendor_orders(&self, token: &BearerToken) -> Result<Vec<Order>, ApiError> {
        self.get("/vendor/orders", Some(token)).await
    }

    /// Inventory of the signed-in vendor.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn vendor_products(&self, token: &BearerToken) -> Result<Vec<Product>, ApiError> {
        self.get("/vendor/products", Some(token)).await
    }

    // -------------------------------------------------------------------------
    // Admin
    // -------------------------------------------------------------------------

    /// Marketplace-wide statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn admin_dashboard(&self, token: &BearerToken) -> Result<AdminStats, ApiError> {
        self.get("/admin/dashboard", Some(token)).await
    }

    /// Every store, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn admin_vendors(&self, token: &BearerToken) -> Result<Vec<Vendor>, ApiError> {
        self.get("/admin/vendors", Some(token)).await
    }

    /// A vendor's dashboard as seen by an admin (read only).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown vendors.
    #[instrument(skip(self, token), fields(vendor_id = %vendor_id))]
    pub async fn admin_vendor_dashboard(
        &self,
        token: &BearerToken,
        vendor_id: VendorId,
    ) -> Result<VendorDashboard, ApiError> {
        self.get(&format!("/admin/vendors/{vendor_id}/dashboard"), Some(token))
            .await
    }

    /// Every support ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn admin_tickets(&self, token: &BearerToken) -> Result<Vec<Ticket>, ApiError> {
        self.get("/admin/tickets", Some(token)).await
    }

    /// Change a ticket's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, token), fields(ticket_id = %id, status = status.as_str()))]
    pub async fn update_ticket_status(
        &self,
        token: &BearerToken,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/admin/tickets/{id}/status"), Some(token))
            .json(&StatusUpdate {
                status: status.as_str(),
            });
        self.send_unit(builder).await
    }

    // -------------------------------------------------------------------------
    // Rider
    // -------------------------------------------------------------------------

    /// Deliveries assigned to the signed-in rider.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn rider_deliveries(&self, token: &BearerToken) -> Result<Vec<Order>, ApiError> {
        self.get("/rider/deliveries", Some(token)).await
    }

    /// Figures of the signed-in rider.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn rider_stats(&self, token: &BearerToken) -> Result<RiderStats, ApiError> {
        self.get("/rider/stats", Some(token)).await
    }

    /// Move a delivery to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self, token), fields(order_id = %id, status = status.as_str()))]
    pub async fn update_delivery_status(
        &self,
        token: &BearerToken,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/rider/deliveries/{id}/status"), Some(token))
            .json(&StatusUpdate {
                status: status.as_str(),
            });
        self.send_unit(builder).await
    }

    // -------------------------------------------------------------------------
    // Support tickets
    // -------------------------------------------------------------------------

    /// Tickets opened by the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn tickets(&self, token: &BearerToken) -> Result<Vec<Ticket>, ApiError> {
        self.get("/tickets", Some(token)).await
    }

    /// One ticket with its thread.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown or foreign tickets.
    #[instrument(skip(self, token), fields(ticket_id = %id))]
    pub async fn ticket(&self, token: &BearerToken, id: TicketId) -> Result<TicketDetail, ApiError> {
        self.get(&format!("/tickets/{id}"), Some(token)).await
    }

    /// Open a ticket.
    ///
    /// # Errors
    ///
    /// Returns the backend's validation error.
    #[instrument(skip(self, token, ticket), fields(subject = %ticket.subject))]
    pub async fn create_ticket(
        &self,
        token: &BearerToken,
        ticket: &NewTicket,
    ) -> Result<Ticket, ApiError> {
        self.post("/tickets", Some(token), ticket).await
    }

    /// Add a message to a ticket thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticket is closed or unknown.
    #[instrument(skip(self, token, message), fields(ticket_id = %id))]
    pub async fn reply_ticket(
        &self,
        token: &BearerToken,
        id: TicketId,
        message: &str,
    ) -> Result<TicketReply, ApiError> {
        self.post(
            &format!("/tickets/{id}/replies"),
            Some(token),
            &ReplyRequest { message },
        )
        .await
    }

    // -------------------------------------------------------------------------
    // Chatbot
    // -------------------------------------------------------------------------

    /// Chat widget settings (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self))]
    pub async fn chatbot_config(&self) -> Result<ChatbotConfig, ApiError> {
        if let Some(CacheValue::ChatbotConfig(config)) =
            self.inner.cache.get(&CacheKey::ChatbotConfig).await
        {
            return Ok(*config);
        }

        let config: ChatbotConfig = self.get("/chatbot-config", None).await?;
        self.inner
            .cache
            .insert(
                CacheKey::ChatbotConfig,
                CacheValue::ChatbotConfig(Box::new(config.clone())),
            )
            .await;
        Ok(config)
    }

    /// Stored transcript of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or answers badly.
    #[instrument(skip(self, token))]
    pub async fn chat_history(&self, token: &BearerToken) -> Result<Vec<ChatTurn>, ApiError> {
        let history: ChatHistoryPayload = self.get("/chat-history", Some(token)).await?;
        Ok(history.into_turns())
    }

    /// Replace the stored transcript of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    #[instrument(skip(self, token, turns), fields(turns = turns.len()))]
    pub async fn save_chat_history(
        &self,
        token: &BearerToken,
        turns: &[ChatTurn],
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, "/chat-history", Some(token))
            .json(&ChatHistory {
                messages: turns.to_vec(),
            });
        self.send_unit(builder).await
    }

    /// Delete the stored transcript of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    #[instrument(skip(self, token))]
    pub async fn clear_chat_history(&self, token: &BearerToken) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, "/chat-history", Some(token)))
            .await
    }
}

/// Seconds from a `Retry-After` header, when it holds a number.
fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Map a non-success status and its body to an `ApiError`.
fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| body.chars().take(200).collect());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(retry_after.unwrap_or(1)),
        _ => {
            tracing::warn!(status = %status, message = %message, "Backend returned non-success status");
            ApiError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_uses_backend_message() {
        let err = status_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            None,
            r#"{"code":"invalid","message":"Dirección requerida"}"#,
        );
        assert!(matches!(
            err,
            ApiError::Status { status: 422, ref message } if message == "Dirección requerida"
        ));
    }

    #[test]
    fn test_status_error_maps_auth_and_not_found() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, None, r#"{"error":"bad token"}"#),
            ApiError::Unauthorized(ref m) if m == "bad token"
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, None, ""),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, None, "<html>missing</html>"),
            ApiError::NotFound(ref m) if m == "<html>missing</html>"
        ));
    }

    #[test]
    fn test_status_error_truncates_plain_bodies() {
        let body = "x".repeat(1000);
        match status_error(StatusCode::BAD_GATEWAY, None, &body) {
            ApiError::Status { message, .. } => assert_eq!(message.len(), 200),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_reads_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, retry_after(&headers), ""),
            ApiError::RateLimited(30)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, None, ""),
            ApiError::RateLimited(1)
        ));
    }
}
