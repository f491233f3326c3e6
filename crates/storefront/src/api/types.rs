//! Request and response types of the PetsGo REST backend.
//!
//! Field names follow the backend's snake_case JSON. Optional fields are
//! defaulted so partial payloads still decode.

use serde::{Deserialize, Serialize};

use petsgo_core::{
    BearerToken, CategoryId, ChatTurn, Email, OrderId, OrderStatus, Price, ProductId, Role,
    TicketId, TicketPriority, TicketStatus, UserId, VendorId,
};

// =============================================================================
// Auth
// =============================================================================

/// Account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: BearerToken,
    pub user: ApiUser,
}

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Customer registration request body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Email,
    pub password: String,
    pub display_name: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    #[serde(default)]
    pub vendor_name: Option<String>,
}

impl Product {
    /// Whether the backend reports no units left.
    #[must_use]
    pub fn is_out_of_stock(&self) -> bool {
        self.stock == Some(0)
    }
}

/// A store on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub store_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

/// Filters for product listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<VendorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ProductQuery {
    /// All products of one store.
    #[must_use]
    pub fn for_vendor(vendor_id: VendorId) -> Self {
        Self {
            vendor_id: Some(vendor_id),
            ..Self::default()
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Option<Price>,
}

/// An order, as seen by a customer, vendor, admin or rider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    pub total: Price,
    #[serde(default)]
    pub delivery_fee: Option<Price>,
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// A line in an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Checkout request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: String,
    pub phone: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Status change body (orders and tickets).
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate<'a> {
    pub status: &'a str,
}

// =============================================================================
// Dashboards
// =============================================================================

/// Figures shown on a vendor dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorStats {
    pub total_sales: Price,
    pub order_count: u64,
    pub product_count: u64,
    pub pending_orders: u64,
}

/// Vendor dashboard payload (also used for admin impersonation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorDashboard {
    pub vendor: Vendor,
    #[serde(default)]
    pub stats: VendorStats,
    #[serde(default)]
    pub recent_orders: Vec<Order>,
}

/// Marketplace-wide figures for the admin panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_vendors: u64,
    pub total_orders: u64,
    pub total_revenue: Price,
    pub commission_revenue: Price,
    pub open_tickets: u64,
}

/// Figures for the rider dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiderStats {
    pub pending_deliveries: u64,
    pub completed_today: u64,
    pub total_completed: u64,
    pub earnings: Price,
}

// =============================================================================
// Support tickets
// =============================================================================

/// A support ticket summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default)]
    pub ticket_number: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A message in a ticket thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketReply {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A ticket with its thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    #[serde(default)]
    pub replies: Vec<TicketReply>,
}

/// New ticket request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTicket {
    pub subject: String,
    pub category: String,
    pub priority: TicketPriority,
    pub description: String,
}

/// Ticket reply request body.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyRequest<'a> {
    pub message: &'a str,
}

// =============================================================================
// Chatbot
// =============================================================================

/// Chat widget settings managed from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatbotConfig {
    pub enabled: bool,
    pub bot_name: String,
    pub greeting: String,
    pub system_prompt: String,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_name: "PetBot".to_string(),
            greeting: "¡Hola! Soy PetBot 🐾 ¿En qué te puedo ayudar hoy?".to_string(),
            system_prompt: "Eres PetBot, el asistente de PetsGo, un marketplace chileno de \
                            productos para mascotas. Responde en español, de forma breve y \
                            amable. Ayuda con productos, tiendas, pedidos y despachos. Si no \
                            sabes algo, sugiere contactar a soporte."
                .to_string(),
        }
    }
}

/// Stored chat history of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
}

/// Chat history as answered by `GET /chat-history`.
///
/// The backend sends either the list of turns or `{ "messages": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChatHistoryPayload {
    /// `[turn, ...]`
    Turns(Vec<ChatTurn>),
    /// `{ "messages": [turn, ...] }`
    Wrapped { messages: Vec<ChatTurn> },
}

impl ChatHistoryPayload {
    /// The turns, oldest first.
    pub fn into_turns(self) -> Vec<ChatTurn> {
        match self {
            Self::Turns(turns) | Self::Wrapped { messages: turns } => turns,
        }
    }
}
