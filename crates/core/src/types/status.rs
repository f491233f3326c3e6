//! Status enums for backend entities.
//!
//! Wire names are the backend's snake_case strings. Every enum carries an
//! `Unknown` catch-all so a new backend status never breaks page rendering.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a marketplace order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, not yet confirmed.
    #[default]
    Pending,
    /// Waiting for the payment provider.
    PaymentPending,
    /// Store is preparing the order.
    Preparing,
    /// Ready for pickup by a rider.
    Ready,
    /// Picked up, on its way.
    InTransit,
    /// Handed over to the customer.
    Delivered,
    /// Cancelled by the store, the customer or an admin.
    Cancelled,
    /// Status string this frontend does not know about.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::PaymentPending => "Pago pendiente",
            Self::Preparing => "En preparación",
            Self::Ready => "Listo para retiro",
            Self::InTransit => "En camino",
            Self::Delivered => "Entregado",
            Self::Cancelled => "Cancelado",
            Self::Unknown => "Desconocido",
        }
    }

    /// Wire name, as sent to the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PaymentPending => "payment_pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// The status a rider may move this order to, if any.
    ///
    /// Riders only ever move deliveries forward: `ready → in_transit →
    /// delivered`.
    #[must_use]
    pub const fn rider_next(self) -> Option<Self> {
        match self {
            Self::Ready => Some(Self::InTransit),
            Self::InTransit => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Whether a rider may move an order from `self` to `target`.
    #[must_use]
    pub fn can_rider_advance_to(self, target: Self) -> bool {
        self.rider_next() == Some(target)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "payment_pending" => Ok(Self::PaymentPending),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Support ticket status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
    #[serde(other)]
    Unknown,
}

impl TicketStatus {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Abierto",
            Self::InProgress => "En proceso",
            Self::Resolved => "Resuelto",
            Self::Closed => "Cerrado",
            Self::Unknown => "Desconocido",
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the ticket still accepts replies.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("invalid ticket status: {s}")),
        }
    }
}

/// Support ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    High,
    Urgent,
    #[default]
    #[serde(other)]
    Medium,
}

impl TicketPriority {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Baja",
            Self::Medium => "Media",
            Self::High => "Alta",
            Self::Urgent => "Urgente",
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}
