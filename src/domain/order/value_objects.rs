use serde::{Deserialize, Serialize};

use crate::error::FulfillmentError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Canonical order lifecycle status.
///
/// The linear path is Received → Preparing → Ready → OutForDelivery →
/// Delivered; Canceled is reachable from any non-terminal status. Legacy
/// string labels (several Portuguese spellings survive in stored data and
/// old clients) are accepted by [`OrderStatus::parse`] and normalized here,
/// at the boundary - internal logic only ever sees this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Received,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Position on the linear forward path. `Canceled` sits outside it.
    pub fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::Received => Some(0),
            OrderStatus::Preparing => Some(1),
            OrderStatus::Ready => Some(2),
            OrderStatus::OutForDelivery => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Canceled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Canceled => "CANCELED",
        }
    }

    /// Parse a raw status label, accepting canonical names and the legacy
    /// aliases still emitted by old clients ("PRONTO" means Ready, etc.).
    pub fn parse(raw: &str) -> Result<Self, FulfillmentError> {
        let normalized = raw.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "RECEIVED" | "RECEBIDO" => Ok(OrderStatus::Received),
            "PREPARING" | "EM_PREPARO" | "PREPARANDO" => Ok(OrderStatus::Preparing),
            "READY" | "PRONTO" => Ok(OrderStatus::Ready),
            "OUT_FOR_DELIVERY" | "SAIU_PARA_ENTREGA" | "EM_ENTREGA" => {
                Ok(OrderStatus::OutForDelivery)
            }
            "DELIVERED" | "ENTREGUE" => Ok(OrderStatus::Delivered),
            "CANCELED" | "CANCELLED" | "CANCELADO" => Ok(OrderStatus::Canceled),
            _ => Err(FulfillmentError::Validation(format!(
                "unknown order status: {raw}"
            ))),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the order leaves the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Delivery,
    Pickup,
    Table,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::Delivery => "DELIVERY",
            OrderType::Pickup => "PICKUP",
            OrderType::Table => "TABLE",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, FulfillmentError> {
        match raw.trim().to_uppercase().as_str() {
            "DELIVERY" | "ENTREGA" => Ok(OrderType::Delivery),
            "PICKUP" | "RETIRADA" => Ok(OrderType::Pickup),
            "TABLE" | "MESA" => Ok(OrderType::Table),
            _ => Err(FulfillmentError::Validation(format!(
                "unknown order type: {raw}"
            ))),
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A production area identifier ("COZINHA", "BAR", ...).
///
/// Stations are an open set - each tenant wires its own areas - so this is
/// a normalized label rather than a closed enum. Normalization (trim +
/// uppercase) happens on construction; two spellings of the same area
/// always compare equal afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Station(String);

impl Station {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, FulfillmentError> {
        let normalized = raw.as_ref().trim().to_uppercase();
        if normalized.is_empty() {
            return Err(FulfillmentError::Validation(
                "station name cannot be empty".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A modifier option the customer picked for a line ("Extras" / "Bacon").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedModifier {
    pub group: String,
    pub option: String,
    /// Signed price adjustment per unit, in minor currency units.
    pub price_delta: i64,
}

// ============================================================================
// Unit Tests
// ============================================================================
