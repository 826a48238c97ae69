use serde::{Deserialize, Serialize};

use crate::error::FulfillmentError;

// ============================================================================
// Payment & Ledger Value Objects
// ============================================================================

/// Payment lifecycle status. Raw labels from the triggering layer are
/// normalized through [`PaymentStatus::parse`]; anything outside this set is
/// a validation rejection before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Canceled => "canceled",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, FulfillmentError> {
        match raw.trim().to_lowercase().as_str() {
            "pending" | "pendente" => Ok(PaymentStatus::Pending),
            "paid" | "pago" => Ok(PaymentStatus::Paid),
            "refunded" | "reembolsado" => Ok(PaymentStatus::Refunded),
            "canceled" | "cancelled" | "cancelado" => Ok(PaymentStatus::Canceled),
            _ => Err(FulfillmentError::Validation(format!(
                "unknown payment status: {raw}"
            ))),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    DigitalWallet,
}

/// Direction of a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashMovementType {
    In,
    Out,
}

impl CashMovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            CashMovementType::In => "in",
            CashMovementType::Out => "out",
        }
    }
}

/// What the posting records. Together with the reference this forms the
/// idempotency key: at most one movement per (reference_type, reference_id,
/// category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashCategory {
    Sale,
    Fee,
    Refund,
    Adjustment,
}

impl CashCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            CashCategory::Sale => "sale",
            CashCategory::Fee => "fee",
            CashCategory::Refund => "refund",
            CashCategory::Adjustment => "adjustment",
        }
    }
}

impl std::fmt::Display for CashCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of record a cash movement points back at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Payment,
    Order,
    Manual,
}

// ============================================================================
// Unit Tests
// ============================================================================
