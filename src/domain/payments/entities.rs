use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{
    CashCategory, CashMovementType, PaymentMethod, PaymentStatus, ReferenceType,
};

// ============================================================================
// Payment & Ledger Entities
// ============================================================================
//
// CashMovement is append-only: postings are never edited or deleted, and a
// correction is a new movement in the opposite direction. OrderPayment is
// the mutable head record whose status transitions drive the postings.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayment {
    pub tenant_id: Uuid,
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: PaymentMethod,
    /// Amount charged to the customer, in minor currency units.
    pub amount_cents: i64,
    /// Acquirer/processor fee, posted as an out/fee movement when > 0.
    pub fee_cents: i64,
    pub status: PaymentStatus,
    /// Set exactly once, on the transition into Paid.
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderPayment {
    pub fn new(
        tenant_id: Uuid,
        order_id: Uuid,
        method: PaymentMethod,
        amount_cents: i64,
        fee_cents: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            id: Uuid::new_v4(),
            order_id,
            method,
            amount_cents,
            fee_cents,
            status: PaymentStatus::Pending,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One signed, append-only ledger posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashMovement {
    pub tenant_id: Uuid,
    pub id: Uuid,
    pub movement_type: CashMovementType,
    pub category: CashCategory,
    /// Always positive; direction comes from movement_type.
    pub amount_cents: i64,
    pub reference_type: ReferenceType,
    pub reference_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    pub fn for_payment(
        payment: &OrderPayment,
        movement_type: CashMovementType,
        category: CashCategory,
        amount_cents: i64,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id: payment.tenant_id,
            id: Uuid::new_v4(),
            movement_type,
            category,
            amount_cents,
            reference_type: ReferenceType::Payment,
            reference_id: payment.id,
            description: description.into(),
            created_at: now,
        }
    }

    /// Signed effect on the cash balance.
    pub fn signed_amount(&self) -> i64 {
        match self.movement_type {
            CashMovementType::In => self.amount_cents,
            CashMovementType::Out => -self.amount_cents,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_starts_pending() {
        let payment = OrderPayment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            PaymentMethod::Pix,
            4000,
            0,
            Utc::now(),
        );
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.paid_at.is_none());
    }

    #[test]
    fn test_movement_sign_follows_direction() {
        let payment = OrderPayment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            PaymentMethod::Cash,
            4000,
            0,
            Utc::now(),
        );
        let inflow = CashMovement::for_payment(
            &payment,
            CashMovementType::In,
            CashCategory::Sale,
            4000,
            "order sale",
            Utc::now(),
        );
        let outflow = CashMovement::for_payment(
            &payment,
            CashMovementType::Out,
            CashCategory::Refund,
            4000,
            "refund",
            Utc::now(),
        );
        assert_eq!(inflow.signed_amount(), 4000);
        assert_eq!(outflow.signed_amount(), -4000);
        assert_eq!(inflow.reference_id, payment.id);
    }
}
