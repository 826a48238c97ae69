use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::entities::{CashMovement, OrderPayment};
use super::value_objects::{CashCategory, CashMovementType, PaymentStatus, ReferenceType};
use crate::error::FulfillmentError;
use crate::metrics::Metrics;
use crate::store::OrderStore;

// ============================================================================
// Cash Ledger Applier
// ============================================================================
//
// Keeps the append-only cash ledger consistent with payment status. Every
// posting is guarded by a pre-write existence query on
// (reference_type, reference_id, category): the guard is checking, not
// conflict recovery, so a duplicate transition request finds the earlier
// posting and writes nothing.
//
// Posting rules:
// - pending → paid: in/sale for the amount, plus out/fee when fee_cents > 0
// - paid → refunded: out/refund for the amount
// - paid → canceled: out/adjustment reversal for the amount
// - pending → canceled: no posting, nothing ever entered the ledger
//
// ============================================================================

pub struct LedgerApplier {
    store: Arc<dyn OrderStore>,
    metrics: Arc<Metrics>,
}

impl LedgerApplier {
    pub fn new(store: Arc<dyn OrderStore>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    /// Move the payment to `target`, posting the guarded ledger movements the
    /// transition implies and persisting the updated payment. The mutated
    /// payment reflects the resulting status on return.
    pub async fn transition_payment(
        &self,
        payment: &mut OrderPayment,
        target: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<(), FulfillmentError> {
        if payment.status == target {
            return Ok(());
        }

        let previous = payment.status;
        match (previous, target) {
            (PaymentStatus::Pending, PaymentStatus::Paid) => {
                if payment.paid_at.is_none() {
                    payment.paid_at = Some(now);
                }
                self.post_guarded(
                    payment,
                    CashMovementType::In,
                    CashCategory::Sale,
                    payment.amount_cents,
                    format!("sale for order {}", payment.order_id),
                    now,
                )
                .await?;
                if payment.fee_cents > 0 {
                    self.post_guarded(
                        payment,
                        CashMovementType::Out,
                        CashCategory::Fee,
                        payment.fee_cents,
                        format!("processing fee for payment {}", payment.id),
                        now,
                    )
                    .await?;
                }
            }
            (PaymentStatus::Paid, PaymentStatus::Refunded) => {
                self.post_guarded(
                    payment,
                    CashMovementType::Out,
                    CashCategory::Refund,
                    payment.amount_cents,
                    format!("refund for payment {}", payment.id),
                    now,
                )
                .await?;
            }
            (PaymentStatus::Paid, PaymentStatus::Canceled) => {
                // The sale already hit the ledger; reverse it rather than
                // touching the original posting.
                self.post_guarded(
                    payment,
                    CashMovementType::Out,
                    CashCategory::Adjustment,
                    payment.amount_cents,
                    format!("cancellation reversal for payment {}", payment.id),
                    now,
                )
                .await?;
            }
            (PaymentStatus::Pending, PaymentStatus::Canceled) => {
                // Never paid, nothing to post.
            }
            (from, to) => {
                return Err(FulfillmentError::Conflict(format!(
                    "payment {} cannot move from {from} to {to}",
                    payment.id
                )));
            }
        }

        payment.status = target;
        payment.updated_at = now;
        self.store.update_payment(payment).await?;

        tracing::info!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            previous_status = %previous,
            new_status = %target,
            "Payment transitioned"
        );
        Ok(())
    }

    /// Post one movement unless a movement with the same
    /// (reference_type, reference_id, category) already exists.
    async fn post_guarded(
        &self,
        payment: &OrderPayment,
        movement_type: CashMovementType,
        category: CashCategory,
        amount_cents: i64,
        description: String,
        now: DateTime<Utc>,
    ) -> Result<(), FulfillmentError> {
        let existing = self
            .store
            .find_cash_movement(
                payment.tenant_id,
                ReferenceType::Payment,
                payment.id,
                category,
            )
            .await?;
        if existing.is_some() {
            tracing::debug!(
                payment_id = %payment.id,
                category = %category,
                "Ledger movement already posted, skipping"
            );
            self.metrics
                .ledger_already_posted
                .with_label_values(&[category.as_str()])
                .inc();
            return Ok(());
        }

        let movement = CashMovement::for_payment(
            payment,
            movement_type,
            category,
            amount_cents,
            description,
            now,
        );
        self.store.insert_cash_movement(&movement).await?;
        self.metrics.record_ledger_posting(category.as_str());

        tracing::info!(
            payment_id = %payment.id,
            category = %category,
            amount_cents = amount_cents,
            "Ledger movement posted"
        );
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
