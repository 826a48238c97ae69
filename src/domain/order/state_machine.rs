use chrono::{DateTime, Utc};

use super::entities::Order;
use super::value_objects::OrderStatus;
use crate::error::FulfillmentError;

// ============================================================================
// Order State Machine
// ============================================================================
//
// The one place order status changes. Rules:
// - Forward moves along Received → Preparing → Ready → OutForDelivery →
//   Delivered, skipping intermediate statuses is allowed (a single-station
//   order can jump Received → Ready).
// - Delivered is only reachable from OutForDelivery.
// - Canceled is reachable from any non-terminal status.
// - Requesting the status the order already has is an idempotent no-op.
// - Terminal orders (Delivered, Canceled) reject every change.
// - ready_at / start_delivery_at are set exactly once, on first entry.
//
// Side effects and event emission are the engine's job, strictly after the
// store write; this module only decides and mutates the entity.
//
// ============================================================================

/// What a transition request did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub previous: OrderStatus,
    pub current: OrderStatus,
    /// False when the request was an idempotent repeat of the current
    /// status; no event should be emitted and no side effects run.
    pub changed: bool,
}

impl TransitionOutcome {
    fn unchanged(status: OrderStatus) -> Self {
        Self {
            previous: status,
            current: status,
            changed: false,
        }
    }
}

/// Apply a requested transition to the order, enforcing the forward-edge
/// rules above. On rejection the order is left untouched.
pub fn apply_transition(
    order: &mut Order,
    target: OrderStatus,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, FulfillmentError> {
    let current = order.status;

    // Idempotent repeat: a retried request of an applied transition must
    // converge, not fail, even on terminal orders.
    if target == current {
        return Ok(TransitionOutcome::unchanged(current));
    }

    // Dispatching a closed order is a progress conflict, whether it closed
    // by delivery or by cancellation.
    if current.is_terminal() && target == OrderStatus::OutForDelivery {
        return Err(FulfillmentError::Conflict(format!(
            "order {} is already {}",
            order.id, current
        )));
    }

    if current.is_terminal() {
        return Err(FulfillmentError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    match target {
        OrderStatus::Canceled => {}
        OrderStatus::Delivered => {
            if current != OrderStatus::OutForDelivery {
                return Err(FulfillmentError::Conflict(format!(
                    "order {} cannot be delivered before going out for delivery",
                    order.id
                )));
            }
        }
        _ => {
            // Both ranks exist here: target is on the linear path and
            // current is non-terminal, so only Canceled (handled above)
            // lacks one.
            let from = current.rank().unwrap_or(u8::MAX);
            let to = target.rank().unwrap_or(0);
            if to <= from {
                return Err(FulfillmentError::InvalidTransition {
                    from: current,
                    to: target,
                });
            }
        }
    }

    match target {
        OrderStatus::Ready => {
            if order.ready_at.is_none() {
                order.ready_at = Some(now);
            }
        }
        OrderStatus::OutForDelivery => {
            if order.start_delivery_at.is_none() {
                order.start_delivery_at = Some(now);
            }
        }
        _ => {}
    }

    order.status = target;
    order.updated_at = now;

    Ok(TransitionOutcome {
        previous: current,
        current: target,
        changed: true,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::entities::{LineDraft, OrderDraft};
    use crate::domain::order::value_objects::OrderType;
    use crate::error::ErrorKind;
    use uuid::Uuid;

    fn order() -> Order {
        OrderDraft {
            customer_name: "Rui".to_string(),
            customer_phone: None,
            order_type: OrderType::Delivery,
            estimated_minutes: None,
            lines: vec![LineDraft {
                product_reference: "feijoada".to_string(),
                quantity: 1,
                unit_price: 4200,
                applied_modifiers: vec![],
                production_station: "COZINHA".to_string(),
            }],
        }
        .into_order(Uuid::new_v4(), Utc::now())
        .unwrap()
    }

    fn advance(order: &mut Order, target: OrderStatus) -> TransitionOutcome {
        apply_transition(order, target, Utc::now()).unwrap()
    }

    #[test]
    fn test_full_forward_path() {
        let mut order = order();
        for target in [
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            let outcome = advance(&mut order, target);
            assert!(outcome.changed);
            assert_eq!(outcome.current, target);
        }
        assert!(order.ready_at.is_some());
        assert!(order.start_delivery_at.is_some());
    }

    #[test]
    fn test_skipping_forward_is_allowed() {
        let mut order = order();
        let outcome = advance(&mut order, OrderStatus::Ready);
        assert_eq!(outcome.previous, OrderStatus::Received);
        assert_eq!(outcome.current, OrderStatus::Ready);
        assert!(order.ready_at.is_some());
    }

    #[test]
    fn test_backward_is_rejected() {
        let mut order = order();
        advance(&mut order, OrderStatus::Ready);
        let err = apply_transition(&mut order, OrderStatus::Preparing, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(order.status, OrderStatus::Ready);
    }

    #[test]
    fn test_same_status_is_idempotent_noop() {
        let mut order = order();
        advance(&mut order, OrderStatus::Ready);
        let first_ready_at = order.ready_at;

        let outcome = advance(&mut order, OrderStatus::Ready);
        assert!(!outcome.changed);
        assert_eq!(order.ready_at, first_ready_at);

        // Also holds on terminal orders.
        advance(&mut order, OrderStatus::OutForDelivery);
        advance(&mut order, OrderStatus::Delivered);
        let outcome = advance(&mut order, OrderStatus::Delivered);
        assert!(!outcome.changed);
    }

    #[test]
    fn test_delivered_requires_out_for_delivery() {
        let mut order = order();
        advance(&mut order, OrderStatus::Ready);
        let err = apply_transition(&mut order, OrderStatus::Delivered, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_out_for_delivery_after_delivered_is_conflict() {
        let mut order = order();
        advance(&mut order, OrderStatus::Ready);
        advance(&mut order, OrderStatus::OutForDelivery);
        advance(&mut order, OrderStatus::Delivered);
        let err =
            apply_transition(&mut order, OrderStatus::OutForDelivery, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        for reached in [
            OrderStatus::Received,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery,
        ] {
            let mut order = order();
            if reached != OrderStatus::Received {
                advance(&mut order, reached);
            }
            let outcome = advance(&mut order, OrderStatus::Canceled);
            assert!(outcome.changed);
            assert_eq!(order.status, OrderStatus::Canceled);
        }
    }

    #[test]
    fn test_terminal_orders_reject_changes() {
        let mut order = order();
        advance(&mut order, OrderStatus::Canceled);
        let err = apply_transition(&mut order, OrderStatus::Preparing, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let err = apply_transition(&mut order, OrderStatus::Delivered, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_cancel_after_ready_then_ship_attempt_conflicts() {
        let mut order = order();
        advance(&mut order, OrderStatus::Ready);
        advance(&mut order, OrderStatus::Canceled);
        let err =
            apply_transition(&mut order, OrderStatus::OutForDelivery, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(order.status, OrderStatus::Canceled);
    }

    #[test]
    fn test_ready_at_not_overwritten_on_reentry_attempts() {
        let mut order = order();
        advance(&mut order, OrderStatus::Ready);
        let stamped = order.ready_at.unwrap();
        // A later Ready request is a no-op and must not touch the stamp.
        let _ = advance(&mut order, OrderStatus::Ready);
        assert_eq!(order.ready_at.unwrap(), stamped);
    }
}
