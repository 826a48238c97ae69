use uuid::Uuid;

use crate::domain::order::value_objects::{OrderStatus, Station};

// ============================================================================
// Fulfillment Errors - Shared taxonomy for all entry points
// ============================================================================
//
// Every rejection surfaced to the triggering layer (API, chat flow,
// storefront) is one of these. Side-effect skips and subscriber failures
// are NOT here on purpose: they are recovered locally and logged, never
// returned to the caller.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("cannot transition order from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("order {0} not found")]
    OrderNotFound(Uuid),

    #[error("payment {0} not found")]
    PaymentNotFound(Uuid),

    #[error("order {order_id} has no items for station {station}")]
    NoItemsForStation { order_id: Uuid, station: Station },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Coarse classification for the triggering layer (maps 1:1 to the
/// rejection categories callers are expected to branch on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidTransition,
    Conflict,
    NotFound,
    Internal,
}

impl FulfillmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FulfillmentError::Validation(_) => ErrorKind::Validation,
            FulfillmentError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            FulfillmentError::Conflict(_) => ErrorKind::Conflict,
            FulfillmentError::OrderNotFound(_)
            | FulfillmentError::PaymentNotFound(_)
            | FulfillmentError::NoItemsForStation { .. } => ErrorKind::NotFound,
            FulfillmentError::Store(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, FulfillmentError>;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = FulfillmentError::Validation("bad station".into());
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = FulfillmentError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Ready,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let err = FulfillmentError::OrderNotFound(Uuid::new_v4());
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_no_items_for_station_is_not_found() {
        let err = FulfillmentError::NoItemsForStation {
            order_id: Uuid::new_v4(),
            station: Station::new("BAR").unwrap(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("BAR"));
    }
}
