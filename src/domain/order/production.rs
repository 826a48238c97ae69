use chrono::{DateTime, Utc};

use super::entities::Order;
use super::state_machine::{apply_transition, TransitionOutcome};
use super::value_objects::{OrderStatus, Station};
use crate::error::FulfillmentError;

// ============================================================================
// Production Readiness Aggregator
// ============================================================================
//
// An order's lines can be split across independent stations (kitchen, bar,
// counter) that report progress asynchronously and in any order. This
// module folds those per-station signals into the single order-level
// decision: the order is Ready exactly when every required station has
// reported ready.
//
// Readiness is a monotone set union, not a counter: a duplicate or
// out-of-order signal from the same station is absorbed by the set and can
// never flip the order ready early by double-counting.
//
// ============================================================================

/// Result of a station signal: the (possibly unchanged) status transition
/// plus whether the ready-set actually grew, so the caller knows whether
/// the order needs persisting even without a status change.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessOutcome {
    pub transition: TransitionOutcome,
    pub station_recorded: bool,
}

/// A station starts working on its part of the order.
///
/// Nudges a Received order into Preparing; repeating the signal while
/// Preparing is a no-op. Orders already Ready or further along reject the
/// signal as a progress conflict.
pub fn station_start(
    order: &mut Order,
    station: &Station,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, FulfillmentError> {
    ensure_station_has_items(order, station)?;

    match order.status {
        OrderStatus::Received => apply_transition(order, OrderStatus::Preparing, now),
        OrderStatus::Preparing => Ok(TransitionOutcome {
            previous: OrderStatus::Preparing,
            current: OrderStatus::Preparing,
            changed: false,
        }),
        status => Err(FulfillmentError::Conflict(format!(
            "station {station} cannot start on order {}: already {status}",
            order.id
        ))),
    }
}

/// A station reports its part of the order ready.
///
/// Records the station in the order's ready set (idempotently) and, once
/// the set covers every required station - and only then - promotes the
/// order to Ready. A partial report on a Received order implies work has
/// started, so the order is nudged to Preparing.
pub fn station_mark_ready(
    order: &mut Order,
    station: &Station,
    now: DateTime<Utc>,
) -> Result<ReadinessOutcome, FulfillmentError> {
    ensure_station_has_items(order, station)?;

    if matches!(
        order.status,
        OrderStatus::OutForDelivery | OrderStatus::Delivered | OrderStatus::Canceled
    ) {
        return Err(FulfillmentError::Conflict(format!(
            "station {station} cannot mark order {} ready: already {}",
            order.id, order.status
        )));
    }

    let station_recorded = order.ready_production_areas.insert(station.clone());
    if station_recorded {
        order.updated_at = now;
    }

    let transition = if order.all_stations_ready() {
        apply_transition(order, OrderStatus::Ready, now)?
    } else if order.status == OrderStatus::Received {
        apply_transition(order, OrderStatus::Preparing, now)?
    } else {
        TransitionOutcome {
            previous: order.status,
            current: order.status,
            changed: false,
        }
    };

    Ok(ReadinessOutcome {
        transition,
        station_recorded,
    })
}

fn ensure_station_has_items(order: &Order, station: &Station) -> Result<(), FulfillmentError> {
    if order.has_items_for(station) {
        Ok(())
    } else {
        Err(FulfillmentError::NoItemsForStation {
            order_id: order.id,
            station: station.clone(),
        })
    }
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

    fn kitchen() -> Station {
        Station::new("COZINHA").unwrap()
    }

    fn bar() -> Station {
        Station::new("BAR").unwrap()
    }

    fn line(product: &str, station: &str) -> LineDraft {
        LineDraft {
            product_reference: product.to_string(),
            quantity: 1,
            unit_price: 1000,
            applied_modifiers: vec![],
            production_station: station.to_string(),
        }
    }

    fn two_station_order() -> Order {
        OrderDraft {
            customer_name: "Bea".to_string(),
            customer_phone: None,
            order_type: OrderType::Pickup,
            estimated_minutes: None,
            lines: vec![line("x-salada", "COZINHA"), line("suco", "BAR")],
        }
        .into_order(Uuid::new_v4(), Utc::now())
        .unwrap()
    }

    #[test]
    fn test_start_moves_received_to_preparing_once() {
        let mut order = two_station_order();
        let outcome = station_start(&mut order, &kitchen(), Utc::now()).unwrap();
        assert!(outcome.changed);
        assert_eq!(order.status, OrderStatus::Preparing);

        let outcome = station_start(&mut order, &bar(), Utc::now()).unwrap();
        assert!(!outcome.changed);
        assert_eq!(order.status, OrderStatus::Preparing);
    }

    #[test]
    fn test_start_rejects_unknown_station() {
        let mut order = two_station_order();
        let err = station_start(&mut order, &Station::new("CAIXA").unwrap(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::NoItemsForStation { .. }));
        assert_eq!(order.status, OrderStatus::Received);
    }

    #[test]
    fn test_start_after_ready_is_conflict() {
        let mut order = two_station_order();
        station_mark_ready(&mut order, &kitchen(), Utc::now()).unwrap();
        station_mark_ready(&mut order, &bar(), Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Ready);

        let err = station_start(&mut order, &kitchen(), Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_ready_requires_every_station_in_any_order() {
        for (first, second) in [(kitchen(), bar()), (bar(), kitchen())] {
            let mut order = two_station_order();

            let outcome = station_mark_ready(&mut order, &first, Utc::now()).unwrap();
            assert!(outcome.station_recorded);
            assert_eq!(order.status, OrderStatus::Preparing);
            assert!(order.ready_at.is_none());

            let outcome = station_mark_ready(&mut order, &second, Utc::now()).unwrap();
            assert_eq!(outcome.transition.current, OrderStatus::Ready);
            assert!(order.ready_at.is_some());
        }
    }

    #[test]
    fn test_duplicate_ready_signals_are_absorbed() {
        let mut order = two_station_order();

        station_mark_ready(&mut order, &kitchen(), Utc::now()).unwrap();
        let dup = station_mark_ready(&mut order, &kitchen(), Utc::now()).unwrap();
        assert!(!dup.station_recorded);
        assert!(!dup.transition.changed);
        // One of two stations can never be enough, no matter how often it
        // repeats itself.
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.ready_production_areas.len(), 1);

        station_mark_ready(&mut order, &bar(), Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Ready);
    }

    #[test]
    fn test_single_station_order_goes_straight_to_ready() {
        let mut order = OrderDraft {
            customer_name: "Gil".to_string(),
            customer_phone: None,
            order_type: OrderType::Table,
            estimated_minutes: None,
            lines: vec![line("espresso", "BAR")],
        }
        .into_order(Uuid::new_v4(), Utc::now())
        .unwrap();

        let outcome = station_mark_ready(&mut order, &bar(), Utc::now()).unwrap();
        assert_eq!(outcome.transition.previous, OrderStatus::Received);
        assert_eq!(outcome.transition.current, OrderStatus::Ready);
    }

    #[test]
    fn test_mark_ready_after_dispatch_is_conflict() {
        let mut order = two_station_order();
        station_mark_ready(&mut order, &kitchen(), Utc::now()).unwrap();
        station_mark_ready(&mut order, &bar(), Utc::now()).unwrap();
        apply_transition(&mut order, OrderStatus::OutForDelivery, Utc::now()).unwrap();

        let err = station_mark_ready(&mut order, &kitchen(), Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_mark_ready_on_ready_order_stays_ready() {
        let mut order = two_station_order();
        station_mark_ready(&mut order, &kitchen(), Utc::now()).unwrap();
        station_mark_ready(&mut order, &bar(), Utc::now()).unwrap();
        let stamped = order.ready_at;

        let outcome = station_mark_ready(&mut order, &bar(), Utc::now()).unwrap();
        assert!(!outcome.transition.changed);
        assert_eq!(order.ready_at, stamped);
    }
}
