use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::bus::{EventBus, EventName, OrderEventPayload};
use crate::domain::inventory::stock::StockApplier;
use crate::domain::order::entities::{Order, OrderDraft};
use crate::domain::order::production;
use crate::domain::order::state_machine::{apply_transition, TransitionOutcome};
use crate::domain::order::value_objects::{OrderStatus, Station};
use crate::domain::payments::entities::OrderPayment;
use crate::domain::payments::ledger::LedgerApplier;
use crate::domain::payments::value_objects::{PaymentMethod, PaymentStatus};
use crate::error::{FulfillmentError, Result};
use crate::metrics::Metrics;
use crate::store::OrderStore;

// ============================================================================
// Fulfillment Engine
// ============================================================================
//
// The entry points the triggering layer (API, chat flow, storefront) calls.
// Every operation follows the same request-scoped sequence:
//
//   load (tenant-scoped) → domain decision → store write → side effects
//   → event emission
//
// Side effects and emission run strictly after the write; if the request
// aborts earlier, nothing downstream has happened. There is no cross-
// request ordering: two concurrent requests against the same order race at
// the store, and the idempotency guards in the appliers are the only
// defense against duplicated side effects.
//
// Raw status and station labels from callers are normalized here, before
// anything is loaded or mutated.
//
// ============================================================================

pub struct FulfillmentEngine {
    store: Arc<dyn OrderStore>,
    bus: Arc<EventBus>,
    stock: StockApplier,
    ledger: LedgerApplier,
    metrics: Arc<Metrics>,
}

impl FulfillmentEngine {
    pub fn new(store: Arc<dyn OrderStore>, bus: Arc<EventBus>, metrics: Arc<Metrics>) -> Self {
        Self {
            stock: StockApplier::new(store.clone(), metrics.clone()),
            ledger: LedgerApplier::new(store.clone(), metrics.clone()),
            store,
            bus,
            metrics,
        }
    }

    /// Validate and persist a new order in `RECEIVED`, emitting
    /// `order.created`.
    pub async fn create_order(&self, tenant_id: Uuid, draft: OrderDraft) -> Result<Order> {
        let order = draft.into_order(tenant_id, Utc::now())?;
        self.store.insert_order(&order).await?;
        self.metrics.orders_created.inc();

        tracing::info!(
            order_id = %order.id,
            tenant_id = %tenant_id,
            total_amount = order.total_amount,
            lines = order.lines.len(),
            "Order created"
        );

        self.bus.emit(
            EventName::OrderCreated,
            &OrderEventPayload::from_order(&order, None),
        );
        Ok(order)
    }

    /// Open a pending payment for an order, charged at the order total.
    pub async fn register_payment(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        method: PaymentMethod,
        fee_cents: i64,
    ) -> Result<OrderPayment> {
        let order = self.load_order(tenant_id, order_id).await?;
        let payment = OrderPayment::new(
            tenant_id,
            order.id,
            method,
            order.total_amount,
            fee_cents,
            Utc::now(),
        );
        self.store.insert_payment(&payment).await?;

        tracing::info!(
            payment_id = %payment.id,
            order_id = %order.id,
            amount_cents = payment.amount_cents,
            "Payment registered"
        );
        Ok(payment)
    }

    /// Move an order to the requested status. `target` accepts canonical
    /// labels and legacy aliases ("PRONTO" lands on READY).
    pub async fn request_order_transition(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        target: &str,
    ) -> Result<OrderStatus> {
        let target = OrderStatus::parse(target)?;
        let mut order = self.load_order(tenant_id, order_id).await?;

        let outcome = apply_transition(&mut order, target, Utc::now())?;
        if !outcome.changed {
            return Ok(outcome.current);
        }

        self.store.update_order(&order).await?;
        self.finish_transition(&order, outcome).await;
        Ok(outcome.current)
    }

    /// A production station starts working on its part of the order.
    pub async fn station_start(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        station: &str,
    ) -> Result<OrderStatus> {
        let station = Station::new(station)?;
        let mut order = self.load_order(tenant_id, order_id).await?;

        let outcome = production::station_start(&mut order, &station, Utc::now())?;
        if outcome.changed {
            self.store.update_order(&order).await?;
            self.finish_transition(&order, outcome).await;
        }
        Ok(outcome.current)
    }

    /// A production station reports its part of the order ready.
    pub async fn station_mark_ready(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        station: &str,
    ) -> Result<OrderStatus> {
        let station = Station::new(station)?;
        let mut order = self.load_order(tenant_id, order_id).await?;

        let outcome = production::station_mark_ready(&mut order, &station, Utc::now())?;
        if outcome.transition.changed || outcome.station_recorded {
            self.store.update_order(&order).await?;
        }
        if outcome.transition.changed {
            self.finish_transition(&order, outcome.transition).await;
        }
        Ok(outcome.transition.current)
    }

    /// Move a payment to the requested status, posting the guarded ledger
    /// movements the transition implies.
    pub async fn transition_payment(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
        target: &str,
    ) -> Result<PaymentStatus> {
        let target = PaymentStatus::parse(target)?;
        let mut payment = self
            .store
            .get_payment(tenant_id, payment_id)
            .await?
            .ok_or(FulfillmentError::PaymentNotFound(payment_id))?;

        self.ledger
            .transition_payment(&mut payment, target, Utc::now())
            .await?;
        Ok(payment.status)
    }

    async fn load_order(&self, tenant_id: Uuid, order_id: Uuid) -> Result<Order> {
        self.store
            .get_order(tenant_id, order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))
    }

    /// Side effects and emission for an effective transition, after the
    /// order write committed. Failures in here are logged and swallowed:
    /// the caller only ever sees the state-machine outcome.
    async fn finish_transition(&self, order: &Order, outcome: TransitionOutcome) {
        self.metrics.record_transition(outcome.current.as_str());
        tracing::info!(
            order_id = %order.id,
            previous_status = %outcome.previous,
            new_status = %outcome.current,
            "Order status changed"
        );

        if outcome.current == OrderStatus::Delivered {
            if let Err(error) = self.stock.apply_stock_for_order(order).await {
                tracing::error!(
                    order_id = %order.id,
                    error = %error,
                    "Stock application failed; order transition stands"
                );
            }
        }

        self.bus.emit(
            EventName::OrderStatusChanged,
            &OrderEventPayload::from_order(order, Some(outcome.previous)),
        );
    }
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{EventBusBuilder, Subscriber};
    use crate::domain::inventory::entities::InventoryItem;
    use crate::domain::inventory::value_objects::{
        MovementReason, MovementType, Recipe, RecipeLine,
    };
    use crate::domain::order::entities::LineDraft;
    use crate::domain::order::value_objects::OrderType;
    use crate::error::ErrorKind;
    use crate::store::InMemoryStore;
    use std::sync::Mutex;

    struct EventLog {
        events: Arc<Mutex<Vec<(String, OrderStatus)>>>,
    }

    impl Subscriber for EventLog {
        fn name(&self) -> &'static str {
            "event_log"
        }

        fn on_event(&self, event: EventName, payload: &OrderEventPayload) -> anyhow::Result<()> {
            self.events
                .lock()
                .unwrap()
                .push((event.as_str().to_string(), payload.status));
            Ok(())
        }
    }

    struct Fixture {
        engine: FulfillmentEngine,
        store: Arc<InMemoryStore>,
        tenant: Uuid,
        events: Arc<Mutex<Vec<(String, OrderStatus)>>>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let events = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::new(EventLog {
            events: events.clone(),
        });
        let bus = Arc::new(
            EventBusBuilder::new(metrics.clone())
                .subscribe(EventName::OrderCreated, log.clone())
                .subscribe(EventName::OrderStatusChanged, log)
                .build(),
        );

        let engine = FulfillmentEngine::new(store.clone(), bus, metrics);
        Fixture {
            engine,
            store,
            tenant: Uuid::new_v4(),
            events,
        }
    }

    fn split_station_draft() -> OrderDraft {
        OrderDraft {
            customer_name: "Ana".to_string(),
            customer_phone: Some("+5511999990000".to_string()),
            order_type: OrderType::Delivery,
            estimated_minutes: Some(40),
            lines: vec![
                LineDraft {
                    product_reference: "x-burger".to_string(),
                    quantity: 1,
                    unit_price: 2500,
                    applied_modifiers: vec![],
                    production_station: "COZINHA".to_string(),
                },
                LineDraft {
                    product_reference: "caipirinha".to_string(),
                    quantity: 1,
                    unit_price: 1500,
                    applied_modifiers: vec![],
                    production_station: "BAR".to_string(),
                },
            ],
        }
    }

    async fn stored_order(f: &Fixture, order_id: Uuid) -> Order {
        f.store
            .get_order(f.tenant, order_id)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_split_station_readiness_scenario() {
        let f = fixture().await;
        let order = f
            .engine
            .create_order(f.tenant, split_station_draft())
            .await
            .unwrap();

        let status = f
            .engine
            .station_mark_ready(f.tenant, order.id, "COZINHA")
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::Preparing);

        let status = f
            .engine
            .station_mark_ready(f.tenant, order.id, "BAR")
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::Ready);

        let stored = stored_order(&f, order.id).await;
        assert!(stored.ready_at.is_some());
        assert_eq!(stored.ready_production_areas.len(), 2);
    }

    #[tokio::test]
    async fn test_full_lifecycle_emits_in_order() {
        let f = fixture().await;
        let order = f
            .engine
            .create_order(f.tenant, split_station_draft())
            .await
            .unwrap();

        f.engine
            .station_mark_ready(f.tenant, order.id, "cozinha")
            .await
            .unwrap();
        f.engine
            .station_mark_ready(f.tenant, order.id, "BAR")
            .await
            .unwrap();
        f.engine
            .request_order_transition(f.tenant, order.id, "OUT_FOR_DELIVERY")
            .await
            .unwrap();
        f.engine
            .request_order_transition(f.tenant, order.id, "DELIVERED")
            .await
            .unwrap();

        let events = f.events.lock().unwrap();
        let names: Vec<_> = events.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "order.created",
                "order.status.changed", // Preparing
                "order.status.changed", // Ready
                "order.status.changed", // OutForDelivery
                "order.status.changed", // Delivered
            ]
        );
    }

    #[tokio::test]
    async fn test_legacy_alias_normalized_at_entry() {
        let f = fixture().await;
        let order = f
            .engine
            .create_order(f.tenant, split_station_draft())
            .await
            .unwrap();

        let status = f
            .engine
            .request_order_transition(f.tenant, order.id, "PRONTO")
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::Ready);
    }

    #[tokio::test]
    async fn test_cancel_after_ready_then_dispatch_conflicts() {
        let f = fixture().await;
        let order = f
            .engine
            .create_order(f.tenant, split_station_draft())
            .await
            .unwrap();

        f.engine
            .request_order_transition(f.tenant, order.id, "READY")
            .await
            .unwrap();
        let status = f
            .engine
            .request_order_transition(f.tenant, order.id, "CANCELED")
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::Canceled);

        let err = f
            .engine
            .request_order_transition(f.tenant, order.id, "OUT_FOR_DELIVERY")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_unknown_order_and_tenant_isolation() {
        let f = fixture().await;
        let order = f
            .engine
            .create_order(f.tenant, split_station_draft())
            .await
            .unwrap();

        let err = f
            .engine
            .request_order_transition(f.tenant, Uuid::new_v4(), "READY")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // The right id under the wrong tenant is just as absent.
        let err = f
            .engine
            .request_order_transition(Uuid::new_v4(), order.id, "READY")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_station_signals_reject_unknown_station() {
        let f = fixture().await;
        let order = f
            .engine
            .create_order(f.tenant, split_station_draft())
            .await
            .unwrap();

        let err = f
            .engine
            .station_start(f.tenant, order.id, "CAIXA")
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::NoItemsForStation { .. }));

        let err = f
            .engine
            .station_mark_ready(f.tenant, order.id, "  ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_duplicate_payment_scenario() {
        let f = fixture().await;
        let mut draft = split_station_draft();
        draft.lines.truncate(1);
        draft.lines[0].unit_price = 4000;
        let order = f.engine.create_order(f.tenant, draft).await.unwrap();
        assert_eq!(order.total_amount, 4000);

        let payment = f
            .engine
            .register_payment(f.tenant, order.id, PaymentMethod::Pix, 0)
            .await
            .unwrap();

        f.engine
            .transition_payment(f.tenant, payment.id, "paid")
            .await
            .unwrap();
        let status = f
            .engine
            .transition_payment(f.tenant, payment.id, "paid")
            .await
            .unwrap();
        assert_eq!(status, PaymentStatus::Paid);

        let movements = f.store.list_cash_movements(f.tenant).await.unwrap();
        let total: i64 = movements.iter().map(|m| m.signed_amount()).sum();
        assert_eq!(total, 4000);
        assert_eq!(movements.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_payment_status_is_validation() {
        let f = fixture().await;
        let err = f
            .engine
            .transition_payment(f.tenant, Uuid::new_v4(), "disputed")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_delivery_applies_stock_exactly_once() {
        let f = fixture().await;
        let item_id = Uuid::new_v4();
        f.store
            .seed_inventory_item(InventoryItem {
                tenant_id: f.tenant,
                id: item_id,
                name: "Carne".to_string(),
                current_stock: 20.0,
                min_stock_level: 2.0,
                unit_cost: 3000,
            })
            .await;
        f.store
            .seed_product_recipe(
                f.tenant,
                "x-burger",
                Recipe::new(vec![RecipeLine {
                    inventory_item_id: item_id,
                    quantity: 0.2,
                }]),
            )
            .await;

        let order = f
            .engine
            .create_order(f.tenant, split_station_draft())
            .await
            .unwrap();
        f.engine
            .request_order_transition(f.tenant, order.id, "READY")
            .await
            .unwrap();
        f.engine
            .request_order_transition(f.tenant, order.id, "OUT_FOR_DELIVERY")
            .await
            .unwrap();
        f.engine
            .request_order_transition(f.tenant, order.id, "DELIVERED")
            .await
            .unwrap();
        // Retried delivery confirmation is a no-op, not a second deduction.
        f.engine
            .request_order_transition(f.tenant, order.id, "DELIVERED")
            .await
            .unwrap();

        let movements = f.store.list_inventory_movements(f.tenant).await.unwrap();
        let sales: Vec<_> = movements
            .iter()
            .filter(|m| m.movement_type == MovementType::Out && m.reason == MovementReason::Sale)
            .collect();
        assert_eq!(sales.len(), 1);

        let item = f
            .store
            .get_inventory_item(f.tenant, item_id)
            .await
            .unwrap()
            .unwrap();
        assert!((item.current_stock - 19.8).abs() < 1e-9);
    }
}
