use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::entities::Order;
use crate::domain::order::value_objects::{OrderStatus, OrderType};
use crate::metrics::Metrics;

// ============================================================================
// Event Bus - In-Process Publish/Subscribe
// ============================================================================
//
// Synchronous fan-out from the engine to downstream projections. Emission
// runs in the caller's thread, in registration order, after the state
// write that produced the event has committed. Each subscriber call sits
// behind its own failure boundary: an Err from one subscriber is logged
// and counted, the remaining subscribers still run, and nothing propagates
// back to the emitter.
//
// The bus is built once at startup through EventBusBuilder and passed to
// the engine explicitly - there is no global instance. Subscriptions are
// static; nothing is added or removed at runtime.
//
// ============================================================================

/// The lifecycle events the engine emits. `OrderStatusChanged` additionally
/// fans out into `OrderReady` / `OrderDelivered` when the new status
/// matches, so subscribers pick whichever granularity they need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    OrderCreated,
    OrderStatusChanged,
    OrderReady,
    OrderDelivered,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::OrderCreated => "order.created",
            EventName::OrderStatusChanged => "order.status.changed",
            EventName::OrderReady => "order.ready",
            EventName::OrderDelivered => "order.delivered",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat event payload carried to every subscriber. Deliberately
/// self-contained: downstream projection must not need a second store
/// read. Contact fields are optionally empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEventPayload {
    pub order_id: Uuid,
    pub tenant_id: Uuid,
    pub status: OrderStatus,
    pub previous_status: Option<OrderStatus>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub total_amount: i64,
    pub estimated_minutes: Option<u32>,
    pub delivery_type: OrderType,
}

impl OrderEventPayload {
    pub fn from_order(order: &Order, previous_status: Option<OrderStatus>) -> Self {
        Self {
            order_id: order.id,
            tenant_id: order.tenant_id,
            status: order.status,
            previous_status,
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            total_amount: order.total_amount,
            estimated_minutes: order.estimated_minutes,
            delivery_type: order.order_type,
        }
    }
}

/// A downstream consumer of lifecycle events. Handlers run synchronously in
/// the emitter's thread; anything slow or fallible against the outside
/// world belongs on a background task the handler spawns itself.
pub trait Subscriber: Send + Sync {
    fn name(&self) -> &'static str;
    fn on_event(&self, event: EventName, payload: &OrderEventPayload) -> anyhow::Result<()>;
}

pub struct EventBusBuilder {
    subscribers: HashMap<EventName, Vec<Arc<dyn Subscriber>>>,
    metrics: Arc<Metrics>,
}

impl EventBusBuilder {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            subscribers: HashMap::new(),
            metrics,
        }
    }

    pub fn subscribe(mut self, event: EventName, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscribers.entry(event).or_default().push(subscriber);
        self
    }

    pub fn build(self) -> EventBus {
        EventBus {
            subscribers: self.subscribers,
            metrics: self.metrics,
        }
    }
}

pub struct EventBus {
    subscribers: HashMap<EventName, Vec<Arc<dyn Subscriber>>>,
    metrics: Arc<Metrics>,
}

impl EventBus {
    /// Emit an event to its subscribers, then fan out the derived event
    /// when a status change landed on Ready or Delivered.
    pub fn emit(&self, event: EventName, payload: &OrderEventPayload) {
        self.dispatch(event, payload);

        if event == EventName::OrderStatusChanged {
            match payload.status {
                OrderStatus::Ready => self.dispatch(EventName::OrderReady, payload),
                OrderStatus::Delivered => self.dispatch(EventName::OrderDelivered, payload),
                _ => {}
            }
        }
    }

    fn dispatch(&self, event: EventName, payload: &OrderEventPayload) {
        self.metrics.record_event(event.as_str());

        // No subscribers for an event is fine.
        let Some(subscribers) = self.subscribers.get(&event) else {
            return;
        };

        for subscriber in subscribers {
            if let Err(error) = subscriber.on_event(event, payload) {
                tracing::error!(
                    subscriber = subscriber.name(),
                    event = %event,
                    order_id = %payload.order_id,
                    error = %error,
                    "Subscriber failed, continuing with remaining subscribers"
                );
                self.metrics
                    .record_subscriber_failure(subscriber.name(), event.as_str());
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
