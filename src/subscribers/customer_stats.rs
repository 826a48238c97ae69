use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::bus::{EventName, OrderEventPayload, Subscriber};

// ============================================================================
// Customer Stats Projector
// ============================================================================
//
// Keeps per-customer aggregates current as lifecycle events arrive, keyed
// by (tenant, phone). Orders without a phone cannot be attributed to a
// returning customer and are skipped. The dashboard layer reads the
// aggregates through `stats_for`; this projection never writes back to the
// order store.
//
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerStats {
    pub orders_placed: u64,
    pub orders_delivered: u64,
    /// Minor currency units across delivered orders.
    pub total_spent_cents: i64,
    pub last_order_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct CustomerStatsProjector {
    stats: RwLock<HashMap<(Uuid, String), CustomerStats>>,
}

impl CustomerStatsProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats_for(&self, tenant_id: Uuid, phone: &str) -> Option<CustomerStats> {
        self.stats
            .read()
            .expect("stats lock poisoned")
            .get(&(tenant_id, phone.to_string()))
            .cloned()
    }
}

impl Subscriber for CustomerStatsProjector {
    fn name(&self) -> &'static str {
        "customer_stats_projector"
    }

    fn on_event(&self, event: EventName, payload: &OrderEventPayload) -> anyhow::Result<()> {
        let Some(phone) = payload.customer_phone.as_deref() else {
            tracing::debug!(
                order_id = %payload.order_id,
                "Order has no customer phone, not counted in customer stats"
            );
            return Ok(());
        };

        let mut stats = self.stats.write().expect("stats lock poisoned");
        let entry = stats
            .entry((payload.tenant_id, phone.to_string()))
            .or_default();

        match event {
            EventName::OrderCreated => {
                entry.orders_placed += 1;
                entry.last_order_at = Some(Utc::now());
            }
            EventName::OrderDelivered => {
                entry.orders_delivered += 1;
                entry.total_spent_cents += payload.total_amount;
            }
            _ => {}
        }

        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::value_objects::{OrderStatus, OrderType};

    fn payload(tenant: Uuid, phone: Option<&str>, status: OrderStatus) -> OrderEventPayload {
        OrderEventPayload {
            order_id: Uuid::new_v4(),
            tenant_id: tenant,
            status,
            previous_status: None,
            customer_name: "Ana".to_string(),
            customer_phone: phone.map(str::to_string),
            total_amount: 5000,
            estimated_minutes: None,
            delivery_type: OrderType::Delivery,
        }
    }

    #[test]
    fn test_projects_placed_and_delivered() {
        let projector = CustomerStatsProjector::new();
        let tenant = Uuid::new_v4();
        let phone = "+5511988887777";

        projector
            .on_event(
                EventName::OrderCreated,
                &payload(tenant, Some(phone), OrderStatus::Received),
            )
            .unwrap();
        projector
            .on_event(
                EventName::OrderDelivered,
                &payload(tenant, Some(phone), OrderStatus::Delivered),
            )
            .unwrap();

        let stats = projector.stats_for(tenant, phone).unwrap();
        assert_eq!(stats.orders_placed, 1);
        assert_eq!(stats.orders_delivered, 1);
        assert_eq!(stats.total_spent_cents, 5000);
        assert!(stats.last_order_at.is_some());
    }

    #[test]
    fn test_stats_are_tenant_scoped() {
        let projector = CustomerStatsProjector::new();
        let tenant = Uuid::new_v4();
        let phone = "+5511988887777";

        projector
            .on_event(
                EventName::OrderCreated,
                &payload(tenant, Some(phone), OrderStatus::Received),
            )
            .unwrap();

        assert!(projector.stats_for(tenant, phone).is_some());
        assert!(projector.stats_for(Uuid::new_v4(), phone).is_none());
    }

    #[test]
    fn test_anonymous_orders_are_skipped() {
        let projector = CustomerStatsProjector::new();
        let tenant = Uuid::new_v4();

        projector
            .on_event(
                EventName::OrderCreated,
                &payload(tenant, None, OrderStatus::Received),
            )
            .unwrap();

        assert!(projector.stats.read().unwrap().is_empty());
    }
}
