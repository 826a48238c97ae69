use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{AppliedModifier, OrderStatus, OrderType, Station};
use crate::error::FulfillmentError;

// ============================================================================
// Order Entities
// ============================================================================
//
// The in-memory representation of an order and its lines. Identity is
// (tenant_id, id); every store access is additionally filtered by tenant.
// Status is mutated only through the state machine, and the per-station
// readiness bookkeeping only through the production aggregator.
//
// ============================================================================

/// A single order line. Created once at intake and immutable afterwards,
/// except that the production aggregator reads its station assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_reference: String,
    pub quantity: i32,
    /// Unit price in minor currency units, before modifier deltas.
    pub unit_price: i64,
    pub applied_modifiers: Vec<AppliedModifier>,
    pub production_station: Station,
}

impl OrderLine {
    /// Line total in minor units: (unit price + modifier deltas) × quantity.
    pub fn total(&self) -> i64 {
        let per_unit: i64 = self.unit_price
            + self
                .applied_modifiers
                .iter()
                .map(|m| m.price_delta)
                .sum::<i64>();
        per_unit * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub tenant_id: Uuid,
    pub id: Uuid,
    pub customer_name: String,
    /// Contact for notifications. Walk-in and table orders often have none.
    pub customer_phone: Option<String>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    /// Total in minor currency units, fixed at intake.
    pub total_amount: i64,
    pub estimated_minutes: Option<u32>,
    /// Stations that reported ready so far. Grows monotonically until the
    /// order reaches Ready.
    pub ready_production_areas: BTreeSet<Station>,
    /// Set exactly once, on the transition into Ready.
    pub ready_at: Option<DateTime<Utc>>,
    /// Set exactly once, on the transition into OutForDelivery.
    pub start_delivery_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// The stations this order needs a ready signal from, derived from the
    /// distinct station assignments of its lines.
    pub fn required_production_areas(&self) -> BTreeSet<Station> {
        self.lines
            .iter()
            .map(|line| line.production_station.clone())
            .collect()
    }

    pub fn has_items_for(&self, station: &Station) -> bool {
        self.lines
            .iter()
            .any(|line| &line.production_station == station)
    }

    /// True once every required station has reported ready.
    pub fn all_stations_ready(&self) -> bool {
        self.required_production_areas()
            .iter()
            .all(|s| self.ready_production_areas.contains(s))
    }
}

// ============================================================================
// Intake Drafts
// ============================================================================

/// A line as the triggering flow submits it. Station names arrive raw and
/// are normalized during validation.
#[derive(Debug, Clone)]
pub struct LineDraft {
    pub product_reference: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub applied_modifiers: Vec<AppliedModifier>,
    pub production_station: String,
}

#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub order_type: OrderType,
    pub estimated_minutes: Option<u32>,
    pub lines: Vec<LineDraft>,
}

impl OrderDraft {
    /// Validate the draft and build the order in its initial Received
    /// status. Rejections here are `Validation` errors; nothing has been
    /// persisted yet.
    pub fn into_order(self, tenant_id: Uuid, now: DateTime<Utc>) -> Result<Order, FulfillmentError> {
        if self.lines.is_empty() {
            return Err(FulfillmentError::Validation(
                "order must have at least one line".to_string(),
            ));
        }

        let mut lines = Vec::with_capacity(self.lines.len());
        for draft in self.lines {
            if draft.quantity <= 0 {
                return Err(FulfillmentError::Validation(format!(
                    "invalid quantity {} for product {}",
                    draft.quantity, draft.product_reference
                )));
            }
            if draft.product_reference.trim().is_empty() {
                return Err(FulfillmentError::Validation(
                    "line is missing its product reference".to_string(),
                ));
            }
            lines.push(OrderLine {
                product_reference: draft.product_reference,
                quantity: draft.quantity,
                unit_price: draft.unit_price,
                applied_modifiers: draft.applied_modifiers,
                production_station: Station::new(&draft.production_station)?,
            });
        }

        let total_amount = lines.iter().map(OrderLine::total).sum();

        Ok(Order {
            tenant_id,
            id: Uuid::new_v4(),
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            order_type: self.order_type,
            status: OrderStatus::Received,
            total_amount,
            estimated_minutes: self.estimated_minutes,
            ready_production_areas: BTreeSet::new(),
            ready_at: None,
            start_delivery_at: None,
            created_at: now,
            updated_at: now,
            lines,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
