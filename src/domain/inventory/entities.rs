use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{MovementReason, MovementType};

// ============================================================================
// Inventory Entities
// ============================================================================
//
// Stock levels are never edited directly: every change is a signed
// InventoryMovement, and the item's current_stock is updated together with
// the movement insert. Corrections are new, opposite-signed movements -
// movements themselves are append-only.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub tenant_id: Uuid,
    pub id: Uuid,
    pub name: String,
    /// On-hand quantity in the item's stock unit.
    pub current_stock: f64,
    /// Threshold below which a low-stock warning is logged on consumption.
    pub min_stock_level: f64,
    /// Cost per stock unit, in minor currency units.
    pub unit_cost: i64,
}

impl InventoryItem {
    pub fn is_below_minimum(&self) -> bool {
        self.current_stock <= self.min_stock_level
    }
}

/// An append-only record of stock entering or leaving an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMovement {
    pub tenant_id: Uuid,
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub movement_type: MovementType,
    /// Always positive; direction comes from movement_type.
    pub quantity: f64,
    pub reason: MovementReason,
    /// Present on Sale movements: the order that consumed the stock.
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl InventoryMovement {
    /// Build the OUT/sale movement for one ingredient of one order.
    pub fn sale_out(
        tenant_id: Uuid,
        inventory_item_id: Uuid,
        quantity: f64,
        order_id: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            id: Uuid::new_v4(),
            inventory_item_id,
            movement_type: MovementType::Out,
            quantity,
            reason: MovementReason::Sale,
            order_id: Some(order_id),
            created_at: now,
        }
    }

    /// Signed effect on current_stock.
    pub fn stock_delta(&self) -> f64 {
        match self.movement_type {
            MovementType::In => self.quantity,
            MovementType::Out => -self.quantity,
            MovementType::Adjust => self.quantity,
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
    fn test_sale_out_movement_shape() {
        let tenant = Uuid::new_v4();
        let item = Uuid::new_v4();
        let order = Uuid::new_v4();
        let movement = InventoryMovement::sale_out(tenant, item, 0.4, order, Utc::now());

        assert_eq!(movement.movement_type, MovementType::Out);
        assert_eq!(movement.reason, MovementReason::Sale);
        assert_eq!(movement.order_id, Some(order));
        assert!((movement.stock_delta() - (-0.4)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_low_stock_threshold() {
        let item = InventoryItem {
            tenant_id: Uuid::new_v4(),
            id: Uuid::new_v4(),
            name: "Queijo".to_string(),
            current_stock: 1.5,
            min_stock_level: 2.0,
            unit_cost: 3500,
        };
        assert!(item.is_below_minimum());
    }
}
