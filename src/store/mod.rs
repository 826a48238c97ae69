pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::inventory::entities::{InventoryItem, InventoryMovement};
use crate::domain::inventory::value_objects::{MovementReason, MovementType, Recipe};
use crate::domain::order::entities::Order;
use crate::domain::payments::entities::{CashMovement, OrderPayment};
use crate::domain::payments::value_objects::{CashCategory, ReferenceType};

pub use memory::InMemoryStore;

// ============================================================================
// Order Store - Persistence Boundary
// ============================================================================
//
// The engine's only door to persistence. Every operation is tenant-scoped;
// an id from another tenant behaves exactly like an absent row. Absent rows
// come back as Ok(None), never as errors - Err is reserved for the store
// itself failing.
//
// Movement tables (inventory and cash) are append-only: the trait exposes
// insert and query, deliberately no update or delete.
//
// ============================================================================

/// Query shape for [`OrderStore::find_inventory_movement`]. Fields left as
/// None do not constrain the search.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub movement_type: Option<MovementType>,
    pub reason: Option<MovementReason>,
    pub order_id: Option<Uuid>,
    pub inventory_item_id: Option<Uuid>,
}

impl MovementFilter {
    /// The idempotency probe for stock consumption: any OUT/sale movement
    /// already recorded for this order.
    pub fn sale_for_order(order_id: Uuid) -> Self {
        Self {
            movement_type: Some(MovementType::Out),
            reason: Some(MovementReason::Sale),
            order_id: Some(order_id),
            inventory_item_id: None,
        }
    }

    pub fn matches(&self, movement: &InventoryMovement) -> bool {
        self.movement_type
            .map_or(true, |t| movement.movement_type == t)
            && self.reason.map_or(true, |r| movement.reason == r)
            && self
                .order_id
                .map_or(true, |id| movement.order_id == Some(id))
            && self
                .inventory_item_id
                .map_or(true, |id| movement.inventory_item_id == id)
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    // --- Orders ---
    async fn insert_order(&self, order: &Order) -> Result<()>;
    async fn get_order(&self, tenant_id: Uuid, order_id: Uuid) -> Result<Option<Order>>;
    async fn update_order(&self, order: &Order) -> Result<()>;

    // --- Payments ---
    async fn insert_payment(&self, payment: &OrderPayment) -> Result<()>;
    async fn get_payment(&self, tenant_id: Uuid, payment_id: Uuid)
        -> Result<Option<OrderPayment>>;
    async fn update_payment(&self, payment: &OrderPayment) -> Result<()>;

    // --- Inventory ---
    async fn get_inventory_item(
        &self,
        tenant_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<InventoryItem>>;
    async fn find_inventory_movement(
        &self,
        tenant_id: Uuid,
        filter: &MovementFilter,
    ) -> Result<Option<InventoryMovement>>;
    async fn insert_inventory_movement(&self, movement: &InventoryMovement) -> Result<()>;
    /// Apply a signed delta to an item's stock level. Returns the updated
    /// item, or None when the item does not exist for this tenant.
    async fn update_inventory_stock(
        &self,
        tenant_id: Uuid,
        item_id: Uuid,
        delta: f64,
    ) -> Result<Option<InventoryItem>>;
    async fn list_inventory_movements(&self, tenant_id: Uuid) -> Result<Vec<InventoryMovement>>;

    // --- Bills of materials ---
    async fn product_recipe(
        &self,
        tenant_id: Uuid,
        product_reference: &str,
    ) -> Result<Option<Recipe>>;
    async fn modifier_recipe(
        &self,
        tenant_id: Uuid,
        group: &str,
        option: &str,
    ) -> Result<Option<Recipe>>;

    // --- Cash ledger ---
    async fn find_cash_movement(
        &self,
        tenant_id: Uuid,
        reference_type: ReferenceType,
        reference_id: Uuid,
        category: CashCategory,
    ) -> Result<Option<CashMovement>>;
    async fn insert_cash_movement(&self, movement: &CashMovement) -> Result<()>;
    async fn list_cash_movements(&self, tenant_id: Uuid) -> Result<Vec<CashMovement>>;
}
