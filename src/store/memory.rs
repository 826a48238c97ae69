use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MovementFilter, OrderStore};
use crate::domain::inventory::entities::{InventoryItem, InventoryMovement};
use crate::domain::inventory::value_objects::Recipe;
use crate::domain::order::entities::Order;
use crate::domain::payments::entities::{CashMovement, OrderPayment};
use crate::domain::payments::value_objects::{CashCategory, ReferenceType};

// ============================================================================
// In-Memory Order Store
// ============================================================================
//
// Reference OrderStore used by the demo binary and the test suites. Every
// map is keyed by (tenant_id, ...) so cross-tenant reads come back as None
// just like they would against a real partitioned datastore.
//
// Individual operations are serialized by the RwLocks, but the store
// intentionally enforces NO uniqueness constraints across a guard-query and
// a later insert: the engine's idempotency is check-then-write, and this
// store reproduces exactly that guarantee, including its race window under
// concurrent callers.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryStore {
    orders: RwLock<HashMap<(Uuid, Uuid), Order>>,
    payments: RwLock<HashMap<(Uuid, Uuid), OrderPayment>>,
    inventory: RwLock<HashMap<(Uuid, Uuid), InventoryItem>>,
    inventory_movements: RwLock<Vec<InventoryMovement>>,
    cash_movements: RwLock<Vec<CashMovement>>,
    product_recipes: RwLock<HashMap<(Uuid, String), Recipe>>,
    modifier_recipes: RwLock<HashMap<(Uuid, String, String), Recipe>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers for demos and tests; not part of the OrderStore
    // boundary the engine sees.

    pub async fn seed_inventory_item(&self, item: InventoryItem) {
        self.inventory
            .write()
            .await
            .insert((item.tenant_id, item.id), item);
    }

    pub async fn seed_product_recipe(
        &self,
        tenant_id: Uuid,
        product_reference: &str,
        recipe: Recipe,
    ) {
        self.product_recipes
            .write()
            .await
            .insert((tenant_id, product_reference.to_string()), recipe);
    }

    pub async fn seed_modifier_recipe(
        &self,
        tenant_id: Uuid,
        group: &str,
        option: &str,
        recipe: Recipe,
    ) {
        self.modifier_recipes
            .write()
            .await
            .insert((tenant_id, group.to_string(), option.to_string()), recipe);
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        self.orders
            .write()
            .await
            .insert((order.tenant_id, order.id), order.clone());
        Ok(())
    }

    async fn get_order(&self, tenant_id: Uuid, order_id: Uuid) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&(tenant_id, order_id)).cloned())
    }

    async fn update_order(&self, order: &Order) -> Result<()> {
        self.orders
            .write()
            .await
            .insert((order.tenant_id, order.id), order.clone());
        Ok(())
    }

    async fn insert_payment(&self, payment: &OrderPayment) -> Result<()> {
        self.payments
            .write()
            .await
            .insert((payment.tenant_id, payment.id), payment.clone());
        Ok(())
    }

    async fn get_payment(
        &self,
        tenant_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<OrderPayment>> {
        Ok(self
            .payments
            .read()
            .await
            .get(&(tenant_id, payment_id))
            .cloned())
    }

    async fn update_payment(&self, payment: &OrderPayment) -> Result<()> {
        self.payments
            .write()
            .await
            .insert((payment.tenant_id, payment.id), payment.clone());
        Ok(())
    }

    async fn get_inventory_item(
        &self,
        tenant_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<InventoryItem>> {
        Ok(self
            .inventory
            .read()
            .await
            .get(&(tenant_id, item_id))
            .cloned())
    }

    async fn find_inventory_movement(
        &self,
        tenant_id: Uuid,
        filter: &MovementFilter,
    ) -> Result<Option<InventoryMovement>> {
        Ok(self
            .inventory_movements
            .read()
            .await
            .iter()
            .find(|m| m.tenant_id == tenant_id && filter.matches(m))
            .cloned())
    }

    async fn insert_inventory_movement(&self, movement: &InventoryMovement) -> Result<()> {
        self.inventory_movements.write().await.push(movement.clone());
        Ok(())
    }

    async fn update_inventory_stock(
        &self,
        tenant_id: Uuid,
        item_id: Uuid,
        delta: f64,
    ) -> Result<Option<InventoryItem>> {
        let mut inventory = self.inventory.write().await;
        match inventory.get_mut(&(tenant_id, item_id)) {
            Some(item) => {
                item.current_stock += delta;
                Ok(Some(item.clone()))
            }
            None => Ok(None),
        }
    }

    async fn list_inventory_movements(&self, tenant_id: Uuid) -> Result<Vec<InventoryMovement>> {
        Ok(self
            .inventory_movements
            .read()
            .await
            .iter()
            .filter(|m| m.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn product_recipe(
        &self,
        tenant_id: Uuid,
        product_reference: &str,
    ) -> Result<Option<Recipe>> {
        Ok(self
            .product_recipes
            .read()
            .await
            .get(&(tenant_id, product_reference.to_string()))
            .cloned())
    }

    async fn modifier_recipe(
        &self,
        tenant_id: Uuid,
        group: &str,
        option: &str,
    ) -> Result<Option<Recipe>> {
        Ok(self
            .modifier_recipes
            .read()
            .await
            .get(&(tenant_id, group.to_string(), option.to_string()))
            .cloned())
    }

    async fn find_cash_movement(
        &self,
        tenant_id: Uuid,
        reference_type: ReferenceType,
        reference_id: Uuid,
        category: CashCategory,
    ) -> Result<Option<CashMovement>> {
        Ok(self
            .cash_movements
            .read()
            .await
            .iter()
            .find(|m| {
                m.tenant_id == tenant_id
                    && m.reference_type == reference_type
                    && m.reference_id == reference_id
                    && m.category == category
            })
            .cloned())
    }

    async fn insert_cash_movement(&self, movement: &CashMovement) -> Result<()> {
        self.cash_movements.write().await.push(movement.clone());
        Ok(())
    }

    async fn list_cash_movements(&self, tenant_id: Uuid) -> Result<Vec<CashMovement>> {
        Ok(self
            .cash_movements
            .read()
            .await
            .iter()
            .filter(|m| m.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
