use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use super::entities::InventoryMovement;
use super::value_objects::Recipe;
use crate::domain::order::entities::{Order, OrderLine};
use crate::metrics::Metrics;
use crate::store::{MovementFilter, OrderStore};

// ============================================================================
// Stock Applier
// ============================================================================
//
// Turns a fulfilled order into inventory consumption. Two bills of
// materials feed it: the product's own ingredient list and the ingredient
// list of each modifier the customer picked.
//
// Idempotency is a single pre-write probe: any existing OUT/sale movement
// for this order means the whole application already ran, and the call is
// a no-op. There is no lock around the probe and the writes, so two truly
// concurrent callers can still slip past each other; the stored behavior
// is check-then-write and this applier keeps it that way.
//
// Missing configuration is never an error. A product without a recipe, a
// modifier without one, or a recipe pointing at an item this tenant does
// not carry is skipped with a log line; the order transition that invoked
// us must not fail because inventory linkage is incomplete.
//
// ============================================================================

/// What `apply_stock_for_order` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOutcome {
    /// Stock was consumed; carries the number of movements posted.
    Applied { movements: usize },
    /// The guard found an earlier application; nothing was written.
    AlreadyApplied,
}

pub struct StockApplier {
    store: Arc<dyn OrderStore>,
    metrics: Arc<Metrics>,
}

impl StockApplier {
    pub fn new(store: Arc<dyn OrderStore>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    /// Consume inventory for every line and applied modifier of the order,
    /// exactly once per order across repeated calls.
    pub async fn apply_stock_for_order(&self, order: &Order) -> Result<StockOutcome> {
        let guard = MovementFilter::sale_for_order(order.id);
        if self
            .store
            .find_inventory_movement(order.tenant_id, &guard)
            .await?
            .is_some()
        {
            tracing::debug!(
                order_id = %order.id,
                "Stock already applied for order, skipping"
            );
            self.metrics.stock_already_applied.inc();
            return Ok(StockOutcome::AlreadyApplied);
        }

        let mut movements = 0;
        for line in &order.lines {
            movements += self.consume_for_line(order, line).await?;
        }

        tracing::info!(
            order_id = %order.id,
            movements = movements,
            "Stock applied for order"
        );
        self.metrics.stock_applications.inc();
        Ok(StockOutcome::Applied { movements })
    }

    async fn consume_for_line(&self, order: &Order, line: &OrderLine) -> Result<usize> {
        let mut movements = 0;

        match self
            .store
            .product_recipe(order.tenant_id, &line.product_reference)
            .await?
        {
            Some(recipe) => {
                movements += self
                    .consume_recipe(order, &recipe, f64::from(line.quantity))
                    .await?;
            }
            None => {
                tracing::debug!(
                    order_id = %order.id,
                    product = %line.product_reference,
                    "No recipe configured for product, skipping stock consumption"
                );
                self.metrics.record_stock_skip("missing_recipe");
            }
        }

        for modifier in &line.applied_modifiers {
            match self
                .store
                .modifier_recipe(order.tenant_id, &modifier.group, &modifier.option)
                .await?
            {
                Some(recipe) => {
                    movements += self
                        .consume_recipe(order, &recipe, f64::from(line.quantity))
                        .await?;
                }
                None => {
                    tracing::debug!(
                        order_id = %order.id,
                        group = %modifier.group,
                        option = %modifier.option,
                        "No recipe configured for modifier, skipping stock consumption"
                    );
                    self.metrics.record_stock_skip("missing_recipe");
                }
            }
        }

        Ok(movements)
    }

    /// Post one OUT/sale movement per recipe ingredient, scaled by the line
    /// quantity, updating the item's stock level in the same step.
    async fn consume_recipe(
        &self,
        order: &Order,
        recipe: &Recipe,
        line_quantity: f64,
    ) -> Result<usize> {
        let mut movements = 0;
        for ingredient in &recipe.lines {
            let quantity = ingredient.quantity * line_quantity;

            let item = match self
                .store
                .get_inventory_item(order.tenant_id, ingredient.inventory_item_id)
                .await?
            {
                Some(item) => item,
                None => {
                    tracing::warn!(
                        order_id = %order.id,
                        inventory_item_id = %ingredient.inventory_item_id,
                        "Recipe references an absent inventory item, skipping"
                    );
                    self.metrics.record_stock_skip("missing_item");
                    continue;
                }
            };

            let movement = InventoryMovement::sale_out(
                order.tenant_id,
                item.id,
                quantity,
                order.id,
                Utc::now(),
            );
            self.store.insert_inventory_movement(&movement).await?;

            if let Some(updated) = self
                .store
                .update_inventory_stock(order.tenant_id, item.id, -quantity)
                .await?
            {
                if updated.is_below_minimum() {
                    tracing::warn!(
                        inventory_item_id = %updated.id,
                        item = %updated.name,
                        current_stock = updated.current_stock,
                        min_stock_level = updated.min_stock_level,
                        "Inventory item at or below minimum stock level"
                    );
                }
            }

            movements += 1;
        }
        Ok(movements)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
