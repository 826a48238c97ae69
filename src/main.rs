use std::sync::Arc;

use async_trait::async_trait;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use fulfillment_engine::domain::inventory::{InventoryItem, Recipe, RecipeLine};
use fulfillment_engine::domain::order::{AppliedModifier, LineDraft, OrderDraft, OrderType};
use fulfillment_engine::domain::payments::PaymentMethod;
use fulfillment_engine::subscribers::{
    CustomerStatsProjector, DispatcherConfig, NotificationChannel, NotificationDispatcher,
};
use fulfillment_engine::{
    EventBusBuilder, EventName, FulfillmentEngine, InMemoryStore, Metrics, OrderStore,
};

// ============================================================================
// Demo binary: walks one order through the full fulfillment lifecycle
// against the in-memory store - split-station production, payment
// settlement, delivery, and the downstream projections.
// ============================================================================

/// Stands in for the external messaging gateway: prints instead of sending.
struct ConsoleChannel;

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    async fn send(&self, _tenant_id: Uuid, phone: &str, message: &str) -> anyhow::Result<()> {
        tracing::info!(phone = %phone, message = %message, "📱 Notification");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, RUST_LOG-overridable.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fulfillment_engine=debug")),
        )
        .init();

    tracing::info!("🚀 Starting fulfillment engine demo");

    // === 1. Store, seeded with a tiny menu's worth of inventory ===
    let store = Arc::new(InMemoryStore::new());
    let tenant = Uuid::new_v4();

    let bread = Uuid::new_v4();
    let beef = Uuid::new_v4();
    let bacon = Uuid::new_v4();
    let cachaca = Uuid::new_v4();
    for (id, name, stock, min, cost) in [
        (bread, "Pão de hambúrguer", 40.0, 10.0, 150),
        (beef, "Hambúrguer 180g", 25.0, 8.0, 700),
        (bacon, "Bacon (kg)", 2.0, 0.5, 4500),
        (cachaca, "Cachaça (l)", 3.0, 1.0, 3800),
    ] {
        store
            .seed_inventory_item(InventoryItem {
                tenant_id: tenant,
                id,
                name: name.to_string(),
                current_stock: stock,
                min_stock_level: min,
                unit_cost: cost,
            })
            .await;
    }
    store
        .seed_product_recipe(
            tenant,
            "x-burger",
            Recipe::new(vec![
                RecipeLine {
                    inventory_item_id: bread,
                    quantity: 1.0,
                },
                RecipeLine {
                    inventory_item_id: beef,
                    quantity: 1.0,
                },
            ]),
        )
        .await;
    store
        .seed_modifier_recipe(
            tenant,
            "Extras",
            "Bacon",
            Recipe::new(vec![RecipeLine {
                inventory_item_id: bacon,
                quantity: 0.05,
            }]),
        )
        .await;
    store
        .seed_product_recipe(
            tenant,
            "caipirinha",
            Recipe::new(vec![RecipeLine {
                inventory_item_id: cachaca,
                quantity: 0.06,
            }]),
        )
        .await;

    // === 2. Metrics, subscribers, bus ===
    let metrics = Arc::new(Metrics::new()?);
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(ConsoleChannel),
        DispatcherConfig::default(),
        metrics.clone(),
    ));
    let stats = Arc::new(CustomerStatsProjector::new());

    let bus = Arc::new(
        EventBusBuilder::new(metrics.clone())
            .subscribe(EventName::OrderCreated, dispatcher.clone())
            .subscribe(EventName::OrderStatusChanged, dispatcher)
            .subscribe(EventName::OrderCreated, stats.clone())
            .subscribe(EventName::OrderDelivered, stats.clone())
            .build(),
    );

    let engine = FulfillmentEngine::new(store.clone(), bus, metrics.clone());

    // === 3. Intake: one order split across kitchen and bar ===
    let phone = "+5511999990000";
    let order = engine
        .create_order(
            tenant,
            OrderDraft {
                customer_name: "Ana".to_string(),
                customer_phone: Some(phone.to_string()),
                order_type: OrderType::Delivery,
                estimated_minutes: Some(45),
                lines: vec![
                    LineDraft {
                        product_reference: "x-burger".to_string(),
                        quantity: 2,
                        unit_price: 2500,
                        applied_modifiers: vec![AppliedModifier {
                            group: "Extras".to_string(),
                            option: "Bacon".to_string(),
                            price_delta: 300,
                        }],
                        production_station: "COZINHA".to_string(),
                    },
                    LineDraft {
                        product_reference: "caipirinha".to_string(),
                        quantity: 1,
                        unit_price: 1800,
                        applied_modifiers: vec![],
                        production_station: "BAR".to_string(),
                    },
                ],
            },
        )
        .await?;
    tracing::info!("✅ Order created: {} ({} centavos)", order.id, order.total_amount);

    // === 4. Stations work independently and in their own order ===
    engine.station_start(tenant, order.id, "COZINHA").await?;
    let status = engine.station_mark_ready(tenant, order.id, "BAR").await?;
    tracing::info!("🍹 Bar done, order is {status}");
    let status = engine
        .station_mark_ready(tenant, order.id, "COZINHA")
        .await?;
    tracing::info!("🍔 Kitchen done, order is {status}");

    // === 5. Payment settles the ledger ===
    let payment = engine
        .register_payment(tenant, order.id, PaymentMethod::Pix, 120)
        .await?;
    engine.transition_payment(tenant, payment.id, "paid").await?;
    // A retried webhook is absorbed by the guard.
    engine.transition_payment(tenant, payment.id, "paid").await?;

    // === 6. Out the door ===
    engine
        .request_order_transition(tenant, order.id, "OUT_FOR_DELIVERY")
        .await?;
    let status = engine
        .request_order_transition(tenant, order.id, "ENTREGUE")
        .await?;
    tracing::info!("🏁 Order finished as {status}");

    // Give the fire-and-forget notifications a moment to flush.
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    // === 7. What the side effects left behind ===
    for movement in store.list_inventory_movements(tenant).await? {
        tracing::info!(
            item = %movement.inventory_item_id,
            quantity = movement.quantity,
            reason = %movement.reason,
            "📦 Inventory movement"
        );
    }
    for movement in store.list_cash_movements(tenant).await? {
        tracing::info!(
            category = %movement.category,
            signed_amount = movement.signed_amount(),
            "💰 Cash movement"
        );
    }
    if let Some(customer) = stats.stats_for(tenant, phone) {
        tracing::info!(
            placed = customer.orders_placed,
            delivered = customer.orders_delivered,
            spent_cents = customer.total_spent_cents,
            "📈 Customer stats"
        );
    }

    tracing::info!("🎉 Demo complete!");
    Ok(())
}
