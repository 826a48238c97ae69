use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::bus::{EventName, OrderEventPayload, Subscriber};
use crate::domain::order::value_objects::{OrderStatus, OrderType};
use crate::metrics::Metrics;
use crate::utils::{
    retry_with_backoff, CircuitBreaker, CircuitBreakerConfig, RetryConfig, RetryResult,
};

// ============================================================================
// Customer Notifications
// ============================================================================
//
// Projects lifecycle events into customer-facing messages and pushes them
// through the external notification channel. Dispatch is fire-and-forget:
// the message is rendered in the subscriber, then handed to a background
// task so the triggering request never waits on the channel. There is no
// durable queue behind this - if the process dies between the transition
// and the background send, the notification is lost. Accepted: messages
// are outside the consistency boundary.
//
// Templates are a closed enum, one variant per lifecycle moment, each
// carrying exactly the fields its message needs.
//
// ============================================================================

/// The messages this system can send, and what each one requires.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationTemplate {
    OrderReceived {
        customer_name: String,
        total_amount: i64,
        estimated_minutes: Option<u32>,
    },
    OrderPreparing {
        customer_name: String,
    },
    OrderReady {
        customer_name: String,
        delivery_type: OrderType,
    },
    OrderOutForDelivery {
        customer_name: String,
    },
    OrderDelivered {
        customer_name: String,
    },
    OrderCanceled {
        customer_name: String,
    },
}

fn format_amount(cents: i64) -> String {
    format!("R$ {},{:02}", cents / 100, (cents % 100).abs())
}

impl NotificationTemplate {
    /// Pick the template for an event, if that moment notifies at all.
    pub fn for_event(event: EventName, payload: &OrderEventPayload) -> Option<Self> {
        let name = payload.customer_name.clone();
        match event {
            EventName::OrderCreated => Some(NotificationTemplate::OrderReceived {
                customer_name: name,
                total_amount: payload.total_amount,
                estimated_minutes: payload.estimated_minutes,
            }),
            EventName::OrderStatusChanged => match payload.status {
                OrderStatus::Preparing => {
                    Some(NotificationTemplate::OrderPreparing { customer_name: name })
                }
                OrderStatus::Ready => Some(NotificationTemplate::OrderReady {
                    customer_name: name,
                    delivery_type: payload.delivery_type,
                }),
                OrderStatus::OutForDelivery => {
                    Some(NotificationTemplate::OrderOutForDelivery { customer_name: name })
                }
                OrderStatus::Delivered => {
                    Some(NotificationTemplate::OrderDelivered { customer_name: name })
                }
                OrderStatus::Canceled => {
                    Some(NotificationTemplate::OrderCanceled { customer_name: name })
                }
                OrderStatus::Received => None,
            },
            // The derived events repeat what status.changed already carries.
            EventName::OrderReady | EventName::OrderDelivered => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            NotificationTemplate::OrderReceived {
                customer_name,
                total_amount,
                estimated_minutes,
            } => {
                let eta = estimated_minutes
                    .map(|m| format!(" Previsão: {m} min."))
                    .unwrap_or_default();
                format!(
                    "Olá {customer_name}! Recebemos seu pedido no valor de {}.{eta}",
                    format_amount(*total_amount)
                )
            }
            NotificationTemplate::OrderPreparing { customer_name } => {
                format!("{customer_name}, seu pedido já está em preparo!")
            }
            NotificationTemplate::OrderReady {
                customer_name,
                delivery_type,
            } => match delivery_type {
                OrderType::Delivery => {
                    format!("{customer_name}, seu pedido está pronto e sairá para entrega em instantes.")
                }
                OrderType::Pickup => {
                    format!("{customer_name}, seu pedido está pronto para retirada!")
                }
                OrderType::Table => {
                    format!("{customer_name}, seu pedido está pronto e já vai para a mesa.")
                }
            },
            NotificationTemplate::OrderOutForDelivery { customer_name } => {
                format!("{customer_name}, seu pedido saiu para entrega!")
            }
            NotificationTemplate::OrderDelivered { customer_name } => {
                format!("{customer_name}, pedido entregue. Bom apetite!")
            }
            NotificationTemplate::OrderCanceled { customer_name } => {
                format!("{customer_name}, seu pedido foi cancelado.")
            }
        }
    }
}

/// Boundary to the external messaging channel (WhatsApp gateway, SMS
/// provider). The wire protocol lives on the other side of this trait.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, tenant_id: Uuid, phone: &str, message: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct DispatcherConfig {
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

pub struct NotificationDispatcher {
    channel: Arc<dyn NotificationChannel>,
    breaker: CircuitBreaker,
    retry: RetryConfig,
    metrics: Arc<Metrics>,
}

impl NotificationDispatcher {
    pub fn new(
        channel: Arc<dyn NotificationChannel>,
        config: DispatcherConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            channel,
            breaker: CircuitBreaker::new(config.breaker),
            retry: config.retry,
            metrics,
        }
    }
}

impl Subscriber for NotificationDispatcher {
    fn name(&self) -> &'static str {
        "notification_dispatcher"
    }

    fn on_event(&self, event: EventName, payload: &OrderEventPayload) -> anyhow::Result<()> {
        let Some(template) = NotificationTemplate::for_event(event, payload) else {
            return Ok(());
        };

        let Some(phone) = payload.customer_phone.clone() else {
            tracing::debug!(
                order_id = %payload.order_id,
                "Order has no customer phone, skipping notification"
            );
            self.metrics.record_notification("skipped_no_phone");
            return Ok(());
        };

        let message = template.render();
        let tenant_id = payload.tenant_id;
        let order_id = payload.order_id;
        let channel = self.channel.clone();
        let breaker = self.breaker.clone();
        let retry = self.retry.clone();
        let metrics = self.metrics.clone();

        // Best-effort offload: the triggering request returns without
        // waiting for the channel, and nothing re-drives this task after a
        // process crash.
        tokio::spawn(async move {
            let result = retry_with_backoff(retry, |_attempt| {
                let channel = channel.clone();
                let breaker = breaker.clone();
                let phone = phone.clone();
                let message = message.clone();
                async move {
                    breaker
                        .call(channel.send(tenant_id, &phone, &message))
                        .await
                        .map_err(|e| anyhow::anyhow!("{e}"))
                }
            })
            .await;

            match result {
                RetryResult::Success(()) => {
                    tracing::info!(order_id = %order_id, "Notification delivered");
                    metrics.record_notification("sent");
                }
                RetryResult::Failed(error) => {
                    tracing::error!(
                        order_id = %order_id,
                        error = %error,
                        "Notification dropped after retries"
                    );
                    metrics.record_notification("failed");
                }
            }
        });

        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
