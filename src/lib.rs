// ============================================================================
// Fulfillment Engine
// ============================================================================
//
// Order fulfillment for a multi-tenant food-ordering backend: the status
// state machine, per-station readiness aggregation, idempotent stock and
// cash-ledger side effects, and an in-process event bus feeding the
// notification and stats subscribers.
//
// Single-process, single-datastore correctness: side effects are guarded
// by pre-write existence checks, not distributed transactions.
//
// ============================================================================

pub mod bus;
pub mod domain;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod store;
pub mod subscribers;
pub mod utils;

pub use bus::{EventBus, EventBusBuilder, EventName, OrderEventPayload, Subscriber};
pub use engine::FulfillmentEngine;
pub use error::{ErrorKind, FulfillmentError};
pub use metrics::Metrics;
pub use store::{InMemoryStore, MovementFilter, OrderStore};
