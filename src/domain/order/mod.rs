// ============================================================================
// Order Domain
// ============================================================================
//
// Everything order-shaped:
// - Value objects (OrderStatus with legacy aliases, Station, OrderType)
// - Entities (Order, OrderLine, intake drafts)
// - State machine (the only place status changes)
// - Production readiness aggregation (per-station signals → order Ready)
//
// ============================================================================

pub mod entities;
pub mod production;
pub mod state_machine;
pub mod value_objects;

pub use entities::{LineDraft, Order, OrderDraft, OrderLine};
pub use production::{station_mark_ready, station_start, ReadinessOutcome};
pub use state_machine::{apply_transition, TransitionOutcome};
pub use value_objects::{AppliedModifier, OrderStatus, OrderType, Station};
