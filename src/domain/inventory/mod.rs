// ============================================================================
// Inventory Domain
// ============================================================================
//
// Items, append-only movements, bills of materials, and the idempotent
// stock applier that consumes inventory for fulfilled orders.
//
// ============================================================================

pub mod entities;
pub mod stock;
pub mod value_objects;

pub use entities::{InventoryItem, InventoryMovement};
pub use stock::{StockApplier, StockOutcome};
pub use value_objects::{MovementReason, MovementType, Recipe, RecipeLine};
