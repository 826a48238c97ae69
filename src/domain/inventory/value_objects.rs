use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Inventory Value Objects
// ============================================================================

/// Direction of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    In,
    Out,
    Adjust,
}

impl MovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Adjust => "ADJUST",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the stock moved. `Sale` movements carry the order id they consumed
/// stock for; exactly one OUT/Sale group may exist per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    Sale,
    Purchase,
    Adjustment,
    Waste,
}

impl MovementReason {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementReason::Sale => "sale",
            MovementReason::Purchase => "purchase",
            MovementReason::Adjustment => "adjustment",
            MovementReason::Waste => "waste",
        }
    }
}

impl std::fmt::Display for MovementReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingredient consumed by a product or modifier: the inventory item and
/// how much of it goes into a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub inventory_item_id: Uuid,
    /// Quantity per sold unit, in the item's stock unit (kg, l, un).
    pub quantity: f64,
}

/// Bill of materials for a sellable product or a modifier option.
///
/// Recipes are optional configuration: a product without one simply does
/// not consume tracked stock when sold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub lines: Vec<RecipeLine>,
}

impl Recipe {
    pub fn new(lines: Vec<RecipeLine>) -> Self {
        Self { lines }
    }
}
