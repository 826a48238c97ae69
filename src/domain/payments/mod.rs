// ============================================================================
// Payments Domain
// ============================================================================
//
// Order payments, the append-only cash ledger, and the idempotent ledger
// applier that keeps postings consistent with payment status.
//
// ============================================================================

pub mod entities;
pub mod ledger;
pub mod value_objects;

pub use entities::{CashMovement, OrderPayment};
pub use ledger::LedgerApplier;
pub use value_objects::{
    CashCategory, CashMovementType, PaymentMethod, PaymentStatus, ReferenceType,
};
