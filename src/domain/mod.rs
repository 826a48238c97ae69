// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// One subdirectory per aggregate:
// - order: entities, status state machine, production readiness
// - inventory: items, movements, the stock side-effect applier
// - payments: payments, the cash ledger and its applier
//
// The persistence boundary (store) and the event bus live outside this
// layer and are injected into it.
//
// ============================================================================

pub mod inventory;
pub mod order;
pub mod payments;
