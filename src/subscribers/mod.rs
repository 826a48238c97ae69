// ============================================================================
// Downstream Subscribers
// ============================================================================
//
// Event bus consumers: each reacts to lifecycle events independently and
// failures stay contained at the bus boundary.
//
// ============================================================================

pub mod customer_stats;
pub mod notifications;

pub use customer_stats::{CustomerStats, CustomerStatsProjector};
pub use notifications::{
    DispatcherConfig, NotificationChannel, NotificationDispatcher, NotificationTemplate,
};
